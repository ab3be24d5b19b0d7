use crate::config::SimulationConfig;
use crate::protocol::{Command, Event};
use crate::scheduler::BatchScheduler;
use crate::simulation::Simulation;
use rand::Rng;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// Simulation plus scheduler, driven one command or one batch at a time.
///
/// Holds no thread or channel so it can be stepped directly.
pub struct Worker<R = rand::rngs::StdRng> {
    sim: Simulation<R>,
    scheduler: BatchScheduler,
}

impl Worker {
    pub fn new(config: &SimulationConfig) -> Self {
        Self::from_parts(Simulation::new(config), config.steps_per_batch)
    }
}

impl<R: Rng> Worker<R> {
    pub fn from_parts(sim: Simulation<R>, steps_per_batch: usize) -> Self {
        Self {
            sim,
            scheduler: BatchScheduler::new(steps_per_batch),
        }
    }

    pub fn simulation(&self) -> &Simulation<R> {
        &self.sim
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Apply one host command. Only `reset` produces an event (the seed).
    pub fn apply(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::Start => {
                if self.scheduler.start() {
                    log::info!("simulation started at {} particles", self.sim.stats().stuck_count);
                }
                None
            }
            Command::Stop => {
                if self.scheduler.is_running() {
                    log::info!("simulation stopped at {} particles", self.sim.stats().stuck_count);
                }
                self.scheduler.stop();
                None
            }
            Command::Reset => {
                // Cancel the continuation before any state is cleared
                self.scheduler.stop();
                let seed = self.sim.reset();
                log::info!("simulation reset");
                Some(Event::Particles {
                    data: vec![seed],
                    stats: self.sim.stats(),
                })
            }
            Command::UpdateSettings { settings } => {
                match settings {
                    Some(update) if !update.is_empty() => {
                        if self.sim.update_settings(&update) {
                            log::debug!("settings now {:?}", self.sim.settings());
                        }
                    }
                    _ => log::debug!("updateSettings without fields ignored"),
                }
                None
            }
        }
    }

    /// Run one batch if running
    pub fn run_batch(&mut self) -> Option<Event> {
        if !self.scheduler.is_running() {
            return None;
        }
        self.scheduler.run_batch(&mut self.sim)
    }
}

/// Handle to a simulation running on its own thread.
///
/// Commands go in and events come out through FIFO channels. Dropping the
/// handle closes the command channel and joins the thread.
pub struct SimulationWorker {
    commands: Option<Sender<Command>>,
    events: Receiver<Event>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SimulationWorker {
    /// Spawn the worker thread. The seed particle is reported immediately.
    pub fn spawn(config: &SimulationConfig) -> io::Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (event_tx, event_rx) = mpsc::channel::<Event>();
        let worker = Worker::new(config);

        let handle = thread::Builder::new()
            .name("dla-worker".into())
            .spawn(move || run(worker, command_rx, event_tx))?;

        log::info!(
            "worker spawned ({} steps per batch, base adhesion {})",
            config.steps_per_batch,
            config.settings.base_adhesion
        );

        Ok(Self {
            commands: Some(command_tx),
            events: event_rx,
            handle: Some(handle),
        })
    }

    /// Queue a command. Returns false once the worker has exited.
    pub fn send(&self, command: Command) -> bool {
        match &self.commands {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }

    /// Close the command channel. The worker exits once the queue is drained.
    pub fn close_commands(&mut self) {
        self.commands = None;
    }

    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    /// Close the command channel and wait for the thread to finish
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.commands = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("simulation worker thread panicked");
            }
        }
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        self.join();
    }
}

/// Worker thread body.
///
/// While running, queued commands are drained between batches; while idle, the
/// thread blocks on the next command.
fn run<R: Rng>(mut worker: Worker<R>, commands: Receiver<Command>, events: Sender<Event>) {
    if let Some(seed) = worker.apply(Command::Reset) {
        if events.send(seed).is_err() {
            return;
        }
    }

    loop {
        if worker.is_running() {
            loop {
                match commands.try_recv() {
                    Ok(command) => {
                        if !dispatch(&mut worker, command, &events) {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::info!("command channel closed, worker exiting");
                        return;
                    }
                }
            }
        } else {
            match commands.recv() {
                Ok(command) => {
                    if !dispatch(&mut worker, command, &events) {
                        return;
                    }
                    continue;
                }
                Err(_) => {
                    log::info!("command channel closed, worker exiting");
                    return;
                }
            }
        }

        if let Some(event) = worker.run_batch() {
            if events.send(event).is_err() {
                log::info!("event channel closed, worker exiting");
                return;
            }
        }
    }
}

/// Apply a command and forward any event. Returns false if the host is gone.
fn dispatch<R: Rng>(worker: &mut Worker<R>, command: Command, events: &Sender<Event>) -> bool {
    match worker.apply(command) {
        Some(event) => events.send(event).is_ok(),
        None => true,
    }
}
