use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dla_worker::presets::{Preset, PresetManager};
use dla_worker::{Command, Event, SimulationConfig, SimulationWorker, Stats};
use log::{debug, info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// How long the event loop waits for an event before forwarding input again
const INPUT_POLL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "dla-worker")]
#[command(about = "Diffusion-Limited Aggregation worker speaking JSON lines on stdin/stdout")]
struct Args {
    /// Load settings from a JSON config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Start from a named adhesion preset (see --list-presets)
    #[arg(short = 'p', long)]
    preset: Option<String>,

    /// Base adhesion (0.0-1.0)
    #[arg(short = 'a', long = "base-adhesion")]
    base_adhesion: Option<f64>,

    /// Walk steps per batch between command checks
    #[arg(long = "steps-per-batch")]
    steps_per_batch: Option<usize>,

    /// Seed the random source for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Start the simulation without waiting for a start command
    #[arg(long, default_value = "false")]
    autostart: bool,

    /// Stop once this many particles have stuck
    #[arg(long = "max-particles")]
    max_particles: Option<u64>,

    /// Write the effective config to a file and exit
    #[arg(long = "export-config")]
    export_config: Option<PathBuf>,

    /// Save the effective adhesion settings as a user preset and exit
    #[arg(long = "save-preset")]
    save_preset: Option<String>,

    /// Delete a user preset and exit
    #[arg(long = "delete-preset")]
    delete_preset: Option<String>,

    /// List available presets and exit
    #[arg(long = "list-presets", default_value = "false")]
    list_presets: bool,
}

fn build_config(args: &Args, presets: &PresetManager) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from_file(path).map_err(|e| anyhow!(e))?,
        None => SimulationConfig::default(),
    };

    if let Some(name) = &args.preset {
        let preset = presets
            .find(name)
            .ok_or_else(|| anyhow!("unknown preset '{}'", name))?;
        config.settings = preset.settings.clone();
    }
    if let Some(base) = args.base_adhesion {
        config.settings.base_adhesion = base.clamp(0.0, 1.0);
    }
    if let Some(steps) = args.steps_per_batch {
        config.steps_per_batch = steps;
    }
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }

    config.validate().map_err(|e| anyhow!(e))?;
    Ok(config)
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only events
    env_logger::init();

    let args = Args::parse();
    let mut presets = PresetManager::new();

    if args.list_presets {
        for preset in presets.all_presets() {
            println!("{:<12} {}", preset.name, preset.description);
        }
        return Ok(());
    }

    if let Some(name) = &args.delete_preset {
        if presets.find(name).is_none() {
            return Err(anyhow!("unknown preset '{}'", name));
        }
        presets.delete_preset(name).map_err(|e| anyhow!(e))?;
        info!("preset '{}' deleted", name);
        return Ok(());
    }

    let config = build_config(&args, &presets)?;
    debug!("effective config: {:?}", config);

    if let Some(path) = &args.export_config {
        config.save_to_file(path).map_err(|e| anyhow!(e))?;
        info!("config written to {}", path.display());
        return Ok(());
    }

    if let Some(name) = &args.save_preset {
        let preset = Preset {
            name: name.clone(),
            description: "Saved from the command line".to_string(),
            settings: config.settings.clone(),
        };
        let path = presets.save_preset(preset).map_err(|e| anyhow!(e))?;
        info!("preset '{}' saved to {}", name, path.display());
        return Ok(());
    }

    let options = BridgeOptions {
        autostart: args.autostart,
        max_particles: args.max_particles,
    };
    run(&config, options)
}

/// Host-side behavior of the stdio bridge
#[derive(Debug, Clone, Copy, Default)]
struct BridgeOptions {
    autostart: bool,
    /// Send `stop` once this many particles have stuck
    max_particles: Option<u64>,
}

/// Spawn the worker and bridge stdin commands and stdout events to it
fn run(config: &SimulationConfig, options: BridgeOptions) -> Result<()> {
    let worker = SimulationWorker::spawn(config).context("failed to spawn worker thread")?;
    let (input_tx, input_rx) = mpsc::channel::<Command>();
    thread::Builder::new()
        .name("dla-stdin".into())
        .spawn(move || read_commands(io::stdin().lock(), input_tx))
        .context("failed to spawn stdin reader")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Bridge::new(worker, options).run(input_rx, &mut out)
}

/// Forwards host commands to the worker and writes its events as JSON lines.
///
/// Tracks whether the worker should be running from the commands it forwards,
/// which is enough to decide when a closed input may close the worker too.
struct Bridge {
    worker: SimulationWorker,
    options: BridgeOptions,
    running: bool,
    limit_hit: bool,
}

impl Bridge {
    fn new(worker: SimulationWorker, options: BridgeOptions) -> Self {
        let mut bridge = Self {
            worker,
            options,
            running: false,
            limit_hit: false,
        };
        if options.autostart {
            bridge.forward(Command::Start);
        }
        bridge
    }

    fn forward(&mut self, command: Command) {
        match command {
            Command::Start => self.running = true,
            Command::Stop | Command::Reset => self.running = false,
            Command::UpdateSettings { .. } => {}
        }
        if !self.worker.send(command.clone()) {
            debug!("worker already exited, dropped {:?}", command);
        }
    }

    /// A running worker with a particle limit outlives its input
    fn awaiting_limit(&self) -> bool {
        self.options.max_particles.is_some() && self.running && !self.limit_hit
    }

    fn observe(&mut self, stats: Stats) {
        let Some(max) = self.options.max_particles else {
            return;
        };
        if stats.stuck_count >= max && !self.limit_hit {
            info!("reached {} particles, stopping", stats.stuck_count);
            self.limit_hit = true;
            self.forward(Command::Stop);
        } else if stats.stuck_count < max {
            // A reset rearms the limit
            self.limit_hit = false;
        }
    }

    /// Run until the worker exits. Every event it produced is written first.
    fn run<W: Write>(mut self, input: Receiver<Command>, out: &mut W) -> Result<()> {
        let mut input_open = true;
        let mut commands_open = true;

        loop {
            while input_open {
                match input.try_recv() {
                    Ok(command) => self.forward(command),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("stdin closed");
                        input_open = false;
                    }
                }
            }

            if !input_open && commands_open && !self.awaiting_limit() {
                info!("shutting down worker");
                self.worker.close_commands();
                commands_open = false;
            }

            let event = match self.worker.recv_timeout(INPUT_POLL) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let Event::Particles { stats, .. } = &event;
            let stats = *stats;
            let line = event.to_json().map_err(|e| anyhow!(e))?;
            writeln!(out, "{}", line).context("failed to write event")?;
            out.flush().context("failed to flush output")?;

            self.observe(stats);
        }

        info!("worker finished");
        self.worker.shutdown();
        Ok(())
    }
}

/// Forward one command per input line until EOF or a read error.
///
/// Lines that are blank, not UTF-8 or not a known command are skipped.
fn read_commands<R: BufRead>(mut reader: R, commands: Sender<Command>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("stdin read failed: {}", err);
                break;
            }
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(err) => {
                debug!("skipping non UTF-8 input line: {}", err);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        if let Some(command) = Command::parse(line) {
            if commands.send(command).is_err() {
                break;
            }
        }
    }
}
