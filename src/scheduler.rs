use crate::aggregate::Particle;
use crate::protocol::Event;
use crate::simulation::Simulation;
use rand::Rng;

/// Runs the simulation in bounded batches.
///
/// The running flag is only read between batches: a batch, once started,
/// always completes and reports every particle it produced.
#[derive(Debug)]
pub struct BatchScheduler {
    steps_per_batch: usize,
    running: bool,
    pending: Vec<Particle>,
    batches: u64,
}

impl BatchScheduler {
    pub fn new(steps_per_batch: usize) -> Self {
        Self {
            steps_per_batch: steps_per_batch.max(1),
            running: false,
            pending: Vec::new(),
            batches: 0,
        }
    }

    pub fn steps_per_batch(&self) -> usize {
        self.steps_per_batch
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of batches completed since creation
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Set the running flag. Returns false if it was already set.
    pub fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.running, true)
    }

    /// Clear the running flag; simulation state is untouched
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Run one full batch and collect what stuck.
    ///
    /// Returns a `particles` event if at least one particle stuck, carrying the
    /// stats snapshot taken after the last step of the batch.
    pub fn run_batch<R: Rng>(&mut self, sim: &mut Simulation<R>) -> Option<Event> {
        self.pending.clear();
        sim.run_steps(self.steps_per_batch, &mut self.pending);
        self.batches += 1;

        log::trace!(
            "batch {} done: {} new, {} stuck",
            self.batches,
            self.pending.len(),
            sim.stats().stuck_count
        );

        if self.pending.is_empty() {
            return None;
        }
        Some(Event::Particles {
            data: std::mem::take(&mut self.pending),
            stats: sim.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    #[test]
    fn test_start_is_idempotent() {
        let mut scheduler = BatchScheduler::new(10);
        assert!(!scheduler.is_running());
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(scheduler.start());
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        assert_eq!(BatchScheduler::new(0).steps_per_batch(), 1);
    }

    #[test]
    fn test_batch_reports_all_new_particles() {
        let config = SimulationConfig {
            rng_seed: Some(21),
            steps_per_batch: 20_000,
            ..Default::default()
        };
        let mut sim = Simulation::new(&config);
        sim.update_settings(&crate::settings::SettingsUpdate::base_adhesion(1.0));
        let mut scheduler = BatchScheduler::new(config.steps_per_batch);

        let mut next_index = 1;
        for _ in 0..10 {
            let before = sim.stats().stuck_count;
            match scheduler.run_batch(&mut sim) {
                Some(Event::Particles { data, stats }) => {
                    assert_eq!(stats, sim.stats());
                    assert_eq!(stats.stuck_count, before + data.len() as u64);
                    for particle in data {
                        assert_eq!(particle.index, next_index);
                        next_index += 1;
                    }
                }
                None => assert_eq!(sim.stats().stuck_count, before),
            }
        }
        assert_eq!(scheduler.batches(), 10);
        assert_eq!(sim.stats().stuck_count, next_index);
    }

    #[test]
    fn test_empty_batch_emits_nothing() {
        let config = SimulationConfig {
            rng_seed: Some(22),
            steps_per_batch: 10_000,
            ..Default::default()
        };
        let mut sim = Simulation::new(&config);
        sim.update_settings(&crate::settings::SettingsUpdate::base_adhesion(0.0));
        let mut scheduler = BatchScheduler::new(config.steps_per_batch);
        assert!(scheduler.run_batch(&mut sim).is_none());
    }
}
