use crate::adhesion::AdhesionModel;
use crate::aggregate::{AggregateState, Particle, Stats};
use crate::config::SimulationConfig;
use crate::settings::{Settings, SettingsUpdate};
use crate::walker::{StepOutcome, Walker, WalkerProcess};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// DLA simulation state
///
/// Owns everything one isolated worker mutates: the aggregate, the walker,
/// the adhesion settings and the random source.
pub struct Simulation<R = StdRng> {
    aggregate: AggregateState,
    walker: WalkerProcess,
    adhesion: AdhesionModel,
    rng: R,
}

impl Simulation<StdRng> {
    /// Build a simulation from config, seeding the RNG from `rng_seed` or the OS
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Simulation<R> {
    /// Build a simulation with an explicit random source
    pub fn with_rng(config: &SimulationConfig, rng: R) -> Self {
        Self {
            aggregate: AggregateState::new(config.cell_size),
            walker: WalkerProcess::new(config.walk_params()),
            adhesion: AdhesionModel::new(config.settings.clone()),
            rng,
        }
    }

    /// Execute one walk step
    pub fn step(&mut self) -> StepOutcome {
        self.walker
            .step(&mut self.rng, &mut self.aggregate, &self.adhesion)
    }

    /// Run `steps` walk steps, appending every new particle to `out`.
    /// Returns the number of particles that stuck.
    pub fn run_steps(&mut self, steps: usize, out: &mut Vec<Particle>) -> usize {
        let before = out.len();
        for _ in 0..steps {
            if let StepOutcome::Stuck(particle) = self.step() {
                out.push(particle);
            }
        }
        out.len() - before
    }

    /// Clear the aggregate and walker, returning the new seed particle
    pub fn reset(&mut self) -> Particle {
        self.walker.clear();
        self.aggregate.reset()
    }

    /// Merge a partial settings update, returns true if anything changed
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> bool {
        self.adhesion.update(update)
    }

    pub fn settings(&self) -> &Settings {
        self.adhesion.settings()
    }

    /// Attach a particle directly, bypassing the walk
    pub fn force_stick(&mut self, x: f64, y: f64) -> Particle {
        self.aggregate.stick(x, y)
    }

    /// Move the walker to an explicit position and try to attach it there
    pub fn stick_walker_at(&mut self, x: f64, y: f64) -> Option<Particle> {
        self.walker.place(x, y);
        self.walker
            .try_sticking(&mut self.rng, &mut self.aggregate, &self.adhesion)
    }

    /// Stuck particles within `radius` of (`x`, `y`)
    pub fn query_radius(&mut self, x: f64, y: f64, radius: f64) -> Vec<(Particle, f64)> {
        self.aggregate.neighbors(x, y, radius).collect()
    }

    pub fn walker(&self) -> Option<&Walker> {
        self.walker.walker()
    }

    pub fn aggregate(&self) -> &AggregateState {
        &self.aggregate
    }

    pub fn stats(&self) -> Stats {
        self.aggregate.stats()
    }
}
