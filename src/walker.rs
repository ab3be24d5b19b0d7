use crate::adhesion::AdhesionModel;
use crate::aggregate::{AggregateState, Particle};
use rand::Rng;
use std::f64::consts::TAU;

/// Search radius for stick candidates, in particle radii
const SEARCH_RADIUS_FACTOR: f64 = 2.5;

/// Center-to-center distance of touching particles, in particle radii
const CONTACT_FACTOR: f64 = 2.0;

/// The single diffusing particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walker {
    pub x: f64,
    pub y: f64,
}

impl Walker {
    /// Place a walker at `radius` from the origin at a uniformly random angle
    pub fn spawn<R: Rng>(rng: &mut R, radius: f64) -> Self {
        let angle = rng.gen_range(0.0..TAU);
        Self {
            x: radius * angle.cos(),
            y: radius * angle.sin(),
        }
    }

    /// Move `step` units in a freshly sampled direction
    pub fn step<R: Rng>(&mut self, rng: &mut R, step: f64) {
        let angle = rng.gen_range(0.0..TAU);
        self.x += step * angle.cos();
        self.y += step * angle.sin();
    }

    pub fn distance(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Geometry of the random walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkParams {
    pub particle_radius: f64,
    /// Spawn distance beyond the aggregate's max radius
    pub spawn_margin: f64,
    /// Kill distance beyond the aggregate's max radius
    pub kill_margin: f64,
    pub step_size: f64,
}

impl WalkParams {
    pub fn contact_distance(&self) -> f64 {
        self.particle_radius * CONTACT_FACTOR
    }

    pub fn search_radius(&self) -> f64 {
        self.particle_radius * SEARCH_RADIUS_FACTOR
    }
}

/// What a single walk step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Still diffusing
    Walking,
    /// Left the kill radius and was replaced by a fresh walker
    Respawned,
    /// Attached to the aggregate; the walker is gone
    Stuck(Particle),
}

/// Spawn/step/stick state machine for the walker
///
/// The walker is `None` while absent; the next step spawns a new one.
#[derive(Debug)]
pub struct WalkerProcess {
    params: WalkParams,
    walker: Option<Walker>,
}

impl WalkerProcess {
    pub fn new(params: WalkParams) -> Self {
        Self {
            params,
            walker: None,
        }
    }

    pub fn params(&self) -> &WalkParams {
        &self.params
    }

    pub fn walker(&self) -> Option<&Walker> {
        self.walker.as_ref()
    }

    /// Put the walker at an explicit position
    pub fn place(&mut self, x: f64, y: f64) {
        self.walker = Some(Walker { x, y });
    }

    /// Drop the current walker without replacing it
    pub fn clear(&mut self) {
        self.walker = None;
    }

    fn spawn<R: Rng>(&self, rng: &mut R, aggregate: &AggregateState) -> Walker {
        Walker::spawn(rng, aggregate.max_radius() + self.params.spawn_margin)
    }

    /// Advance the walk by one step.
    ///
    /// Spawns a walker if none exists, moves it, then either replaces it (past
    /// the kill radius) or tries to attach it to the aggregate.
    pub fn step<R: Rng>(
        &mut self,
        rng: &mut R,
        aggregate: &mut AggregateState,
        adhesion: &AdhesionModel,
    ) -> StepOutcome {
        let mut walker = match self.walker {
            Some(walker) => walker,
            None => self.spawn(rng, aggregate),
        };
        walker.step(rng, self.params.step_size);

        let kill_radius = aggregate.max_radius() + self.params.kill_margin;
        if walker.distance() > kill_radius {
            self.walker = Some(self.spawn(rng, aggregate));
            return StepOutcome::Respawned;
        }

        self.walker = Some(walker);
        match self.try_sticking(rng, aggregate, adhesion) {
            Some(particle) => StepOutcome::Stuck(particle),
            None => StepOutcome::Walking,
        }
    }

    /// Try to attach the current walker to a nearby stuck particle.
    ///
    /// Candidates are visited in spatial index order; each one in contact gets
    /// a single draw against the adhesion probability for its approach angle,
    /// and the first success wins. The new particle is placed exactly one
    /// contact distance from the candidate along the approach angle.
    pub fn try_sticking<R: Rng>(
        &mut self,
        rng: &mut R,
        aggregate: &mut AggregateState,
        adhesion: &AdhesionModel,
    ) -> Option<Particle> {
        let walker = self.walker?;
        let contact = self.params.contact_distance();

        let mut attach_at = None;
        for (candidate, distance) in
            aggregate.neighbors(walker.x, walker.y, self.params.search_radius())
        {
            if distance > contact {
                continue;
            }
            let angle = (walker.y - candidate.y).atan2(walker.x - candidate.x);
            if rng.gen::<f64>() < adhesion.stick_probability(angle) {
                attach_at = Some((
                    candidate.x + contact * angle.cos(),
                    candidate.y + contact * angle.sin(),
                ));
                break;
            }
        }

        let (x, y) = attach_at?;
        self.walker = None;
        Some(aggregate.stick(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Settings, SettingsUpdate, SECTOR_COUNT};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params() -> WalkParams {
        WalkParams {
            particle_radius: 3.0,
            spawn_margin: 40.0,
            kill_margin: 80.0,
            step_size: 2.0,
        }
    }

    fn always_sticky() -> AdhesionModel {
        AdhesionModel::new(Settings {
            base_adhesion: 1.0,
            dir_mult: [1.0; SECTOR_COUNT],
        })
    }

    #[test]
    fn test_spawn_on_spawn_circle() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut aggregate = AggregateState::new(8.0);
        aggregate.stick(0.0, 20.0);
        let process = WalkerProcess::new(params());
        for _ in 0..100 {
            let walker = process.spawn(&mut rng, &aggregate);
            assert!((walker.distance() - 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_step_moves_fixed_length() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut walker = Walker { x: 10.0, y: -4.0 };
        for _ in 0..100 {
            let (px, py) = (walker.x, walker.y);
            walker.step(&mut rng, 2.0);
            assert!(((walker.x - px).hypot(walker.y - py) - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stick_at_contact_distance_always_succeeds() {
        let mut rng = StdRng::seed_from_u64(3);
        let adhesion = always_sticky();

        for (x, y) in [(0.0, 6.0), (6.0, 0.0), (0.0, -6.0), (-6.0, 0.0)] {
            let mut aggregate = AggregateState::new(8.0);
            let mut process = WalkerProcess::new(params());
            process.place(x, y);

            let particle = process
                .try_sticking(&mut rng, &mut aggregate, &adhesion)
                .expect("walker in contact must stick");
            assert_eq!(particle.index, 1);
            assert!((particle.x - x).abs() < 1e-9);
            assert!((particle.y - y).abs() < 1e-9);
            assert!(process.walker().is_none());
        }
    }

    #[test]
    fn test_stick_lands_on_approach_angle() {
        let mut rng = StdRng::seed_from_u64(9);
        let adhesion = always_sticky();

        for i in 0..32 {
            let mut aggregate = AggregateState::new(8.0);
            let mut process = WalkerProcess::new(params());
            let angle = i as f64 / 32.0 * TAU;
            process.place(5.9 * angle.cos(), 5.9 * angle.sin());

            let particle = process
                .try_sticking(&mut rng, &mut aggregate, &adhesion)
                .unwrap();
            assert!((particle.distance() - 6.0).abs() < 1e-9);
            assert!((particle.x - 6.0 * angle.cos()).abs() < 1e-9);
            assert!((particle.y - 6.0 * angle.sin()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_overlapping_walker_snaps_to_contact() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut aggregate = AggregateState::new(8.0);
        let mut process = WalkerProcess::new(params());
        process.place(0.0, 1.5);

        let particle = process
            .try_sticking(&mut rng, &mut aggregate, &always_sticky())
            .unwrap();
        assert!(particle.x.abs() < 1e-9);
        assert!((particle.y - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_contact_does_not_stick() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut aggregate = AggregateState::new(8.0);
        let mut process = WalkerProcess::new(params());
        process.place(6.5, 0.0);

        assert!(process
            .try_sticking(&mut rng, &mut aggregate, &always_sticky())
            .is_none());
        assert!(process.walker().is_some());
        assert_eq!(aggregate.stuck_count(), 1);
    }

    #[test]
    fn test_zero_adhesion_never_sticks() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut aggregate = AggregateState::new(8.0);
        let mut process = WalkerProcess::new(params());
        let mut adhesion = always_sticky();
        adhesion.update(&SettingsUpdate::base_adhesion(0.0));

        for _ in 0..1000 {
            process.place(0.0, -5.0);
            assert!(process
                .try_sticking(&mut rng, &mut aggregate, &adhesion)
                .is_none());
        }
    }

    #[test]
    fn test_walker_stays_within_kill_radius() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut aggregate = AggregateState::new(8.0);
        let mut process = WalkerProcess::new(params());
        let adhesion = always_sticky();

        for _ in 0..20_000 {
            process.step(&mut rng, &mut aggregate, &adhesion);
            if let Some(walker) = process.walker() {
                assert!(walker.distance() <= aggregate.max_radius() + 80.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_respawn_when_past_kill_radius() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut aggregate = AggregateState::new(8.0);
        let mut process = WalkerProcess::new(params());
        process.place(500.0, 0.0);

        let outcome = process.step(&mut rng, &mut aggregate, &always_sticky());
        assert_eq!(outcome, StepOutcome::Respawned);
        let walker = process.walker().unwrap();
        assert!((walker.distance() - 40.0).abs() < 1e-9);
    }
}
