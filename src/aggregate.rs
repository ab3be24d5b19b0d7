use crate::spatial::{Neighbor, NeighborBuffer, SpatialIndex};
use serde::{Deserialize, Serialize};

/// Smallest radius used when normalizing positions for the host
pub const MIN_NORMALIZATION_RADIUS: f64 = 50.0;

/// Initial capacity of the neighbor scratch buffer
const NEIGHBOR_CAPACITY: usize = 64;

/// A stuck particle. Never changes once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    /// Order in which the particle stuck, starting at 0 for the seed
    pub index: u64,
}

impl Particle {
    /// Distance from the origin
    pub fn distance(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Aggregate statistics reported alongside every particle batch
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub stuck_count: u64,
    pub max_radius: f64,
}

/// A particle position mapped into the unit square around the aggregate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPosition {
    /// 0 (left) to 1 (right)
    pub x: f64,
    /// 0 (top) to 1 (bottom)
    pub y: f64,
    /// 0 at the origin, 1 at or beyond the normalization radius
    pub distance: f64,
}

impl Stats {
    /// Normalize a particle position against the current extent.
    ///
    /// The radius is floored at [`MIN_NORMALIZATION_RADIUS`] so a freshly
    /// seeded aggregate (max radius 0) never divides by zero.
    pub fn normalize(&self, particle: &Particle) -> NormalizedPosition {
        let radius = self.max_radius.max(MIN_NORMALIZATION_RADIUS);
        NormalizedPosition {
            x: (particle.x / radius + 1.0) / 2.0,
            y: (particle.y / radius + 1.0) / 2.0,
            distance: (particle.distance() / radius).min(1.0),
        }
    }
}

/// The permanent particle set and its derived scalars
#[derive(Debug)]
pub struct AggregateState {
    particles: Vec<Particle>,
    index: SpatialIndex,
    max_radius: f64,
    neighbors: NeighborBuffer,
}

impl AggregateState {
    /// Create an aggregate holding only the seed particle at the origin
    pub fn new(cell_size: f64) -> Self {
        let mut state = Self {
            particles: Vec::new(),
            index: SpatialIndex::new(cell_size),
            max_radius: 0.0,
            neighbors: NeighborBuffer::with_capacity(NEIGHBOR_CAPACITY),
        };
        state.reset();
        state
    }

    /// Attach a particle at (`x`, `y`) and return it
    pub fn stick(&mut self, x: f64, y: f64) -> Particle {
        let particle = Particle {
            x,
            y,
            index: self.particles.len() as u64,
        };
        self.index.insert(x, y, self.particles.len());
        self.particles.push(particle);
        self.max_radius = self.max_radius.max(particle.distance());
        particle
    }

    /// Clear everything and reseed with a single particle at the origin
    pub fn reset(&mut self) -> Particle {
        self.particles.clear();
        self.index.clear();
        self.neighbors.clear();
        self.max_radius = 0.0;
        self.stick(0.0, 0.0)
    }

    /// Stuck particles within `radius` of (`x`, `y`) with their distances, in bucket order
    pub fn neighbors(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
    ) -> impl Iterator<Item = (Particle, f64)> + '_ {
        self.index
            .query_radius(x, y, radius, &self.particles, &mut self.neighbors);
        let particles = &self.particles;
        self.neighbors
            .as_slice()
            .iter()
            .map(move |n: &Neighbor| (particles[n.index], n.distance))
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn stuck_count(&self) -> u64 {
        self.particles.len() as u64
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn stats(&self) -> Stats {
        Stats {
            stuck_count: self.stuck_count(),
            max_radius: self.max_radius,
        }
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }
}
