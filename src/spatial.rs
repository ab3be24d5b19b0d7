use crate::aggregate::Particle;
use std::collections::HashMap;

/// Cell coordinates are shifted by this offset before being packed into a key.
///
/// Valid positions therefore lie within `±GRID_OFFSET * cell_size` on both
/// axes. Positions beyond that saturate into the outermost cell: they are still
/// stored and found, just in an overcrowded border bucket.
pub const GRID_OFFSET: i64 = 1 << 20;

/// Number of distinct cells per axis
pub const GRID_SIZE: i64 = 2 * GRID_OFFSET + 1;

/// A stuck particle found by a radius query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the aggregate's particle list
    pub index: usize,
    pub distance: f64,
}

/// Reusable result buffer for neighborhood queries.
///
/// Allocated once up front and cleared before every query. A query that finds
/// more neighbors than the buffer holds grows it once; later queries reuse the
/// larger allocation.
#[derive(Debug, Default)]
pub struct NeighborBuffer {
    items: Vec<Neighbor>,
}

impl NeighborBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    fn push(&mut self, neighbor: Neighbor) {
        if self.items.len() == self.items.capacity() {
            log::debug!("neighbor buffer full at {}, growing", self.items.capacity());
        }
        self.items.push(neighbor);
    }

    pub fn as_slice(&self) -> &[Neighbor] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Grid-bucketed lookup of stuck particles
///
/// Buckets hold indices into the aggregate's particle list; the index never
/// owns particle data.
#[derive(Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    cells: HashMap<i64, Vec<usize>>,
    len: usize,
}

impl SpatialIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of particles indexed
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty buckets
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell coordinate along one axis, saturated to the supported range
    fn cell_coord(&self, v: f64) -> i64 {
        let c = (v / self.cell_size).floor();
        // `as` saturates on overflow and maps NaN to 0
        (c as i64).clamp(-GRID_OFFSET, GRID_OFFSET)
    }

    /// Pack cell coordinates into a single integer key
    fn cell_key(cx: i64, cy: i64) -> i64 {
        (cx + GRID_OFFSET) * GRID_SIZE + (cy + GRID_OFFSET)
    }

    /// Add the particle at `index` (located at `x`, `y`) to its cell
    pub fn insert(&mut self, x: f64, y: f64, index: usize) {
        let key = Self::cell_key(self.cell_coord(x), self.cell_coord(y));
        self.cells.entry(key).or_default().push(index);
        self.len += 1;
    }

    /// Collect every particle within `radius` of (`x`, `y`) into `out`.
    ///
    /// Scans `ceil(radius / cell_size) + 1` rings of cells around the query
    /// cell. Results come back in bucket iteration order, not sorted by
    /// distance.
    pub fn query_radius(
        &self,
        x: f64,
        y: f64,
        radius: f64,
        particles: &[Particle],
        out: &mut NeighborBuffer,
    ) {
        out.clear();

        let rings = (radius / self.cell_size).ceil() as i64 + 1;
        let cx = self.cell_coord(x);
        let cy = self.cell_coord(y);

        for dx in -rings..=rings {
            let nx = cx + dx;
            if !(-GRID_OFFSET..=GRID_OFFSET).contains(&nx) {
                continue;
            }
            for dy in -rings..=rings {
                let ny = cy + dy;
                if !(-GRID_OFFSET..=GRID_OFFSET).contains(&ny) {
                    continue;
                }
                let Some(bucket) = self.cells.get(&Self::cell_key(nx, ny)) else {
                    continue;
                };
                for &index in bucket {
                    let p = &particles[index];
                    let distance = (p.x - x).hypot(p.y - y);
                    if distance <= radius {
                        out.push(Neighbor { index, distance });
                    }
                }
            }
        }
    }

    /// Drop every bucket
    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }
}
