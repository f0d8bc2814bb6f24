//! Spatial Index
//!
//! Uniform XZ grid over container AABBs. Built once per layer on the refresh
//! thread, then used for ray hit-testing and as the walker's ground probe.
//!
//! Each entry is stored in every cell its footprint overlaps. Ray queries walk
//! the cells along the ray's XZ projection (2D DDA) and stop as soon as the
//! best hit lies before the next cell boundary.

use std::collections::{HashMap, HashSet};

use glam::Vec3;

use super::collision::{Aabb, ray_aabb_intersect, ray_aabb_span};
use super::ground::GroundProbe;

/// Default cell edge length in meters, about half a 40ft container.
pub const DEFAULT_CELL_SIZE: f32 = 6.0;

#[derive(Debug, Clone)]
struct IndexEntry<K> {
    aabb: Aabb,
    key: K,
}

/// Nearest entry hit by a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit<'a, K> {
    pub key: &'a K,
    pub aabb: Aabb,
    pub distance: f32,
}

/// Grid of boxes keyed by `K`.
#[derive(Debug, Clone)]
pub struct SpatialIndex<K> {
    cell_size: f32,
    entries: Vec<IndexEntry<K>>,
    cells: HashMap<(i32, i32), Vec<usize>>,
    extent: Option<Aabb>,
}

impl<K> Default for SpatialIndex<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl<K> SpatialIndex<K> {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.1),
            entries: Vec::new(),
            cells: HashMap::new(),
            extent: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty grid cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, x: f32, z: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, aabb: Aabb, key: K) {
        let idx = self.entries.len();
        let (x0, z0) = self.cell_of(aabb.min.x, aabb.min.z);
        let (x1, z1) = self.cell_of(aabb.max.x, aabb.max.z);
        for cx in x0..=x1 {
            for cz in z0..=z1 {
                self.cells.entry((cx, cz)).or_default().push(idx);
            }
        }
        self.extent = Some(match self.extent {
            Some(e) => e.union(&aabb),
            None => aabb,
        });
        self.entries.push(IndexEntry { aabb, key });
    }

    /// Entries whose footprint contains `(x, z)`.
    pub fn query_point(&self, x: f32, z: f32) -> impl Iterator<Item = (&K, &Aabb)> {
        self.cells
            .get(&self.cell_of(x, z))
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
            .filter(move |e| e.aabb.contains_xz(x, z))
            .map(|e| (&e.key, &e.aabb))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Aabb)> {
        self.entries.iter().map(|e| (&e.key, &e.aabb))
    }

    /// Nearest entry along the ray within `max_dist`.
    ///
    /// `dir` must be normalized.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<IndexHit<'_, K>> {
        let extent = self.extent?;
        let (t_start, t_exit) = ray_aabb_span(origin, dir, extent.min, extent.max)?;
        let t_end = t_exit.min(max_dist);
        if t_start > t_end {
            return None;
        }

        let start = origin + dir * t_start;
        let (mut cx, mut cz) = self.cell_of(start.x, start.z);

        let axis = |o: f32, d: f32, c: i32| -> (i32, f32, f32) {
            if d.abs() < 1e-9 {
                return (0, f32::INFINITY, f32::INFINITY);
            }
            let step = if d > 0.0 { 1 } else { -1 };
            let boundary = if d > 0.0 {
                (c + 1) as f32 * self.cell_size
            } else {
                c as f32 * self.cell_size
            };
            ((step), (boundary - o) / d, self.cell_size / d.abs())
        };
        let (step_x, mut t_max_x, t_delta_x) = axis(origin.x, dir.x, cx);
        let (step_z, mut t_max_z, t_delta_z) = axis(origin.z, dir.z, cz);

        let mut best: Option<(usize, f32)> = None;
        let mut tested: HashSet<usize> = HashSet::new();

        // Upper bound on visited cells: extent diagonal in cells plus slack
        let span = extent.size();
        let max_steps = ((span.x + span.z) / self.cell_size).ceil() as usize + 4;

        for _ in 0..max_steps {
            if let Some(bucket) = self.cells.get(&(cx, cz)) {
                for &i in bucket {
                    if !tested.insert(i) {
                        continue;
                    }
                    let entry = &self.entries[i];
                    if let Some(t) = ray_aabb_intersect(origin, dir, entry.aabb.min, entry.aabb.max)
                    {
                        if t <= max_dist && best.is_none_or(|(_, bt)| t < bt) {
                            best = Some((i, t));
                        }
                    }
                }
            }

            let t_next = t_max_x.min(t_max_z);
            if best.is_some_and(|(_, bt)| bt <= t_next) || t_next > t_end {
                break;
            }
            if t_max_x < t_max_z {
                cx += step_x;
                t_max_x += t_delta_x;
            } else {
                cz += step_z;
                t_max_z += t_delta_z;
            }
        }

        best.map(|(i, distance)| IndexHit {
            key: &self.entries[i].key,
            aabb: self.entries[i].aabb,
            distance,
        })
    }
}

impl<K> GroundProbe for SpatialIndex<K> {
    fn surface_below(&self, x: f32, z: f32, max_y: f32) -> f32 {
        self.query_point(x, z)
            .map(|(_, aabb)| aabb.max.y)
            .filter(|top| *top <= max_y)
            .fold(0.0, f32::max)
    }

    fn obstructed(&self, x: f32, z: f32, min_y: f32, max_y: f32) -> bool {
        self.query_point(x, z)
            .any(|(_, aabb)| aabb.min.y < max_y && aabb.max.y > min_y)
    }
}
