//! Observer-centred streaming: loads chunks ring by ring around the
//! observer under a per-step budget and unloads chunks that fall behind.

use std::f32::consts::SQRT_2;

use glam::Vec3;
use tessera_voxel::{CHUNK_RESOLUTION, ChunkCoord};

use crate::store::{ChunkStore, UnloadOutcome};

/// Streaming tuning.
#[derive(Clone, Debug)]
pub struct StreamingConfig {
    /// Outermost ring loaded around the observer, in chunks.
    pub generation_radius: u32,
    /// Maximum load attempts per [`StreamingController::tick`].
    pub loads_per_step: u32,
    /// Unload far chunks whenever the observer enters a new chunk.
    pub cleanup: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            generation_radius: 8,
            loads_per_step: 4,
            cleanup: true,
        }
    }
}

/// Result of a single streaming tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamingTickResult {
    /// Chunks newly loaded this tick.
    pub loaded: u32,
    /// Chunks unloaded by cleanup this tick.
    pub unloaded: u32,
    /// The observer entered a different chunk this tick.
    pub center_changed: bool,
    /// Ring the walk will continue from.
    pub radius: u32,
}

/// Offsets of ring `r` around the center, in walk order: forward edge,
/// right edge, backward edge, left edge. Ring 0 is the center alone.
pub fn ring_offsets(r: u32) -> Vec<(i32, i32)> {
    let r = r as i32;
    if r == 0 {
        return vec![(0, 0)];
    }
    let mut offsets = Vec::with_capacity(8 * r as usize);
    offsets.extend((-r..r).map(|i| (i, r)));
    offsets.extend((-r + 1..=r).map(|i| (r, i)));
    offsets.extend((-r + 1..=r).map(|i| (i, -r)));
    offsets.extend((-r..r).map(|i| (-r, i)));
    offsets
}

/// Drives chunk loading around a moving observer.
///
/// Call [`tick`](Self::tick) once per frame with the observer position.
#[derive(Debug)]
pub struct StreamingController {
    config: StreamingConfig,
    center: Option<ChunkCoord>,
    radius: u32,
    /// Next index inside the current ring.
    cursor: usize,
}

impl StreamingController {
    /// Creates an inactive controller; the first tick activates it.
    ///
    /// A budget of zero loads would stall the walk after the center chunk,
    /// so it is raised to one with a warning.
    pub fn new(mut config: StreamingConfig) -> Self {
        if config.loads_per_step == 0 {
            tracing::warn!("loads_per_step is 0; streaming one chunk per step instead");
            config.loads_per_step = 1;
        }
        Self {
            config,
            center: None,
            radius: 0,
            cursor: 0,
        }
    }

    /// Streaming configuration.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Chunk the observer was last seen in.
    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    /// Ring currently being walked.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// `true` once every ring up to the generation radius has been walked.
    pub fn is_complete(&self) -> bool {
        self.center.is_some() && self.radius > self.config.generation_radius
    }

    /// Advances the walk by one step.
    ///
    /// Entering a new chunk shrinks the walked radius by the rounded
    /// displacement, loads the new center, optionally runs cleanup and
    /// restarts the current ring. Each step then loads at most
    /// `loads_per_step` coordinates and stops at the end of a ring.
    pub fn tick(&mut self, observer: Vec3, store: &mut ChunkStore) -> StreamingTickResult {
        let mut result = StreamingTickResult::default();
        let current = ChunkCoord::from_world(observer);

        if self.center != Some(current) {
            let displacement = self
                .center
                .map_or(u32::MAX, |old| old.distance(current).round() as u32);
            self.radius = self.radius.saturating_sub(displacement);
            self.cursor = 0;
            self.center = Some(current);
            result.center_changed = true;
            tracing::debug!(chunk = %current, radius = self.radius, "observer entered chunk");

            if store.load(current) {
                result.loaded += 1;
            }
            if self.config.cleanup {
                result.unloaded = self.cleanup(observer, store);
            }
        }

        if self.radius <= self.config.generation_radius {
            let ring = ring_offsets(self.radius);
            let mut attempts = 0;
            while self.cursor < ring.len() && attempts < self.config.loads_per_step {
                let (dx, dz) = ring[self.cursor];
                self.cursor += 1;
                attempts += 1;
                if store.load(current.offset(dx, dz)) {
                    result.loaded += 1;
                }
            }
            if self.cursor >= ring.len() {
                self.radius += 1;
                self.cursor = 0;
            }
        }

        result.radius = self.radius;
        result
    }

    /// Unloads every chunk whose footprint center lies farther from the
    /// observer than the generation radius diagonal. Returns the count.
    pub fn cleanup(&self, observer: Vec3, store: &mut ChunkStore) -> u32 {
        let max_distance = self.config.generation_radius as f32 * CHUNK_RESOLUTION as f32 * SQRT_2;
        let mut unloaded = 0;
        for coord in store.loaded_coords() {
            let (cx, cz) = coord.center_xz();
            let dx = cx - observer.x;
            let dz = cz - observer.z;
            if (dx * dx + dz * dz).sqrt() > max_distance
                && store.unload(coord) != UnloadOutcome::NotLoaded
            {
                unloaded += 1;
            }
        }
        if unloaded > 0 {
            tracing::debug!(unloaded, "cleanup unloaded distant chunks");
        }
        unloaded
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use tessera_voxel::VoxelGrid;

    use super::*;
    use crate::error::GenerateError;
    use crate::generator::{GeneratedChunk, VoxelGenerator};
    use crate::store::StoreConfig;

    fn empty_chunk(_coord: ChunkCoord) -> Result<GeneratedChunk, GenerateError> {
        Ok(GeneratedChunk::new(VoxelGrid::empty()))
    }

    fn store() -> ChunkStore {
        ChunkStore::new(
            StoreConfig {
                remesh_neighbors: true,
                generation_threads: 0,
                meshing_threads: 0,
            },
            Some(Arc::new(empty_chunk) as Arc<dyn VoxelGenerator>),
            None,
        )
    }

    fn chunk_center(x: i32, z: i32) -> Vec3 {
        let r = CHUNK_RESOLUTION as f32;
        Vec3::new(x as f32 * r + r / 2.0, 0.0, z as f32 * r + r / 2.0)
    }

    #[test]
    fn test_ring_zero_is_center() {
        assert_eq!(ring_offsets(0), vec![(0, 0)]);
    }

    #[test]
    fn test_ring_one_order() {
        assert_eq!(
            ring_offsets(1),
            vec![
                (-1, 1),
                (0, 1),
                (1, 0),
                (1, 1),
                (0, -1),
                (1, -1),
                (-1, -1),
                (-1, 0),
            ]
        );
    }

    #[test]
    fn test_rings_cover_each_cell_once() {
        for r in 1..6u32 {
            let ring = ring_offsets(r);
            let unique: HashSet<_> = ring.iter().copied().collect();
            assert_eq!(ring.len(), 8 * r as usize);
            assert_eq!(unique.len(), ring.len());
            assert!(ring.iter().all(|&(x, z)| x.abs().max(z.abs()) == r as i32));
        }
    }

    #[test]
    fn test_budget_and_ring_boundaries() {
        let mut store = store();
        let mut streaming = StreamingController::new(StreamingConfig {
            generation_radius: 2,
            loads_per_step: 3,
            cleanup: true,
        });
        let observer = chunk_center(0, 0);

        // Center load plus ring 0 (already loaded), then stop at the ring end.
        let first = streaming.tick(observer, &mut store);
        assert!(first.center_changed);
        assert_eq!(first.loaded, 1);
        assert_eq!(first.radius, 1);

        let loads: Vec<u32> = (0..3).map(|_| streaming.tick(observer, &mut store).loaded).collect();
        assert_eq!(loads, vec![3, 3, 2]);
        assert_eq!(streaming.radius(), 2);

        while !streaming.is_complete() {
            let step = streaming.tick(observer, &mut store);
            assert!(step.loaded <= 3);
            assert!(!step.center_changed);
        }
        assert_eq!(store.len(), 25);
        assert_eq!(streaming.tick(observer, &mut store).loaded, 0);
    }

    #[test]
    fn test_zero_budget_still_streams() {
        let mut store = store();
        let mut streaming = StreamingController::new(StreamingConfig {
            generation_radius: 2,
            loads_per_step: 0,
            cleanup: true,
        });
        assert_eq!(streaming.config().loads_per_step, 1);

        let observer = chunk_center(0, 0);
        for _ in 0..100 {
            let step = streaming.tick(observer, &mut store);
            assert!(step.loaded <= 1);
        }
        assert!(streaming.is_complete());
        assert_eq!(store.len(), 25);
    }

    #[test]
    fn test_displacement_shrinks_radius() {
        let mut store = store();
        let mut streaming = StreamingController::new(StreamingConfig {
            generation_radius: 2,
            loads_per_step: 100,
            cleanup: false,
        });
        while !streaming.is_complete() {
            streaming.tick(chunk_center(0, 0), &mut store);
        }
        assert_eq!(streaming.radius(), 3);

        let moved = streaming.tick(chunk_center(1, 0), &mut store);
        assert!(moved.center_changed);
        // Restarted at ring 2 around (1, 0): only the new column is loaded.
        assert_eq!(moved.loaded, 5);
        assert_eq!(moved.radius, 3);

        let jumped = streaming.tick(chunk_center(10, 0), &mut store);
        assert_eq!(jumped.loaded, 1);
        assert_eq!(jumped.radius, 1);
    }

    #[test]
    fn test_cleanup_unloads_far_chunks() {
        let mut store = store();
        let mut streaming = StreamingController::new(StreamingConfig {
            generation_radius: 1,
            loads_per_step: 100,
            cleanup: true,
        });
        while !streaming.is_complete() {
            streaming.tick(chunk_center(0, 0), &mut store);
        }
        assert_eq!(store.len(), 9);

        let result = streaming.tick(chunk_center(5, 0), &mut store);
        assert_eq!(result.unloaded, 9);
        assert_eq!(store.loaded_coords(), vec![ChunkCoord::new(5, 0)]);
        assert_eq!(store.tick().released.len(), 9);
    }

    #[test]
    fn test_cleanup_keeps_chunks_within_diagonal() {
        let mut store = store();
        let streaming = StreamingController::new(StreamingConfig {
            generation_radius: 1,
            loads_per_step: 4,
            cleanup: true,
        });
        store.load(ChunkCoord::new(1, 1));
        store.load(ChunkCoord::new(2, 0));
        // Threshold is 16 * sqrt(2): (1, 1) is about 21 away, (2, 0) about 31.
        let unloaded = streaming.cleanup(Vec3::new(9.0, 0.0, 9.0), &mut store);
        assert_eq!(unloaded, 1);
        assert!(store.contains(ChunkCoord::new(1, 1)));
    }
}
