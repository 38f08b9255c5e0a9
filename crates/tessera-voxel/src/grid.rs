//! Flat voxel storage for one chunk.
//!
//! Cells are laid out as `x * R * H + y * R + z`. A grid starts out pending
//! (allocated, contents meaningless) and becomes ready once it has been filled
//! from a generated buffer.

use serde::{Deserialize, Serialize};

use crate::voxel::{CHUNK_HEIGHT, CHUNK_RESOLUTION, CHUNK_VOLUME, Voxel};

/// Whether a grid holds generated data yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridState {
    /// Allocated but not yet filled.
    #[default]
    Pending,
    /// Filled and safe to read.
    Ready,
}

/// Voxel contents of a single chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelGrid {
    voxels: Box<[Voxel]>,
    state: GridState,
}

/// Row-major cell index.
#[inline]
pub fn index3d(x: usize, y: usize, z: usize) -> usize {
    x * CHUNK_RESOLUTION * CHUNK_HEIGHT + y * CHUNK_RESOLUTION + z
}

impl VoxelGrid {
    /// Allocates an all-air grid in the pending state.
    pub fn new_pending() -> Self {
        Self {
            voxels: vec![Voxel::AIR; CHUNK_VOLUME].into_boxed_slice(),
            state: GridState::Pending,
        }
    }

    /// Allocates a ready grid with every cell set to `fill`.
    pub fn filled(fill: Voxel) -> Self {
        Self {
            voxels: vec![fill; CHUNK_VOLUME].into_boxed_slice(),
            state: GridState::Ready,
        }
    }

    /// Allocates a ready all-air grid.
    pub fn empty() -> Self {
        Self::filled(Voxel::AIR)
    }

    /// Reads a cell. Coordinates must be in bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Voxel {
        debug_assert!(x < CHUNK_RESOLUTION && y < CHUNK_HEIGHT && z < CHUNK_RESOLUTION);
        self.voxels[index3d(x, y, z)]
    }

    /// Writes a cell. Coordinates must be in bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) {
        debug_assert!(x < CHUNK_RESOLUTION && y < CHUNK_HEIGHT && z < CHUNK_RESOLUTION);
        self.voxels[index3d(x, y, z)] = voxel;
    }

    /// Copies every cell from `other` and marks this grid ready.
    pub fn copy_from(&mut self, other: &VoxelGrid) {
        self.voxels.copy_from_slice(&other.voxels);
        self.state = GridState::Ready;
    }

    /// Current state.
    pub fn state(&self) -> GridState {
        self.state
    }

    /// `true` once the grid has been filled.
    pub fn is_ready(&self) -> bool {
        self.state == GridState::Ready
    }

    /// Raw cell slice in index order.
    pub fn as_slice(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Number of non-air cells.
    pub fn solid_count(&self) -> usize {
        self.voxels.iter().filter(|v| v.is_solid()).count()
    }

    /// Highest Y holding any solid cell, or `None` for an all-air grid.
    pub fn highest_solid(&self) -> Option<usize> {
        (0..CHUNK_HEIGHT).rev().find(|&y| {
            (0..CHUNK_RESOLUTION)
                .any(|x| (0..CHUNK_RESOLUTION).any(|z| self.get(x, y, z).is_solid()))
        })
    }
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new_pending()
    }
}
