//! Generator contract: produce the voxel contents of one chunk.

use tessera_voxel::{ChunkCoord, Placement, VoxelGrid, apply_placements};

use crate::error::GenerateError;

/// Output of a generator run.
#[derive(Clone, Debug, Default)]
pub struct GeneratedChunk {
    /// Filled voxel buffer.
    pub grid: VoxelGrid,
    /// Structure voxels to stamp onto empty cells afterwards.
    pub placements: Vec<Placement>,
}

impl GeneratedChunk {
    /// A generated buffer with no structures.
    pub fn new(grid: VoxelGrid) -> Self {
        Self {
            grid,
            placements: Vec::new(),
        }
    }

    /// Builder form that attaches structure placements.
    pub fn with_placements(mut self, placements: Vec<Placement>) -> Self {
        self.placements = placements;
        self
    }

    /// Stamps the placements and returns the final grid.
    pub fn into_grid(mut self) -> VoxelGrid {
        apply_placements(&mut self.grid, &self.placements);
        self.grid
    }
}

/// Produces chunk contents. Runs on generation worker threads, so
/// implementations must be thread-safe and must not touch the store.
pub trait VoxelGenerator: Send + Sync {
    /// Generates the chunk at `coord`.
    fn generate(&self, coord: ChunkCoord) -> Result<GeneratedChunk, GenerateError>;
}

impl<F> VoxelGenerator for F
where
    F: Fn(ChunkCoord) -> Result<GeneratedChunk, GenerateError> + Send + Sync,
{
    fn generate(&self, coord: ChunkCoord) -> Result<GeneratedChunk, GenerateError> {
        self(coord)
    }
}
