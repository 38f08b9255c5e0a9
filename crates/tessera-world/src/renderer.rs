//! Renderer contract: turn a chunk neighborhood into usage-tagged meshes.

use tessera_mesh::{UsageMesh, VoxelMesher};
use tessera_voxel::{ChunkCoord, ChunkNeighborhood};

use crate::error::RenderError;

/// Meshes chunks. Runs on meshing worker threads against an owned
/// neighborhood snapshot.
pub trait ChunkRenderer: Send + Sync {
    /// Produces the meshes for the center chunk of `hood`.
    fn render(&self, coord: ChunkCoord, hood: &ChunkNeighborhood) -> Result<Vec<UsageMesh>, RenderError>;
}

impl ChunkRenderer for VoxelMesher {
    fn render(&self, _coord: ChunkCoord, hood: &ChunkNeighborhood) -> Result<Vec<UsageMesh>, RenderError> {
        Ok(self.mesh_tagged(hood))
    }
}
