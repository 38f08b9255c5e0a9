//! Voxel cells, chunk grids, cross-chunk boundary lookups, the voxel type
//! registry, and structures.

pub mod boundary;
pub mod grid;
pub mod registry;
pub mod structure;
pub mod voxel;

pub use boundary::{CellClass, ChunkNeighborhood, classify, within_bounds, within_outer_buffer};
pub use grid::{GridState, VoxelGrid, index3d};
pub use registry::{RegistryError, VoxelTypeDef, VoxelTypeRegistry};
pub use structure::{Placement, Structure, StructureVoxel, apply_placements};
pub use voxel::{
    CHUNK_HEIGHT, CHUNK_RESOLUTION, CHUNK_VOLUME, ChunkCoord, MAX_CHUNK_INDEX, Side, Voxel,
    world_to_local,
};
