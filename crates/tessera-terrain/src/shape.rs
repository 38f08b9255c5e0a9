//! Column-based generation: a [`TerrainShape`] describes the terrain per
//! (x, z) column and [`ColumnGenerator`] runs it across a chunk.

use glam::IVec3;
use tessera_voxel::{CHUNK_HEIGHT, CHUNK_RESOLUTION, ChunkCoord, Structure, Voxel, VoxelGrid};
use tessera_world::{GenerateError, GeneratedChunk, VoxelGenerator};

/// Terrain described column by column, in world coordinates.
///
/// For each column the generator asks for the base height, lets the biome
/// step adjust it, fills every cell with [`voxel_at`](Self::voxel_at) and
/// finally asks for a structure rooted at `floor(height)`.
pub trait TerrainShape: Send + Sync {
    /// Surface height before biome adjustment.
    fn base_height(&self, _x: i32, _z: i32) -> f32 {
        CHUNK_HEIGHT as f32 / 2.0
    }

    /// Final height and biome id. `max_additional` is the headroom left
    /// above `base` inside the chunk.
    fn biome_height(&self, _x: i32, _z: i32, base: f32, _max_additional: f32) -> (f32, u8) {
        (base, 0)
    }

    /// Voxel for one cell given the column's final height.
    fn voxel_at(&self, pos: IVec3, height: f32, _biome: u8) -> Voxel {
        if (pos.y as f32) < height { Voxel(1) } else { Voxel::AIR }
    }

    /// Structure rooted at `(x, y, z)`, if any.
    fn structure_at(&self, _x: i32, _y: i32, _z: i32, _biome: u8, _height: f32) -> Option<&Structure> {
        None
    }
}

/// Adapts a [`TerrainShape`] into a [`VoxelGenerator`].
#[derive(Clone, Debug)]
pub struct ColumnGenerator<S> {
    shape: S,
}

impl<S: TerrainShape> ColumnGenerator<S> {
    /// Wraps `shape`.
    pub fn new(shape: S) -> Self {
        Self { shape }
    }

    /// The wrapped shape.
    pub fn shape(&self) -> &S {
        &self.shape
    }
}

impl<S: TerrainShape> VoxelGenerator for ColumnGenerator<S> {
    fn generate(&self, coord: ChunkCoord) -> Result<GeneratedChunk, GenerateError> {
        let origin = coord.origin();
        let chunk_height = CHUNK_HEIGHT as f32;
        let mut grid = VoxelGrid::new_pending();
        let mut placements = Vec::new();

        for x in 0..CHUNK_RESOLUTION {
            for z in 0..CHUNK_RESOLUTION {
                let wx = origin.x + x as i32;
                let wz = origin.z + z as i32;
                let base = self.shape.base_height(wx, wz);
                let max_additional = (chunk_height - base).clamp(0.0, chunk_height);
                let (height, biome) = self.shape.biome_height(wx, wz, base, max_additional);
                if !height.is_finite() {
                    return Err(GenerateError::Failed {
                        coord,
                        reason: format!("non-finite terrain height at column ({wx}, {wz})"),
                    });
                }

                for y in 0..CHUNK_HEIGHT {
                    let pos = IVec3::new(wx, origin.y + y as i32, wz);
                    let voxel = self.shape.voxel_at(pos, height, biome);
                    if voxel.is_solid() {
                        grid.set(x, y, z, voxel);
                    }
                }

                let root_y = height.floor() as i32;
                if let Some(structure) = self.shape.structure_at(wx, root_y, wz, biome, height) {
                    placements.extend(structure.placements_at(IVec3::new(x as i32, root_y, z as i32)));
                }
            }
        }

        tracing::trace!(chunk = %coord, structures = placements.len(), "generated chunk columns");
        Ok(GeneratedChunk::new(grid).with_placements(placements))
    }
}
