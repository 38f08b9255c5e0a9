//! Flat ground of a single voxel type.

use glam::IVec3;
use tessera_voxel::Voxel;

use crate::shape::{ColumnGenerator, TerrainShape};

/// Every column filled up to `height` with `voxel`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatShape {
    /// Cells with `y < height` are filled.
    pub height: f32,
    /// Fill voxel.
    pub voxel: Voxel,
}

impl FlatShape {
    /// Ground `height` cells deep of voxel id 1.
    pub fn new(height: f32) -> Self {
        Self {
            height,
            voxel: Voxel(1),
        }
    }
}

impl TerrainShape for FlatShape {
    fn base_height(&self, _x: i32, _z: i32) -> f32 {
        self.height
    }

    fn voxel_at(&self, pos: IVec3, height: f32, _biome: u8) -> Voxel {
        if (pos.y as f32) < height { self.voxel } else { Voxel::AIR }
    }
}

/// Generator producing [`FlatShape`] terrain.
pub type FlatGenerator = ColumnGenerator<FlatShape>;
