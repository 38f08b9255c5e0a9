//! Rolling hills: averaged octave noise displacing the ground around a
//! base level.

use glam::IVec3;
use tessera_voxel::Voxel;

use crate::noise_field::NoiseField;
use crate::shape::{ColumnGenerator, TerrainShape};

/// Hills tuning.
#[derive(Clone, Debug, PartialEq)]
pub struct HillsParams {
    /// Noise seed.
    pub seed: u32,
    /// Mean surface height.
    pub base_level: f32,
    /// Largest distance of the surface from `base_level`.
    pub amplitude: f32,
    /// Octave scales averaged into the height. Larger scales give broader hills.
    pub scales: Vec<f32>,
    /// Ground voxel.
    pub ground: Voxel,
}

impl Default for HillsParams {
    fn default() -> Self {
        Self {
            seed: 0,
            base_level: 64.0,
            amplitude: 24.0,
            scales: vec![2.0, 4.0, 8.0],
            ground: Voxel(1),
        }
    }
}

/// Ground filled up to `base_level ± amplitude`.
#[derive(Clone, Debug)]
pub struct HillsShape {
    noise: NoiseField,
    params: HillsParams,
}

impl HillsShape {
    /// Hills seeded from `params.seed`.
    pub fn new(params: HillsParams) -> Self {
        Self {
            noise: NoiseField::new(params.seed),
            params,
        }
    }

    /// Tuning the shape was built with.
    pub fn params(&self) -> &HillsParams {
        &self.params
    }
}

impl TerrainShape for HillsShape {
    fn base_height(&self, x: i32, z: i32) -> f32 {
        let octaves = self.noise.octaves(&self.params.scales, x as f32, z as f32);
        self.params.base_level + (octaves * 2.0 - 1.0) * self.params.amplitude
    }

    fn voxel_at(&self, pos: IVec3, height: f32, _biome: u8) -> Voxel {
        if (pos.y as f32) < height { self.params.ground } else { Voxel::AIR }
    }
}

/// Generator producing [`HillsShape`] terrain.
pub type HillsGenerator = ColumnGenerator<HillsShape>;
