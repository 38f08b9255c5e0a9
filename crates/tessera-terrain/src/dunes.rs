//! Sand dunes from ridged noise, an ocean filling everything below a fixed
//! level, and palm trees on dry land.

use glam::IVec3;
use tessera_voxel::{Structure, Voxel};

use crate::noise_field::NoiseField;
use crate::shape::{ColumnGenerator, TerrainShape};

/// Scale divisor of the palm placement noise. Small enough that
/// neighbouring columns sample unrelated noise.
const PALM_NOISE_SCALE: f32 = 0.01;

/// Dune tuning.
#[derive(Clone, Debug, PartialEq)]
pub struct DuneParams {
    /// Noise seed.
    pub seed: u32,
    /// Cells below this height that are not ground are water.
    pub ocean_height: f32,
    /// Ridged noise octave scales.
    pub scales: Vec<f32>,
    /// Peak dune height.
    pub amplitude: f32,
    /// Chance in `[0, 1]` that a dry column grows a palm.
    pub palm_probability: f32,
    /// Ground voxel.
    pub sand: Voxel,
    /// Ocean voxel.
    pub water: Voxel,
}

impl Default for DuneParams {
    fn default() -> Self {
        Self {
            seed: 0,
            ocean_height: 25.0,
            scales: vec![1.0, 2.0, 4.0],
            amplitude: 50.0,
            palm_probability: 0.1,
            sand: Voxel(1),
            water: Voxel(2),
        }
    }
}

/// A palm: a five-cell trunk topped by a cross of fronds.
pub fn palm_tree(trunk: Voxel, fronds: Voxel) -> Structure {
    let mut palm = Structure::new("palm tree");
    for y in 1..=5 {
        palm.add(IVec3::new(0, y, 0), trunk);
    }
    palm.add(IVec3::new(0, 6, 0), fronds);
    for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        palm.add(IVec3::new(dx, 6, dz), fronds);
        palm.add(IVec3::new(2 * dx, 5, 2 * dz), fronds);
    }
    palm
}

/// Dune terrain.
#[derive(Clone, Debug)]
pub struct DuneShape {
    noise: NoiseField,
    params: DuneParams,
    palm: Structure,
}

impl DuneShape {
    /// Creates dunes with the default palm (trunk id 3, fronds id 4).
    pub fn new(params: DuneParams) -> Self {
        Self {
            noise: NoiseField::new(params.seed),
            params,
            palm: palm_tree(Voxel(3), Voxel(4)),
        }
    }

    /// Replaces the palm structure.
    pub fn with_palm(mut self, palm: Structure) -> Self {
        self.palm = palm;
        self
    }

    /// Active parameters.
    pub fn params(&self) -> &DuneParams {
        &self.params
    }
}

impl TerrainShape for DuneShape {
    fn base_height(&self, x: i32, z: i32) -> f32 {
        self.noise.ridged_octaves(&self.params.scales, x as f32, z as f32) * self.params.amplitude
    }

    fn voxel_at(&self, pos: IVec3, height: f32, _biome: u8) -> Voxel {
        let y = pos.y as f32;
        if y < height {
            self.params.sand
        } else if y < self.params.ocean_height {
            self.params.water
        } else {
            Voxel::AIR
        }
    }

    fn structure_at(&self, x: i32, y: i32, z: i32, _biome: u8, _height: f32) -> Option<&Structure> {
        let underwater = (y as f32) < self.params.ocean_height;
        let roll = self
            .noise
            .get01(x as f32 / PALM_NOISE_SCALE, z as f32 / PALM_NOISE_SCALE);
        (!underwater && roll < self.params.palm_probability).then_some(&self.palm)
    }
}

/// Generator producing [`DuneShape`] terrain.
pub type DuneGenerator = ColumnGenerator<DuneShape>;
