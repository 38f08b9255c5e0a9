//! Seeded 2D simplex noise with the octave helpers the generators share.

use noise::{NoiseFn, Simplex};

/// Input coordinates are scaled by this before sampling.
pub const NOISE_FREQUENCY: f64 = 0.01;

/// 2D simplex noise field.
#[derive(Clone, Debug)]
pub struct NoiseField {
    simplex: Simplex,
}

impl NoiseField {
    /// Creates a field for `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            simplex: Simplex::new(seed),
        }
    }

    /// Raw noise in `[-1, 1]`.
    #[inline]
    pub fn get(&self, x: f32, z: f32) -> f32 {
        let value = self
            .simplex
            .get([x as f64 * NOISE_FREQUENCY, z as f64 * NOISE_FREQUENCY]);
        value.clamp(-1.0, 1.0) as f32
    }

    /// Noise remapped to `[0, 1]`.
    #[inline]
    pub fn get01(&self, x: f32, z: f32) -> f32 {
        (self.get(x, z) + 1.0) / 2.0
    }

    /// Noise remapped to `[floor, max]` at `scale`.
    pub fn height_between(&self, scale: f32, floor: f32, max: f32, x: f32, z: f32) -> f32 {
        self.get01(x / scale, z / scale) * (max - floor) + floor
    }

    /// Per-scale offset so octaves at different scales don't line up.
    fn scale_offset(&self, scale: f32) -> f32 {
        self.get(scale / 10.0, scale / 10.0) * 100.0
    }

    /// Mean of `[0, 1]` noise over `scales`. 0 for no scales.
    pub fn octaves(&self, scales: &[f32], x: f32, z: f32) -> f32 {
        self.average(scales, |n| (n + 1.0) / 2.0, x, z)
    }

    /// Ridged octaves: mean of `1 - |noise|`, peaking along noise zero lines.
    pub fn ridged_octaves(&self, scales: &[f32], x: f32, z: f32) -> f32 {
        self.average(scales, |n| 1.0 - n.abs(), x, z)
    }

    /// Inverse ridged octaves: mean of `|noise|`.
    pub fn ridged_octaves_inverse(&self, scales: &[f32], x: f32, z: f32) -> f32 {
        self.average(scales, f32::abs, x, z)
    }

    fn average(&self, scales: &[f32], shape: impl Fn(f32) -> f32, x: f32, z: f32) -> f32 {
        if scales.is_empty() {
            return 0.0;
        }
        let total: f32 = scales
            .iter()
            .map(|&scale| {
                let offset = self.scale_offset(scale);
                shape(self.get((x + offset) / scale, (z + offset) / scale))
            })
            .sum();
        total / scales.len() as f32
    }
}
