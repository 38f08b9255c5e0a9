//! Reference terrain generators: flat ground, ridged sand dunes with an
//! ocean fill and palm trees, and noise-displaced hills.

mod dunes;
mod flat;
mod hills;
mod noise_field;
mod shape;

pub use dunes::{DuneGenerator, DuneParams, DuneShape, palm_tree};
pub use flat::{FlatGenerator, FlatShape};
pub use hills::{HillsGenerator, HillsParams, HillsShape};
pub use noise_field::NoiseField;
pub use shape::{ColumnGenerator, TerrainShape};
