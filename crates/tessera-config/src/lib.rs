//! Configuration for the Tessera voxel world.
//!
//! Settings persist to disk as `config.ron`, missing fields fall back to
//! defaults, and selected values can be overridden from the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, MeshingConfig, SimulationConfig, StoreConfig, StreamingConfig,
    TerrainConfig, TerrainKind, VoxelTypeConfig, WorkerConfig, default_config_dir,
};
pub use error::ConfigError;
