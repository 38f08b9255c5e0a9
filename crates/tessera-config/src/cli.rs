//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;
use crate::config::TerrainKind;

/// Tessera command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Headless Tessera voxel world")]
pub struct CliArgs {
    /// Generation radius in chunks.
    #[arg(long)]
    pub generation_radius: Option<u32>,

    /// Chunk load attempts per frame.
    #[arg(long)]
    pub loads_per_step: Option<u32>,

    /// Smooth meshes with surface-nets relaxation.
    #[arg(long)]
    pub surface_nets: Option<bool>,

    /// Terrain generator.
    #[arg(long, value_enum)]
    pub terrain: Option<TerrainKind>,

    /// Terrain noise seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(radius) = args.generation_radius {
            self.streaming.generation_radius = radius;
        }
        if let Some(loads) = args.loads_per_step {
            self.streaming.loads_per_step = loads;
        }
        if let Some(nets) = args.surface_nets {
            self.meshing.surface_nets = nets;
        }
        if let Some(kind) = args.terrain {
            self.terrain.kind = kind;
        }
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if let Some(frames) = args.frames {
            self.simulation.frames = frames;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
