//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Ring streaming around the observer.
    pub streaming: StreamingConfig,
    /// Chunk store behaviour.
    pub store: StoreConfig,
    /// Mesher settings.
    pub meshing: MeshingConfig,
    /// Background worker threads.
    pub workers: WorkerConfig,
    /// Reference terrain generator.
    pub terrain: TerrainConfig,
    /// Voxel palette; entry `i` becomes voxel id `i + 1`.
    pub voxel_types: Vec<VoxelTypeConfig>,
    /// Headless frame loop.
    pub simulation: SimulationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Outermost ring loaded around the observer, in chunks.
    pub generation_radius: u32,
    /// Chunk load attempts per frame.
    pub loads_per_step: u32,
    /// Unload chunks beyond the radius when the observer changes chunk.
    pub cleanup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Re-render neighbors so seams close on both sides.
    pub remesh_neighbors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshingConfig {
    /// Smooth chunk meshes with surface-nets relaxation.
    pub surface_nets: bool,
    /// Number of material slots (one submesh each).
    pub materials: usize,
}

/// Worker thread counts. `None` picks a count from the CPU; `Some(0)` runs
/// jobs on the main thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Threads running terrain generation.
    pub generation_threads: Option<usize>,
    /// Threads building chunk meshes.
    pub meshing_threads: Option<usize>,
}

/// Which reference generator to run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum TerrainKind {
    /// Constant-height ground.
    Flat,
    /// Ridged dunes, ocean and palm trees.
    #[default]
    Dunes,
    /// Octave-noise rolling hills.
    Hills,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Generator to run.
    pub kind: TerrainKind,
    /// Noise seed.
    pub seed: u32,
    /// Ground height of flat terrain.
    pub flat_height: f32,
    /// Water fills non-ground cells below this height.
    pub ocean_height: f32,
    /// Ridged noise octave scales of the dunes.
    pub dune_scales: Vec<f32>,
    /// Peak dune height.
    pub amplitude: f32,
    /// Chance that a dry column grows a palm.
    pub palm_probability: f32,
    /// Mean surface height of hills.
    pub hills_base_level: f32,
}

/// One voxel type of the palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoxelTypeConfig {
    /// Unique name; the palette position decides the voxel id.
    pub name: String,
    /// Material slot (submesh) the type is drawn with.
    pub material: usize,
    /// Types in the same group merge without faces between them.
    pub group: u8,
    /// Vertex colour, RGBA.
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Frames to run before exiting.
    pub frames: u32,
    /// Observer speed along +X, in voxels per second.
    pub observer_speed: f32,
    /// Height of the observer.
    pub observer_height: f32,
    /// Target frame duration in milliseconds (0 = run flat out).
    pub frame_millis: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level filter (e.g. "info", "debug,tessera_world=trace").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            streaming: StreamingConfig::default(),
            store: StoreConfig::default(),
            meshing: MeshingConfig::default(),
            workers: WorkerConfig::default(),
            terrain: TerrainConfig::default(),
            voxel_types: default_voxel_types(),
            simulation: SimulationConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

fn default_voxel_types() -> Vec<VoxelTypeConfig> {
    vec![
        VoxelTypeConfig {
            name: "sand".to_string(),
            material: 0,
            group: 0,
            color: [0.86, 0.78, 0.55, 1.0],
        },
        VoxelTypeConfig {
            name: "water".to_string(),
            material: 0,
            group: 1,
            color: [0.2, 0.45, 0.8, 0.7],
        },
        VoxelTypeConfig {
            name: "palm trunk".to_string(),
            material: 0,
            group: 0,
            color: [0.45, 0.32, 0.2, 1.0],
        },
        VoxelTypeConfig {
            name: "palm fronds".to_string(),
            material: 0,
            group: 2,
            color: [0.25, 0.6, 0.2, 1.0],
        },
    ]
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            generation_radius: 8,
            loads_per_step: 4,
            cleanup: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remesh_neighbors: true,
        }
    }
}

impl Default for MeshingConfig {
    fn default() -> Self {
        Self {
            surface_nets: false,
            materials: 1,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            kind: TerrainKind::Dunes,
            seed: 0,
            flat_height: 8.0,
            ocean_height: 25.0,
            dune_scales: vec![1.0, 2.0, 4.0],
            amplitude: 50.0,
            palm_probability: 0.1,
            hills_base_level: 64.0,
        }
    }
}

impl Default for VoxelTypeConfig {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            material: 0,
            group: 0,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            observer_speed: 8.0,
            observer_height: 60.0,
            frame_millis: 16,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for Tessera (`<config dir>/tessera`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("tessera"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(ConfigError::read(&config_path))?;
            let config: Config =
                ron::from_str(&contents).map_err(ConfigError::parse(&config_path))?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::write(config_dir))?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        let config_path = config_dir.join(CONFIG_FILE);
        std::fs::write(&config_path, serialized).map_err(ConfigError::write(&config_path))?;
        Ok(())
    }

    /// Re-reads the file: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents =
            std::fs::read_to_string(&config_path).map_err(ConfigError::read(&config_path))?;
        let new_config: Config =
            ron::from_str(&contents).map_err(ConfigError::parse(&config_path))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
