//! Wires config into the world crates and runs the per-frame loop: stream
//! around the observer, tick the store, move the observer.

use std::sync::Arc;

use glam::Vec3;
use tessera_config::{Config, TerrainConfig, TerrainKind};
use tessera_mesh::{MeshUsage, MesherConfig, VoxelMesher};
use tessera_terrain::{
    DuneGenerator, DuneParams, DuneShape, FlatGenerator, FlatShape, HillsGenerator, HillsParams,
    HillsShape,
};
use tessera_voxel::{CHUNK_RESOLUTION, RegistryError, VoxelTypeDef, VoxelTypeRegistry};
use tessera_world::{
    ChunkStore, StoreConfig, StreamingConfig, StreamingController, VoxelGenerator,
    default_thread_count,
};

/// Palette from the config; entry `i` becomes voxel id `i + 1`.
pub fn build_registry(config: &Config) -> Result<VoxelTypeRegistry, RegistryError> {
    for voxel_type in &config.voxel_types {
        if voxel_type.material >= config.meshing.materials {
            tracing::warn!(
                name = %voxel_type.name,
                material = voxel_type.material,
                materials = config.meshing.materials,
                "voxel type uses a material slot that does not exist; its faces will be dropped"
            );
        }
    }
    VoxelTypeRegistry::from_defs(config.voxel_types.iter().map(|t| VoxelTypeDef {
        name: t.name.clone(),
        material: t.material,
        group: t.group,
        color: t.color,
    }))
}

/// Generator for the configured terrain kind.
pub fn build_generator(terrain: &TerrainConfig) -> Arc<dyn VoxelGenerator> {
    match terrain.kind {
        TerrainKind::Flat => Arc::new(FlatGenerator::new(FlatShape::new(terrain.flat_height))),
        TerrainKind::Dunes => Arc::new(DuneGenerator::new(DuneShape::new(DuneParams {
            seed: terrain.seed,
            ocean_height: terrain.ocean_height,
            scales: terrain.dune_scales.clone(),
            amplitude: terrain.amplitude,
            palm_probability: terrain.palm_probability,
            ..Default::default()
        }))),
        TerrainKind::Hills => Arc::new(HillsGenerator::new(HillsShape::new(HillsParams {
            seed: terrain.seed,
            base_level: terrain.hills_base_level,
            ..Default::default()
        }))),
    }
}

/// Store tuning with unset worker counts resolved from the CPU.
pub fn store_config(config: &Config) -> StoreConfig {
    StoreConfig {
        remesh_neighbors: config.store.remesh_neighbors,
        generation_threads: config
            .workers
            .generation_threads
            .unwrap_or_else(default_thread_count),
        meshing_threads: config
            .workers
            .meshing_threads
            .unwrap_or_else(default_thread_count),
    }
}

/// Streaming tuning from the `streaming` section.
pub fn streaming_config(config: &Config) -> StreamingConfig {
    StreamingConfig {
        generation_radius: config.streaming.generation_radius,
        loads_per_step: config.streaming.loads_per_step,
        cleanup: config.streaming.cleanup,
    }
}

/// Mesher settings; every chunk gets one collision+render mesh.
pub fn mesher_config(config: &Config) -> MesherConfig {
    MesherConfig {
        materials: config.meshing.materials,
        surface_nets: config.meshing.surface_nets,
        usage: MeshUsage::CollisionAndRender,
    }
}

/// What happened during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Chunks the streaming controller started loading.
    pub loaded: u32,
    /// Chunks cleanup unloaded.
    pub unloaded: u32,
    /// Chunks whose generation completed.
    pub generated: u32,
    /// Chunks whose generation failed.
    pub failed: u32,
    /// Meshes delivered by the store.
    pub meshes: u32,
    /// Faces across those meshes.
    pub quads: usize,
    /// Chunks released by the store.
    pub released: u32,
}

impl FrameStats {
    fn accumulate(&mut self, other: &FrameStats) {
        self.loaded += other.loaded;
        self.unloaded += other.unloaded;
        self.generated += other.generated;
        self.failed += other.failed;
        self.meshes += other.meshes;
        self.quads += other.quads;
        self.released += other.released;
    }
}

/// Headless world: store, streaming controller and a moving observer.
pub struct Simulation {
    store: ChunkStore,
    streaming: StreamingController,
    observer: Vec3,
    velocity: Vec3,
    frames: u32,
    totals: FrameStats,
}

impl Simulation {
    /// Builds the world described by `config`. Fails on an invalid palette.
    pub fn new(config: &Config) -> Result<Self, RegistryError> {
        let registry = Arc::new(build_registry(config)?);
        let mesher = VoxelMesher::new(registry, mesher_config(config));
        let store = ChunkStore::new(
            store_config(config),
            Some(build_generator(&config.terrain)),
            Some(Arc::new(mesher)),
        );
        let half = CHUNK_RESOLUTION as f32 / 2.0;
        Ok(Self {
            store,
            streaming: StreamingController::new(streaming_config(config)),
            observer: Vec3::new(half, config.simulation.observer_height, half),
            velocity: Vec3::X * config.simulation.observer_speed,
            frames: 0,
            totals: FrameStats::default(),
        })
    }

    /// Runs one frame and advances the observer by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> FrameStats {
        let streamed = self.streaming.tick(self.observer, &mut self.store);
        let ticked = self.store.tick();

        let frame = FrameStats {
            loaded: streamed.loaded,
            unloaded: streamed.unloaded,
            generated: ticked.generated,
            failed: ticked.failed,
            meshes: ticked.rendered.iter().map(|r| r.meshes.len() as u32).sum(),
            quads: ticked
                .rendered
                .iter()
                .flat_map(|r| r.meshes.iter())
                .map(|m| m.mesh.quad_count())
                .sum(),
            released: ticked.released.len() as u32,
        };
        if streamed.center_changed {
            tracing::debug!(
                x = self.observer.x,
                z = self.observer.z,
                unloaded = streamed.unloaded,
                "observer changed chunk"
            );
        }

        self.observer += self.velocity * dt;
        self.frames += 1;
        self.totals.accumulate(&frame);
        frame
    }

    /// The chunk store being driven.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Observer position used by the next step.
    pub fn observer(&self) -> Vec3 {
        self.observer
    }

    /// Steps run so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Totals over every frame so far.
    pub fn totals(&self) -> FrameStats {
        self.totals
    }

    /// Releases every chunk and stops the workers. Returns the final totals.
    pub fn shutdown(mut self) -> FrameStats {
        let released = self.store.shutdown();
        self.totals.released += released.len() as u32;
        self.totals
    }
}
