//! Chunk store: owns every loaded chunk and drives its lifecycle.
//!
//! `PendingGeneration → WaitingForNeighbors → Rendering → Idle`, with edits
//! going `Idle → Rendering` and generation errors ending in `Failed`.
//! Background work is dispatched to two [`WorkerPool`]s and its results are
//! drained once per [`ChunkStore::tick`]. Every job carries the entry serial
//! it was issued for; a result whose serial no longer matches a live entry
//! belongs to an unloaded chunk and is dropped.

use std::sync::Arc;

use glam::Vec3;
use rustc_hash::FxHashMap;
use tessera_mesh::UsageMesh;
use tessera_voxel::{
    CHUNK_HEIGHT, CHUNK_RESOLUTION, ChunkCoord, ChunkNeighborhood, Side, Voxel, VoxelGrid,
    world_to_local,
};

use crate::error::{EditError, GenerateError, RenderError, TaskFailure};
use crate::generator::{GeneratedChunk, VoxelGenerator};
use crate::pool::WorkerPool;
use crate::renderer::ChunkRenderer;

/// Default worker count: leave two cores for the main thread and the OS.
pub fn default_thread_count() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

/// Store tuning.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Re-render already-rendered neighbors when a chunk becomes ready next
    /// to them or an edit touches a shared border.
    pub remesh_neighbors: bool,
    /// Generation worker threads. 0 runs jobs inline on submit.
    pub generation_threads: usize,
    /// Meshing worker threads. 0 runs jobs inline on submit.
    pub meshing_threads: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remesh_neighbors: true,
            generation_threads: default_thread_count(),
            meshing_threads: default_thread_count(),
        }
    }
}

/// Lifecycle state of a loaded chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Generation job submitted, grid not filled yet.
    PendingGeneration,
    /// Grid ready; waiting for every present neighbor to settle.
    WaitingForNeighbors,
    /// A render job is in flight.
    Rendering,
    /// Rendered and quiescent.
    Idle,
    /// Generation failed. Never rendered, but counts as settled for
    /// neighbors.
    Failed,
}

/// Result of [`ChunkStore::unload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnloadOutcome {
    /// Nothing was loaded at the coordinate.
    NotLoaded,
    /// Links detached and the chunk released immediately.
    Released,
    /// A render is in flight; the chunk is released on the tick that drains it.
    Deferred,
}

/// Meshes produced for one chunk.
#[derive(Clone, Debug)]
pub struct RenderedChunk {
    /// Chunk the meshes belong to.
    pub coord: ChunkCoord,
    /// Usage-tagged meshes from the renderer.
    pub meshes: Vec<UsageMesh>,
}

/// Result of a single store tick.
#[derive(Debug, Default)]
pub struct StoreTickResult {
    /// Chunks whose generation completed this tick.
    pub generated: u32,
    /// Chunks whose generation failed this tick.
    pub failed: u32,
    /// Render jobs submitted this tick.
    pub renders_dispatched: u32,
    /// Meshes delivered this tick.
    pub rendered: Vec<RenderedChunk>,
    /// Chunks released this tick (immediately or after a deferred unload).
    pub released: Vec<ChunkCoord>,
}

/// Bookkeeping for one loaded chunk.
#[derive(Debug)]
struct Storable {
    serial: u64,
    grid: Arc<VoxelGrid>,
    state: ChunkState,
    /// Serial of the neighbor linked on each side.
    links: [Option<u64>; 4],
    rendering: bool,
    rerender: bool,
    rendered_once: bool,
}

type JobTag = (ChunkCoord, u64);
type GenerationPool = WorkerPool<JobTag, ChunkCoord, Result<VoxelGrid, GenerateError>>;
type RenderPool =
    WorkerPool<JobTag, (ChunkCoord, ChunkNeighborhood), Result<Vec<UsageMesh>, RenderError>>;

/// Owns loaded chunks and their neighbor links.
pub struct ChunkStore {
    config: StoreConfig,
    chunks: FxHashMap<ChunkCoord, Storable>,
    /// Unloaded entries waiting for their in-flight render, keyed by serial.
    parked: FxHashMap<u64, (ChunkCoord, Storable)>,
    released: Vec<ChunkCoord>,
    next_serial: u64,
    generation: Option<GenerationPool>,
    rendering: Option<RenderPool>,
    warned_no_generator: bool,
    warned_no_renderer: bool,
    closed: bool,
}

impl ChunkStore {
    /// Creates a store. Either collaborator may be absent: without a
    /// generator `load` does nothing, without a renderer chunks go straight
    /// to [`ChunkState::Idle`].
    pub fn new(
        config: StoreConfig,
        generator: Option<Arc<dyn VoxelGenerator>>,
        renderer: Option<Arc<dyn ChunkRenderer>>,
    ) -> Self {
        let generation = generator.map(|generator| {
            WorkerPool::new("chunk-gen", config.generation_threads, move |coord: ChunkCoord| {
                generator.generate(coord).map(GeneratedChunk::into_grid)
            })
        });
        let rendering = renderer.map(|renderer| {
            WorkerPool::new(
                "chunk-mesh",
                config.meshing_threads,
                move |(coord, hood): (ChunkCoord, ChunkNeighborhood)| renderer.render(coord, &hood),
            )
        });

        tracing::info!(
            generation_workers = generation.as_ref().map_or(0, WorkerPool::worker_count),
            meshing_workers = rendering.as_ref().map_or(0, WorkerPool::worker_count),
            remesh_neighbors = config.remesh_neighbors,
            "Chunk store created"
        );

        Self {
            config,
            chunks: FxHashMap::default(),
            parked: FxHashMap::default(),
            released: Vec::new(),
            next_serial: 0,
            generation,
            rendering,
            warned_no_generator: false,
            warned_no_renderer: false,
            closed: false,
        }
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Starts loading `coord`. Returns `true` if a new entry was created;
    /// loading an already-loaded coordinate does nothing.
    pub fn load(&mut self, coord: ChunkCoord) -> bool {
        if self.closed || self.chunks.contains_key(&coord) {
            return false;
        }
        let Some(pool) = &self.generation else {
            if !self.warned_no_generator {
                tracing::warn!("no voxel generator configured; chunk loads are ignored");
                self.warned_no_generator = true;
            }
            return false;
        };

        let serial = self.next_serial;
        self.next_serial += 1;
        self.chunks.insert(
            coord,
            Storable {
                serial,
                grid: Arc::new(VoxelGrid::new_pending()),
                state: ChunkState::PendingGeneration,
                links: [None; 4],
                rendering: false,
                rerender: false,
                rendered_once: false,
            },
        );
        if !pool.submit((coord, serial), coord) {
            tracing::warn!(chunk = %coord, "generation pool is closed; chunk stays pending");
        }
        tracing::debug!(chunk = %coord, serial, "chunk load started");
        true
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advances every chunk: applies finished generation, renders chunks
    /// whose neighbors have settled, collects finished meshes and completes
    /// deferred unloads.
    pub fn tick(&mut self) -> StoreTickResult {
        let mut result = StoreTickResult::default();
        self.drain_generation(&mut result);
        self.dispatch_waiters(&mut result);
        self.drain_renders(&mut result);
        result.released = std::mem::take(&mut self.released);
        result
    }

    fn drain_generation(&mut self, result: &mut StoreTickResult) {
        let finished = match &self.generation {
            Some(pool) => pool.drain_results(),
            None => return,
        };

        for ((coord, serial), outcome) in finished {
            let Some(entry) = self.chunks.get_mut(&coord).filter(|e| e.serial == serial) else {
                tracing::debug!(chunk = %coord, serial, "dropping generation result for unloaded chunk");
                continue;
            };
            match flatten(outcome) {
                Ok(grid) => {
                    Arc::make_mut(&mut entry.grid).copy_from(&grid);
                    entry.state = ChunkState::WaitingForNeighbors;
                    result.generated += 1;
                    tracing::debug!(chunk = %coord, "chunk generated");
                    self.link_neighbors(coord);
                    if self.config.remesh_neighbors {
                        self.remesh_neighbors_of(coord, &Side::ALL);
                    }
                }
                Err(reason) => {
                    tracing::error!(chunk = %coord, error = %reason, "chunk generation failed");
                    entry.state = ChunkState::Failed;
                    result.failed += 1;
                }
            }
        }
    }

    fn dispatch_waiters(&mut self, result: &mut StoreTickResult) {
        let mut waiting: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .filter(|(_, entry)| entry.state == ChunkState::WaitingForNeighbors)
            .map(|(coord, _)| *coord)
            .collect();
        waiting.sort();

        for coord in waiting {
            if self.neighbors_settled(coord) && self.request_render(coord) {
                result.renders_dispatched += 1;
            }
        }
    }

    fn drain_renders(&mut self, result: &mut StoreTickResult) {
        let finished = match &self.rendering {
            Some(pool) => pool.drain_results(),
            None => return,
        };

        let mut follow_ups = Vec::new();
        for ((coord, serial), outcome) in finished {
            if let Some(entry) = self.chunks.get_mut(&coord).filter(|e| e.serial == serial) {
                entry.rendering = false;
                entry.rendered_once = true;
                match flatten(outcome) {
                    Ok(meshes) => result.rendered.push(RenderedChunk { coord, meshes }),
                    Err(reason) => {
                        tracing::error!(chunk = %coord, error = %reason, "chunk render failed")
                    }
                }
                if entry.rerender {
                    follow_ups.push(coord);
                } else {
                    entry.state = ChunkState::Idle;
                }
            } else if let Some((parked_coord, entry)) = self.parked.remove(&serial) {
                tracing::debug!(chunk = %parked_coord, "in-flight render finished; releasing chunk");
                self.finalize(parked_coord, &entry);
            } else {
                tracing::debug!(chunk = %coord, serial, "dropping render result for released chunk");
            }
        }

        for coord in follow_ups {
            if !self.neighbors_settled(coord) {
                if let Some(entry) = self.chunks.get_mut(&coord) {
                    entry.rerender = false;
                    entry.state = ChunkState::WaitingForNeighbors;
                }
                continue;
            }
            if self.request_render(coord) {
                result.renders_dispatched += 1;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Linking and rendering
    // -----------------------------------------------------------------------

    fn link_neighbors(&mut self, coord: ChunkCoord) {
        let Some(serial) = self.chunks.get(&coord).map(|e| e.serial) else {
            return;
        };
        let mut links = [None; 4];
        for side in Side::ALL {
            if let Some(neighbor) = self.chunks.get_mut(&coord.neighbor(side)) {
                neighbor.links[side.opposite().index()] = Some(serial);
                links[side.index()] = Some(neighbor.serial);
            }
        }
        if let Some(entry) = self.chunks.get_mut(&coord) {
            entry.links = links;
        }
    }

    /// Every present neighbor is ready or failed.
    fn neighbors_settled(&self, coord: ChunkCoord) -> bool {
        Side::ALL.iter().all(|&side| match self.chunks.get(&coord.neighbor(side)) {
            None => true,
            Some(neighbor) => neighbor.grid.is_ready() || neighbor.state == ChunkState::Failed,
        })
    }

    /// Schedules a re-render of the neighbors on `sides` that have been
    /// rendered before. An idle neighbor goes back to waiting, so it is
    /// meshed only once its own neighbors have settled; a rendering one
    /// queues a follow-up.
    fn remesh_neighbors_of(&mut self, coord: ChunkCoord, sides: &[Side]) {
        for &side in sides {
            let Some(neighbor) = self.chunks.get_mut(&coord.neighbor(side)) else {
                continue;
            };
            if !neighbor.rendered_once {
                continue;
            }
            if neighbor.rendering {
                neighbor.rerender = true;
            } else if neighbor.state == ChunkState::Idle {
                neighbor.state = ChunkState::WaitingForNeighbors;
            }
        }
    }

    /// Owned render job input: the chunk's grid plus every linked, ready
    /// neighbor whose serial still matches the link.
    fn snapshot(&self, coord: ChunkCoord) -> Option<ChunkNeighborhood> {
        let entry = self.chunks.get(&coord)?;
        let mut hood = ChunkNeighborhood::new(Arc::clone(&entry.grid));
        for side in Side::ALL {
            let Some(link) = entry.links[side.index()] else {
                continue;
            };
            if let Some(neighbor) = self.chunks.get(&coord.neighbor(side))
                && neighbor.serial == link
                && neighbor.grid.is_ready()
            {
                hood.link(side, Arc::clone(&neighbor.grid));
            }
        }
        Some(hood)
    }

    /// Dispatches a render for `coord`, or queues a single follow-up when
    /// one is already in flight. Returns `true` if a job was submitted.
    fn request_render(&mut self, coord: ChunkCoord) -> bool {
        if self.rendering.is_none() {
            if !self.warned_no_renderer {
                tracing::warn!("no chunk renderer configured; chunks will not be meshed");
                self.warned_no_renderer = true;
            }
            if let Some(entry) = self.chunks.get_mut(&coord) {
                entry.state = ChunkState::Idle;
            }
            return false;
        }

        match self.chunks.get_mut(&coord) {
            None => return false,
            Some(entry) if entry.rendering => {
                entry.rerender = true;
                return false;
            }
            Some(_) => {}
        }

        let Some(hood) = self.snapshot(coord) else {
            return false;
        };
        let Some(entry) = self.chunks.get_mut(&coord) else {
            return false;
        };
        entry.rendering = true;
        entry.rerender = false;
        entry.state = ChunkState::Rendering;
        let serial = entry.serial;

        let submitted = self
            .rendering
            .as_ref()
            .is_some_and(|pool| pool.submit((coord, serial), (coord, hood)));
        if !submitted {
            tracing::warn!(chunk = %coord, "render pool is closed; chunk left unmeshed");
            entry.rendering = false;
            entry.state = ChunkState::Idle;
        }
        submitted
    }

    // -----------------------------------------------------------------------
    // Unloading
    // -----------------------------------------------------------------------

    /// Unloads `coord`, waiting for an in-flight render before releasing.
    pub fn unload(&mut self, coord: ChunkCoord) -> UnloadOutcome {
        let Some(entry) = self.chunks.remove(&coord) else {
            return UnloadOutcome::NotLoaded;
        };
        if entry.rendering {
            tracing::debug!(chunk = %coord, "chunk unload deferred until its render finishes");
            self.parked.insert(entry.serial, (coord, entry));
            UnloadOutcome::Deferred
        } else {
            self.finalize(coord, &entry);
            UnloadOutcome::Released
        }
    }

    /// Unloads `coord` without waiting. A late render result is discarded.
    /// Also completes a deferred unload for the coordinate. Returns `false`
    /// if nothing was loaded or unloading there.
    pub fn unload_now(&mut self, coord: ChunkCoord) -> bool {
        let mut released = false;
        if let Some(entry) = self.chunks.remove(&coord) {
            self.finalize(coord, &entry);
            released = true;
        }
        let parked: Vec<u64> = self
            .parked
            .iter()
            .filter(|(_, (c, _))| *c == coord)
            .map(|(serial, _)| *serial)
            .collect();
        for serial in parked {
            if let Some((c, entry)) = self.parked.remove(&serial) {
                self.finalize(c, &entry);
                released = true;
            }
        }
        released
    }

    /// Detaches every neighbor link that still points at `entry` and
    /// records the release.
    fn finalize(&mut self, coord: ChunkCoord, entry: &Storable) {
        for side in Side::ALL {
            let Some(link) = entry.links[side.index()] else {
                continue;
            };
            if let Some(neighbor) = self.chunks.get_mut(&coord.neighbor(side))
                && neighbor.serial == link
            {
                let back = &mut neighbor.links[side.opposite().index()];
                if *back == Some(entry.serial) {
                    *back = None;
                }
            }
        }
        tracing::debug!(chunk = %coord, serial = entry.serial, "chunk released");
        self.released.push(coord);
    }

    // -----------------------------------------------------------------------
    // Edits and queries
    // -----------------------------------------------------------------------

    /// Writes `voxel` at a world position and re-renders the chunk.
    /// Returns the voxel that was there before.
    pub fn edit(&mut self, position: Vec3, voxel: Voxel) -> Result<Voxel, EditError> {
        let Some((coord, [x, y, z])) = world_to_local(position) else {
            let height = position.y.floor();
            if position.is_finite() && !(0.0..CHUNK_HEIGHT as f32).contains(&height) {
                tracing::warn!(y = position.y, "can't edit outside the world's vertical range");
                return Err(EditError::OutOfHeight(position.y));
            }
            tracing::warn!(position = %position, "can't edit outside the world");
            return Err(EditError::OutOfWorld(position));
        };
        let grid = self.writable_grid(coord)?;
        let previous = grid.get(x, y, z);
        grid.set(x, y, z, voxel);

        self.request_render(coord);
        if self.config.remesh_neighbors {
            let last = CHUNK_RESOLUTION - 1;
            let mut touched = Vec::with_capacity(2);
            if x == 0 {
                touched.push(Side::NegX);
            } else if x == last {
                touched.push(Side::PosX);
            }
            if z == 0 {
                touched.push(Side::NegZ);
            } else if z == last {
                touched.push(Side::PosZ);
            }
            self.remesh_neighbors_of(coord, &touched);
        }
        Ok(previous)
    }

    /// Applies an arbitrary mutation to a loaded, generated chunk and
    /// re-renders it and its rendered neighbors.
    pub fn update_chunk(
        &mut self,
        coord: ChunkCoord,
        update: impl FnOnce(&mut VoxelGrid),
    ) -> Result<(), EditError> {
        update(self.writable_grid(coord)?);
        self.request_render(coord);
        if self.config.remesh_neighbors {
            self.remesh_neighbors_of(coord, &Side::ALL);
        }
        Ok(())
    }

    /// Copy-on-write access to a ready chunk's grid. A render snapshot that
    /// still holds the old grid keeps seeing the old contents.
    fn writable_grid(&mut self, coord: ChunkCoord) -> Result<&mut VoxelGrid, EditError> {
        let Some(entry) = self.chunks.get_mut(&coord) else {
            tracing::warn!(chunk = %coord, "can't edit a chunk that is not loaded");
            return Err(EditError::NotLoaded(coord));
        };
        if !entry.grid.is_ready() {
            tracing::warn!(chunk = %coord, "can't edit a chunk that has not been generated");
            return Err(EditError::NotReady(coord));
        }
        Ok(Arc::make_mut(&mut entry.grid))
    }

    /// Voxel at a world position. Air when the chunk is unloaded or still
    /// pending, or the position is out of height.
    pub fn query(&self, position: Vec3) -> Voxel {
        let Some((coord, [x, y, z])) = world_to_local(position) else {
            return Voxel::AIR;
        };
        match self.chunks.get(&coord) {
            Some(entry) if entry.grid.is_ready() => entry.grid.get(x, y, z),
            _ => Voxel::AIR,
        }
    }

    /// Lifecycle state of a live chunk.
    pub fn state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.chunks.get(&coord).map(|e| e.state)
    }

    /// Shared handle to a live chunk's grid.
    pub fn grid(&self, coord: ChunkCoord) -> Option<Arc<VoxelGrid>> {
        self.chunks.get(&coord).map(|e| Arc::clone(&e.grid))
    }

    /// `true` if `coord` is loaded (in any state).
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of live chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// `true` if no chunk is loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Live chunk coordinates, sorted.
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.chunks.keys().copied().collect();
        coords.sort();
        coords
    }

    /// `true` while a deferred unload of `coord` waits for its render.
    pub fn is_unloading(&self, coord: ChunkCoord) -> bool {
        self.parked.values().any(|(c, _)| *c == coord)
    }

    /// `true` if `coord` holds a link to its neighbor on `side`.
    pub fn is_linked(&self, coord: ChunkCoord, side: Side) -> bool {
        self.chunks
            .get(&coord)
            .is_some_and(|e| e.links[side.index()].is_some())
    }

    /// `true` when no chunk has outstanding work.
    pub fn is_idle(&self) -> bool {
        self.parked.is_empty()
            && self
                .chunks
                .values()
                .all(|e| matches!(e.state, ChunkState::Idle | ChunkState::Failed))
    }

    /// Releases every chunk without waiting and stops the worker pools.
    /// Returns the released coordinates.
    pub fn shutdown(&mut self) -> Vec<ChunkCoord> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;
        for coord in self.loaded_coords() {
            self.unload_now(coord);
        }
        let parked: Vec<u64> = self.parked.keys().copied().collect();
        for serial in parked {
            if let Some((coord, entry)) = self.parked.remove(&serial) {
                self.finalize(coord, &entry);
            }
        }
        if let Some(pool) = &mut self.generation {
            pool.shutdown();
        }
        if let Some(pool) = &mut self.rendering {
            pool.shutdown();
        }
        let released = std::mem::take(&mut self.released);
        tracing::info!(released = released.len(), "Chunk store shut down");
        released
    }
}

impl Drop for ChunkStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Collapses a worker outcome into one displayable error.
fn flatten<O, E: std::fmt::Display>(outcome: Result<Result<O, E>, TaskFailure>) -> Result<O, String> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(failure) => Err(failure.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use crossbeam_channel::{Receiver, bounded};
    use tessera_mesh::{FaceDirection, MesherConfig, VoxelMesher};
    use tessera_voxel::{CHUNK_RESOLUTION as R, VoxelTypeDef, VoxelTypeRegistry};

    use super::*;

    const SAND: Voxel = Voxel(1);

    fn flat_grid(height: usize) -> VoxelGrid {
        let mut grid = VoxelGrid::new_pending();
        for x in 0..R {
            for z in 0..R {
                for y in 0..height {
                    grid.set(x, y, z, SAND);
                }
            }
        }
        grid
    }

    struct TestGenerator {
        height: usize,
        fail_x: Option<i32>,
        calls: AtomicUsize,
    }

    impl TestGenerator {
        fn flat(height: usize) -> Arc<Self> {
            Arc::new(Self {
                height,
                fail_x: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl VoxelGenerator for TestGenerator {
        fn generate(&self, coord: ChunkCoord) -> Result<GeneratedChunk, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_x == Some(coord.x) {
                return Err(GenerateError::Failed {
                    coord,
                    reason: "test failure".to_string(),
                });
            }
            Ok(GeneratedChunk::new(flat_grid(self.height)))
        }
    }

    /// Records each render call: coordinate, solid cells in the center and
    /// which sides carried a neighbor.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<(ChunkCoord, usize, [bool; 4])>>,
    }

    impl RecordingRenderer {
        fn calls(&self) -> Vec<(ChunkCoord, usize, [bool; 4])> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ChunkRenderer for RecordingRenderer {
        fn render(&self, coord: ChunkCoord, hood: &ChunkNeighborhood) -> Result<Vec<UsageMesh>, RenderError> {
            let linked = Side::ALL.map(|side| hood.is_linked(side));
            self.calls
                .lock()
                .unwrap()
                .push((coord, hood.center().solid_count(), linked));
            Ok(Vec::new())
        }
    }

    fn inline_config() -> StoreConfig {
        StoreConfig {
            remesh_neighbors: true,
            generation_threads: 0,
            meshing_threads: 0,
        }
    }

    fn recording_store(config: StoreConfig) -> (ChunkStore, Arc<TestGenerator>, Arc<RecordingRenderer>) {
        let generator = TestGenerator::flat(8);
        let renderer = Arc::new(RecordingRenderer::default());
        let store = ChunkStore::new(
            config,
            Some(generator.clone() as Arc<dyn VoxelGenerator>),
            Some(renderer.clone() as Arc<dyn ChunkRenderer>),
        );
        (store, generator, renderer)
    }

    fn mesher() -> Arc<VoxelMesher> {
        let registry = VoxelTypeRegistry::from_defs([VoxelTypeDef {
            name: "sand".to_string(),
            material: 0,
            group: 0,
            color: [0.9, 0.8, 0.5, 1.0],
        }])
        .unwrap();
        Arc::new(VoxelMesher::new(Arc::new(registry), MesherConfig::default()))
    }

    fn rendered_coords(result: &StoreTickResult) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = result.rendered.iter().map(|r| r.coord).collect();
        coords.sort();
        coords
    }

    const ORIGIN: ChunkCoord = ChunkCoord::new(0, 0);
    const EAST: ChunkCoord = ChunkCoord::new(1, 0);

    #[test]
    fn test_load_is_idempotent() {
        let (mut store, generator, _) = recording_store(inline_config());
        assert!(store.load(ORIGIN));
        assert!(!store.load(ORIGIN));
        assert_eq!(store.len(), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_single_flat_chunk_renders() {
        let mut store = ChunkStore::new(
            inline_config(),
            Some(TestGenerator::flat(8) as Arc<dyn VoxelGenerator>),
            Some(mesher() as Arc<dyn ChunkRenderer>),
        );
        store.load(ORIGIN);
        assert_eq!(store.state(ORIGIN), Some(ChunkState::PendingGeneration));

        let result = store.tick();
        assert_eq!(result.generated, 1);
        assert_eq!(result.rendered.len(), 1);
        let mesh = &result.rendered[0].meshes[0].mesh;
        assert_eq!(mesh.count_quads_for_direction(FaceDirection::PosY), R * R);
        assert_eq!(mesh.count_quads_for_direction(FaceDirection::NegY), R * R);
        assert_eq!(mesh.count_quads_for_direction(FaceDirection::PosX), 8 * R);
        assert_eq!(store.state(ORIGIN), Some(ChunkState::Idle));
        assert!(store.is_idle());
    }

    #[test]
    fn test_adjacent_chunks_link_and_hide_seam() {
        let mut store = ChunkStore::new(
            inline_config(),
            Some(TestGenerator::flat(8) as Arc<dyn VoxelGenerator>),
            Some(mesher() as Arc<dyn ChunkRenderer>),
        );
        store.load(ORIGIN);
        store.load(EAST);
        let result = store.tick();
        assert_eq!(rendered_coords(&result), vec![ORIGIN, EAST]);
        assert!(store.is_linked(ORIGIN, Side::PosX));
        assert!(store.is_linked(EAST, Side::NegX));

        let west_mesh = &result.rendered.iter().find(|r| r.coord == ORIGIN).unwrap().meshes[0].mesh;
        assert_eq!(west_mesh.count_quads_for_direction(FaceDirection::PosX), 0);
        assert_eq!(west_mesh.count_quads_for_direction(FaceDirection::NegX), 8 * R);

        let east_mesh = &result.rendered.iter().find(|r| r.coord == EAST).unwrap().meshes[0].mesh;
        assert_eq!(east_mesh.count_quads_for_direction(FaceDirection::NegX), 0);
        assert_eq!(east_mesh.count_quads_for_direction(FaceDirection::PosX), 8 * R);
    }

    /// Holds back generation of the chunk at `x == gated_x` until released.
    struct GatedGenerator {
        gated_x: i32,
        gate: Receiver<()>,
    }

    impl VoxelGenerator for GatedGenerator {
        fn generate(&self, coord: ChunkCoord) -> Result<GeneratedChunk, GenerateError> {
            if coord.x == self.gated_x {
                let _ = self.gate.recv();
            }
            Ok(GeneratedChunk::new(flat_grid(4)))
        }
    }

    #[test]
    fn test_render_waits_for_pending_neighbor() {
        let (gate_tx, gate_rx) = bounded(1);
        let renderer = Arc::new(RecordingRenderer::default());
        let mut store = ChunkStore::new(
            StoreConfig {
                generation_threads: 2,
                ..inline_config()
            },
            Some(Arc::new(GatedGenerator {
                gated_x: 1,
                gate: gate_rx,
            }) as Arc<dyn VoxelGenerator>),
            Some(renderer.clone() as Arc<dyn ChunkRenderer>),
        );
        store.load(ORIGIN);
        store.load(EAST);

        let start = Instant::now();
        while store.state(ORIGIN) != Some(ChunkState::WaitingForNeighbors) {
            store.tick();
            assert!(start.elapsed().as_secs() < 5, "Timed out waiting for generation");
            std::thread::sleep(Duration::from_millis(1));
        }
        store.tick();
        assert!(renderer.calls().is_empty());
        assert_eq!(store.state(EAST), Some(ChunkState::PendingGeneration));

        gate_tx.send(()).unwrap();
        while !store.is_idle() {
            store.tick();
            assert!(start.elapsed().as_secs() < 5, "Timed out waiting for renders");
            std::thread::sleep(Duration::from_millis(1));
        }
        let calls = renderer.calls();
        let origin_call = calls.iter().find(|(c, _, _)| *c == ORIGIN).unwrap();
        assert!(origin_call.2[Side::PosX.index()]);
    }

    #[test]
    fn test_neighbor_remesh_waits_for_pending_neighbor() {
        const WEST: ChunkCoord = ChunkCoord::new(-1, 0);
        let (gate_tx, gate_rx) = bounded(1);
        let renderer = Arc::new(RecordingRenderer::default());
        let mut store = ChunkStore::new(
            StoreConfig {
                generation_threads: 2,
                ..inline_config()
            },
            Some(Arc::new(GatedGenerator {
                gated_x: -1,
                gate: gate_rx,
            }) as Arc<dyn VoxelGenerator>),
            Some(renderer.clone() as Arc<dyn ChunkRenderer>),
        );
        let origin_renders = |renderer: &RecordingRenderer| {
            renderer.calls().iter().filter(|(c, _, _)| *c == ORIGIN).count()
        };

        let start = Instant::now();
        store.load(ORIGIN);
        while store.state(ORIGIN) != Some(ChunkState::Idle) {
            store.tick();
            assert!(start.elapsed().as_secs() < 5, "Timed out waiting for the first render");
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(origin_renders(&renderer), 1);

        store.load(WEST);
        store.load(EAST);
        while store.state(EAST) != Some(ChunkState::Idle) {
            store.tick();
            assert!(start.elapsed().as_secs() < 5, "Timed out waiting for the east chunk");
            std::thread::sleep(Duration::from_millis(1));
        }
        store.tick();
        assert_eq!(store.state(WEST), Some(ChunkState::PendingGeneration));
        assert_eq!(store.state(ORIGIN), Some(ChunkState::WaitingForNeighbors));
        assert_eq!(origin_renders(&renderer), 1);

        gate_tx.send(()).unwrap();
        while !store.is_idle() {
            store.tick();
            assert!(start.elapsed().as_secs() < 5, "Timed out waiting for the remesh");
            std::thread::sleep(Duration::from_millis(1));
        }
        let calls = renderer.calls();
        let last_origin = calls.iter().rev().find(|(c, _, _)| *c == ORIGIN).unwrap();
        assert_eq!(origin_renders(&renderer), 2);
        assert!(last_origin.2[Side::NegX.index()]);
        assert!(last_origin.2[Side::PosX.index()]);
    }

    #[test]
    fn test_failed_neighbor_counts_as_settled() {
        let generator = Arc::new(TestGenerator {
            height: 8,
            fail_x: Some(1),
            calls: AtomicUsize::new(0),
        });
        let renderer = Arc::new(RecordingRenderer::default());
        let mut store = ChunkStore::new(
            inline_config(),
            Some(generator as Arc<dyn VoxelGenerator>),
            Some(renderer.clone() as Arc<dyn ChunkRenderer>),
        );
        store.load(ORIGIN);
        store.load(EAST);
        let result = store.tick();
        assert_eq!(result.generated, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(store.state(EAST), Some(ChunkState::Failed));
        assert_eq!(rendered_coords(&result), vec![ORIGIN]);
        // The failed grid never became ready, so it is not in the snapshot.
        assert_eq!(renderer.calls()[0].2, [false; 4]);
    }

    #[test]
    fn test_unload_not_loaded_is_noop() {
        let (mut store, _, _) = recording_store(inline_config());
        assert_eq!(store.unload(ORIGIN), UnloadOutcome::NotLoaded);
        assert!(!store.unload_now(ORIGIN));
        assert!(store.tick().released.is_empty());
    }

    #[test]
    fn test_unload_detaches_links() {
        let (mut store, _, _) = recording_store(inline_config());
        store.load(ORIGIN);
        store.load(EAST);
        store.tick();
        assert!(store.is_linked(ORIGIN, Side::PosX));

        assert_eq!(store.unload(EAST), UnloadOutcome::Released);
        assert!(!store.is_linked(ORIGIN, Side::PosX));
        assert!(!store.contains(EAST));
        assert_eq!(store.tick().released, vec![EAST]);
    }

    #[test]
    fn test_unload_deferred_while_rendering() {
        let (mut store, _, renderer) = recording_store(inline_config());
        store.load(ORIGIN);
        store.tick();
        store.edit(Vec3::new(3.5, 7.5, 3.5), Voxel::AIR).unwrap();
        assert_eq!(store.state(ORIGIN), Some(ChunkState::Rendering));

        assert_eq!(store.unload(ORIGIN), UnloadOutcome::Deferred);
        assert!(store.is_unloading(ORIGIN));
        assert!(!store.contains(ORIGIN));

        let result = store.tick();
        assert!(result.rendered.is_empty());
        assert_eq!(result.released, vec![ORIGIN]);
        assert!(!store.is_unloading(ORIGIN));
        assert_eq!(renderer.calls().len(), 2);
    }

    #[test]
    fn test_stale_generation_result_is_dropped() {
        let (mut store, generator, renderer) = recording_store(inline_config());
        store.load(ORIGIN);
        assert_eq!(store.unload(ORIGIN), UnloadOutcome::Released);
        store.load(ORIGIN);

        let result = store.tick();
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.generated, 1);
        assert_eq!(result.released, vec![ORIGIN]);
        assert_eq!(renderer.calls().len(), 1);
    }

    #[test]
    fn test_edit_rejects_unloaded_and_out_of_height() {
        let (mut store, _, _) = recording_store(inline_config());
        assert_eq!(
            store.edit(Vec3::new(1.0, 1.0, 1.0), SAND),
            Err(EditError::NotLoaded(ORIGIN))
        );
        store.load(ORIGIN);
        store.tick();
        assert_eq!(
            store.edit(Vec3::new(1.0, -1.0, 1.0), SAND),
            Err(EditError::OutOfHeight(-1.0))
        );
        assert_eq!(
            store.edit(Vec3::new(1.0, 300.0, 1.0), SAND),
            Err(EditError::OutOfHeight(300.0))
        );
        assert!(matches!(
            store.edit(Vec3::NAN, Voxel::AIR),
            Err(EditError::OutOfWorld(_))
        ));
        let far = Vec3::new(1.0e10, 1.0, 0.0);
        assert_eq!(store.edit(far, Voxel::AIR), Err(EditError::OutOfWorld(far)));
        assert_eq!(store.query(ORIGIN_CELL), SAND);
    }

    const ORIGIN_CELL: Vec3 = Vec3::new(0.5, 0.5, 0.5);

    #[test]
    fn test_query_far_or_non_finite_is_air() {
        let (mut store, _, _) = recording_store(inline_config());
        store.load(ORIGIN);
        store.tick();
        assert_eq!(store.query(Vec3::new(1.0e10, 1.0, 0.0)), Voxel::AIR);
        assert_eq!(store.query(Vec3::new(-1.0e30, 1.0, 1.0e30)), Voxel::AIR);
        assert_eq!(store.query(Vec3::NAN), Voxel::AIR);
        assert_eq!(store.query(ORIGIN_CELL), SAND);
    }

    #[test]
    fn test_edit_returns_previous_and_rerenders() {
        let (mut store, _, renderer) = recording_store(inline_config());
        store.load(ORIGIN);
        store.tick();

        let position = Vec3::new(3.5, 7.5, 3.5);
        assert_eq!(store.edit(position, Voxel::AIR), Ok(SAND));
        assert_eq!(store.query(position), Voxel::AIR);

        let result = store.tick();
        assert_eq!(rendered_coords(&result), vec![ORIGIN]);
        let calls = renderer.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, calls[0].1 - 1);
    }

    #[test]
    fn test_edit_while_rendering_queues_one_followup() {
        let (mut store, _, renderer) = recording_store(inline_config());
        store.load(ORIGIN);
        store.tick();

        store.edit(Vec3::new(1.5, 7.5, 1.5), Voxel::AIR).unwrap();
        store.edit(Vec3::new(2.5, 7.5, 2.5), Voxel::AIR).unwrap();
        store.edit(Vec3::new(3.5, 7.5, 3.5), Voxel::AIR).unwrap();
        assert_eq!(renderer.calls().len(), 2);

        let result = store.tick();
        assert_eq!(result.renders_dispatched, 1);
        assert_eq!(store.state(ORIGIN), Some(ChunkState::Rendering));
        store.tick();
        assert_eq!(store.state(ORIGIN), Some(ChunkState::Idle));

        let calls = renderer.calls();
        assert_eq!(calls.len(), 3);
        // The follow-up saw all three edits.
        assert_eq!(calls[2].1, calls[0].1 - 3);
    }

    #[test]
    fn test_edit_copies_on_write_when_snapshot_shared() {
        let (mut store, _, _) = recording_store(inline_config());
        store.load(ORIGIN);
        store.tick();
        let held = store.grid(ORIGIN).unwrap();
        store.edit(Vec3::new(0.5, 0.5, 0.5), Voxel::AIR).unwrap();
        assert_eq!(held.get(0, 0, 0), SAND);
        assert_eq!(store.grid(ORIGIN).unwrap().get(0, 0, 0), Voxel::AIR);
    }

    #[test]
    fn test_border_edit_remeshes_neighbor() {
        let (mut store, _, _) = recording_store(inline_config());
        store.load(ORIGIN);
        store.load(EAST);
        store.tick();

        store.edit(Vec3::new(15.5, 7.5, 4.5), Voxel::AIR).unwrap();
        assert_eq!(rendered_coords(&store.tick()), vec![ORIGIN, EAST]);

        store.edit(Vec3::new(7.5, 7.5, 4.5), Voxel::AIR).unwrap();
        assert_eq!(rendered_coords(&store.tick()), vec![ORIGIN]);
    }

    #[test]
    fn test_border_edit_without_remesh_renders_once() {
        let (mut store, _, _) = recording_store(StoreConfig {
            remesh_neighbors: false,
            ..inline_config()
        });
        store.load(ORIGIN);
        store.load(EAST);
        store.tick();
        store.edit(Vec3::new(15.5, 7.5, 4.5), Voxel::AIR).unwrap();
        assert_eq!(rendered_coords(&store.tick()), vec![ORIGIN]);
    }

    #[test]
    fn test_late_neighbor_remeshes_rendered_chunk() {
        let (mut store, _, renderer) = recording_store(inline_config());
        store.load(ORIGIN);
        store.tick();
        store.load(EAST);
        let result = store.tick();
        assert_eq!(rendered_coords(&result), vec![ORIGIN, EAST]);
        let calls = renderer.calls();
        let last_origin = calls.iter().rev().find(|(c, _, _)| *c == ORIGIN).unwrap();
        assert!(last_origin.2[Side::PosX.index()]);
    }

    #[test]
    fn test_update_chunk_applies_mutation() {
        let (mut store, _, _) = recording_store(inline_config());
        assert_eq!(
            store.update_chunk(ORIGIN, |_| {}),
            Err(EditError::NotLoaded(ORIGIN))
        );
        store.load(ORIGIN);
        store.tick();
        store
            .update_chunk(ORIGIN, |grid| grid.set(4, 20, 4, SAND))
            .unwrap();
        assert_eq!(store.query(Vec3::new(4.0, 20.0, 4.0)), SAND);
        assert_eq!(store.tick().rendered.len(), 1);
    }

    #[test]
    fn test_query_unloaded_or_pending_is_air() {
        let (mut store, _, _) = recording_store(inline_config());
        let position = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(store.query(position), Voxel::AIR);
        store.load(ORIGIN);
        assert_eq!(store.query(position), Voxel::AIR);
        store.tick();
        assert_eq!(store.query(position), SAND);
    }

    #[test]
    fn test_missing_generator_ignores_loads() {
        let mut store = ChunkStore::new(inline_config(), None, None);
        assert!(!store.load(ORIGIN));
        assert!(!store.load(EAST));
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_renderer_goes_idle() {
        let mut store = ChunkStore::new(
            inline_config(),
            Some(TestGenerator::flat(8) as Arc<dyn VoxelGenerator>),
            None,
        );
        store.load(ORIGIN);
        let result = store.tick();
        assert_eq!(result.generated, 1);
        assert!(result.rendered.is_empty());
        assert_eq!(store.state(ORIGIN), Some(ChunkState::Idle));
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (mut store, _, _) = recording_store(inline_config());
        store.load(ORIGIN);
        store.load(EAST);
        store.tick();
        store.edit(Vec3::new(1.5, 1.5, 1.5), Voxel::AIR).unwrap();
        store.unload(ORIGIN);

        let mut released = store.shutdown();
        released.sort();
        assert_eq!(released, vec![ORIGIN, EAST]);
        assert!(store.is_empty());
        assert!(!store.load(ORIGIN));
    }
}
