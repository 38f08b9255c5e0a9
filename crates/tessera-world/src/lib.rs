//! Chunk lifecycle for the voxel world: background generation and meshing,
//! neighbor linking, edits, and observer-driven streaming.

mod error;
mod generator;
mod pool;
mod renderer;
mod store;
mod streaming;

pub use error::{EditError, GenerateError, RenderError, TaskFailure};
pub use generator::{GeneratedChunk, VoxelGenerator};
pub use pool::{TaskResult, WorkerPool};
pub use renderer::ChunkRenderer;
pub use store::{
    ChunkState, ChunkStore, RenderedChunk, StoreConfig, StoreTickResult, UnloadOutcome,
    default_thread_count,
};
pub use streaming::{StreamingConfig, StreamingController, StreamingTickResult, ring_offsets};
