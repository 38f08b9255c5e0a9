//! Error types for the chunk lifecycle.

use glam::Vec3;
use tessera_voxel::ChunkCoord;
use thiserror::Error;

/// A background task that died instead of returning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure {
    /// The task panicked; carries the panic message.
    #[error("worker task panicked: {0}")]
    Panicked(String),
}

/// Failure reported by a [`VoxelGenerator`](crate::VoxelGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The generator could not produce the chunk.
    #[error("failed to generate chunk {coord}: {reason}")]
    Failed {
        /// Chunk that was requested.
        coord: ChunkCoord,
        /// Generator-provided detail.
        reason: String,
    },
}

/// Failure reported by a [`ChunkRenderer`](crate::ChunkRenderer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The renderer could not mesh the chunk.
    #[error("failed to render chunk {coord}: {reason}")]
    Failed {
        /// Chunk that was being meshed.
        coord: ChunkCoord,
        /// Renderer-provided detail.
        reason: String,
    },
}

/// Why an edit was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    /// No chunk is loaded at the target coordinate.
    #[error("can't edit chunk {0}: it is not loaded")]
    NotLoaded(ChunkCoord),
    /// The chunk exists but has not finished generating.
    #[error("can't edit chunk {0}: it has not been generated yet")]
    NotReady(ChunkCoord),
    /// The position lies above or below the world's height range.
    #[error("can't edit at height {0}: outside the world's vertical range")]
    OutOfHeight(f32),
    /// The position is not finite or lies beyond the outermost chunk.
    #[error("can't edit at {0}: outside the world")]
    OutOfWorld(Vec3),
}
