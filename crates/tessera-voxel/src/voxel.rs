//! Voxel cells, chunk dimensions, and chunk-space coordinates.
//!
//! A world is a sparse horizontal grid of chunks. Every chunk spans
//! [`CHUNK_RESOLUTION`] cells along X and Z and [`CHUNK_HEIGHT`] cells along Y;
//! chunks are never stacked vertically, so [`ChunkCoord::y`] is always 0.

use std::fmt;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Side length of a chunk along X and Z.
pub const CHUNK_RESOLUTION: usize = 16;

/// Height of a chunk along Y.
pub const CHUNK_HEIGHT: usize = 256;

/// Total number of cells in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_RESOLUTION * CHUNK_HEIGHT * CHUNK_RESOLUTION;

/// Largest chunk index on X or Z whose world origin still fits in an `i32`.
pub const MAX_CHUNK_INDEX: i32 = i32::MAX / CHUNK_RESOLUTION as i32;

/// A single cell value. Id 0 is air; every other id names a solid voxel type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Voxel(pub u8);

impl Voxel {
    /// Empty space.
    pub const AIR: Voxel = Voxel(0);

    /// Returns `true` for id 0.
    #[inline]
    pub fn is_air(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` for any non-air id.
    #[inline]
    pub fn is_solid(self) -> bool {
        self.0 != 0
    }

    /// Raw id.
    #[inline]
    pub fn id(self) -> u8 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Horizontal sides
// ---------------------------------------------------------------------------

/// One of the four horizontal sides a chunk can have a neighbor on.
///
/// The discriminant is the neighbor slot index used by neighborhoods and
/// link masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// +X ("right").
    PosX = 0,
    /// −X ("left").
    NegX = 1,
    /// +Z ("front").
    PosZ = 2,
    /// −Z ("back").
    NegZ = 3,
}

impl Side {
    /// All four sides in slot order.
    pub const ALL: [Side; 4] = [Self::PosX, Self::NegX, Self::PosZ, Self::NegZ];

    /// Chunk-grid offset `(dx, dz)` towards this side.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::PosX => (1, 0),
            Self::NegX => (-1, 0),
            Self::PosZ => (0, 1),
            Self::NegZ => (0, -1),
        }
    }

    /// The side facing back at this one from the neighbor.
    pub fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// Slot index (0–3).
    pub fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Chunk coordinates
// ---------------------------------------------------------------------------

/// Integer position of a chunk on the chunk grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk-grid X.
    pub x: i32,
    /// Always 0.
    pub y: i32,
    /// Chunk-grid Z.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a coordinate on the horizontal chunk plane.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, y: 0, z }
    }

    /// Chunk containing the given world position (`floor(pos / R)` on X and Z),
    /// clamped to `±MAX_CHUNK_INDEX`. NaN maps to chunk 0.
    pub fn from_world(position: Vec3) -> Self {
        let r = CHUNK_RESOLUTION as f32;
        let index = |v: f32| ((v / r).floor() as i32).clamp(-MAX_CHUNK_INDEX, MAX_CHUNK_INDEX);
        Self::new(index(position.x), index(position.z))
    }

    /// Coordinate shifted by `(dx, dz)` chunks.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
            z: self.z + dz,
        }
    }

    /// Adjacent chunk on `side`.
    pub fn neighbor(self, side: Side) -> Self {
        let (dx, dz) = side.offset();
        self.offset(dx, dz)
    }

    /// World-space position of the chunk's minimum corner. Saturates for
    /// coordinates beyond [`MAX_CHUNK_INDEX`].
    pub fn origin(self) -> IVec3 {
        IVec3::new(
            self.x.saturating_mul(CHUNK_RESOLUTION as i32),
            self.y.saturating_mul(CHUNK_HEIGHT as i32),
            self.z.saturating_mul(CHUNK_RESOLUTION as i32),
        )
    }

    /// World-space center of the chunk's footprint on the XZ plane.
    pub fn center_xz(self) -> (f32, f32) {
        let r = CHUNK_RESOLUTION as f32;
        (self.x as f32 * r + r / 2.0, self.z as f32 * r + r / 2.0)
    }

    /// Euclidean distance between two chunk coordinates, in chunks.
    pub fn distance(self, other: ChunkCoord) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.x, self.y, self.z)
    }
}

/// Splits a world position into its chunk and the cell index inside it.
///
/// Returns `None` when the Y coordinate falls outside `[0, CHUNK_HEIGHT)`,
/// when any component is not finite, or when X or Z lies beyond the chunk
/// at [`MAX_CHUNK_INDEX`].
pub fn world_to_local(position: Vec3) -> Option<(ChunkCoord, [usize; 3])> {
    if !position.is_finite() {
        return None;
    }
    let y = position.y.floor();
    if y < 0.0 || y >= CHUNK_HEIGHT as f32 {
        return None;
    }
    let coord = ChunkCoord::from_world(position);
    let origin = coord.origin();
    let x = position.x.floor() as i64 - i64::from(origin.x);
    let z = position.z.floor() as i64 - i64::from(origin.z);
    let r = CHUNK_RESOLUTION as i64;
    // Float rounding right below a chunk boundary can land on `R`, and a
    // clamped coordinate leaves the offset far outside the chunk.
    if !(0..r).contains(&x) || !(0..r).contains(&z) {
        return None;
    }
    Some((coord, [x as usize, y as usize, z as usize]))
}
