//! Cross-chunk cell lookups.
//!
//! [`ChunkNeighborhood`] pairs a chunk's grid with shared handles to its
//! horizontal neighbors, so a mesher can read one cell past each X/Z edge.
//! It is an owned snapshot: worker threads can hold it without touching the
//! store. Vertical overflow and anything further than one cell out reads as
//! air.

use std::sync::Arc;

use crate::grid::VoxelGrid;
use crate::voxel::{CHUNK_HEIGHT, CHUNK_RESOLUTION, Side, Voxel};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Where a signed cell coordinate falls relative to a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellClass {
    /// Inside the chunk.
    Inner,
    /// In the one-cell ring around the chunk; carries the neighbor side and
    /// the wrapped local index inside that neighbor.
    Outer(Side, [usize; 3]),
    /// Anywhere else.
    OutOfRange,
}

/// `true` if `(x, y, z)` lies inside the chunk.
#[inline]
pub fn within_bounds(x: i32, y: i32, z: i32) -> bool {
    let r = CHUNK_RESOLUTION as i32;
    (0..r).contains(&x) && (0..r).contains(&z) && (0..CHUNK_HEIGHT as i32).contains(&y)
}

/// `true` if `(x, y, z)` lies in the one-cell ring just past an X or Z edge.
///
/// Exactly one of `x`/`z` must be `-1` or `R`; the other must be inside the
/// chunk. Diagonal corners of the ring are excluded.
#[inline]
pub fn within_outer_buffer(x: i32, y: i32, z: i32) -> bool {
    if !(0..CHUNK_HEIGHT as i32).contains(&y) {
        return false;
    }
    let r = CHUNK_RESOLUTION as i32;
    let x_in = (0..r).contains(&x);
    let z_in = (0..r).contains(&z);
    let x_edge = x == -1 || x == r;
    let z_edge = z == -1 || z == r;
    (x_edge && z_in) || (z_edge && x_in)
}

/// Classifies a signed cell coordinate.
pub fn classify(x: i32, y: i32, z: i32) -> CellClass {
    if within_bounds(x, y, z) {
        return CellClass::Inner;
    }
    if !within_outer_buffer(x, y, z) {
        return CellClass::OutOfRange;
    }
    let r = CHUNK_RESOLUTION as i32;
    let (side, wx, wz) = if x == r {
        (Side::PosX, 0, z)
    } else if x == -1 {
        (Side::NegX, r - 1, z)
    } else if z == r {
        (Side::PosZ, x, 0)
    } else {
        (Side::NegZ, x, r - 1)
    };
    CellClass::Outer(side, [wx as usize, y as usize, wz as usize])
}

// ---------------------------------------------------------------------------
// Neighborhood
// ---------------------------------------------------------------------------

/// A chunk grid together with up to four linked horizontal neighbors.
#[derive(Clone, Debug)]
pub struct ChunkNeighborhood {
    center: Arc<VoxelGrid>,
    neighbors: [Option<Arc<VoxelGrid>>; 4],
}

impl ChunkNeighborhood {
    /// Creates a neighborhood with no neighbor links.
    pub fn new(center: Arc<VoxelGrid>) -> Self {
        Self {
            center,
            neighbors: [None, None, None, None],
        }
    }

    /// Convenience constructor that takes ownership of a bare grid.
    pub fn from_center_only(center: VoxelGrid) -> Self {
        Self::new(Arc::new(center))
    }

    /// Links the neighbor on `side`, replacing any previous link.
    pub fn link(&mut self, side: Side, neighbor: Arc<VoxelGrid>) {
        self.neighbors[side.index()] = Some(neighbor);
    }

    /// Builder form of [`link`](Self::link).
    pub fn with_neighbor(mut self, side: Side, neighbor: Arc<VoxelGrid>) -> Self {
        self.link(side, neighbor);
        self
    }

    /// Drops the link on `side`.
    pub fn unlink(&mut self, side: Side) {
        self.neighbors[side.index()] = None;
    }

    /// The chunk's own grid.
    pub fn center(&self) -> &VoxelGrid {
        &self.center
    }

    /// The linked neighbor on `side`, if any.
    pub fn neighbor(&self, side: Side) -> Option<&VoxelGrid> {
        self.neighbors[side.index()].as_deref()
    }

    /// `true` if a neighbor is linked on `side`.
    pub fn is_linked(&self, side: Side) -> bool {
        self.neighbors[side.index()].is_some()
    }

    /// Reads a local cell of the center grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Voxel {
        self.center.get(x, y, z)
    }

    /// Reads a local cell of the neighbor on `side`; air when the link is
    /// absent or the neighbor has not been filled yet.
    #[inline]
    pub fn get_side(&self, x: usize, y: usize, z: usize, side: Side) -> Voxel {
        match self.neighbor(side) {
            Some(grid) if grid.is_ready() => grid.get(x, y, z),
            _ => Voxel::AIR,
        }
    }

    /// Reads any signed coordinate: inner cells from the center, ring cells
    /// through the neighbor, everything else as air.
    #[inline]
    pub fn resolve(&self, x: i32, y: i32, z: i32) -> Voxel {
        match classify(x, y, z) {
            CellClass::Inner => self.get(x as usize, y as usize, z as usize),
            CellClass::Outer(side, [lx, ly, lz]) => self.get_side(lx, ly, lz, side),
            CellClass::OutOfRange => Voxel::AIR,
        }
    }
}
