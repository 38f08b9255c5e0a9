//! Multi-voxel structures (trees, rocks) stamped into generated chunks.

use glam::IVec3;

use crate::grid::VoxelGrid;
use crate::voxel::{CHUNK_HEIGHT, CHUNK_RESOLUTION, Voxel};

/// One cell of a structure, relative to the structure's origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureVoxel {
    /// Offset from the placement origin.
    pub offset: IVec3,
    /// Solid id written at that offset.
    pub voxel: Voxel,
}

/// A named set of solid voxels with unique offsets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Structure {
    /// Human-readable name.
    pub name: String,
    voxels: Vec<StructureVoxel>,
}

impl Structure {
    /// Creates an empty structure.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            voxels: Vec::new(),
        }
    }

    /// Adds a voxel at `offset`.
    ///
    /// Structures never contain air: an air id is stored as `Voxel(1)`.
    /// Returns `false` and leaves the structure unchanged if the offset is
    /// already occupied.
    pub fn add(&mut self, offset: IVec3, voxel: Voxel) -> bool {
        if self.voxels.iter().any(|v| v.offset == offset) {
            return false;
        }
        let voxel = if voxel.is_air() { Voxel(1) } else { voxel };
        self.voxels.push(StructureVoxel { offset, voxel });
        true
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, offset: IVec3, voxel: Voxel) -> Self {
        self.add(offset, voxel);
        self
    }

    /// Removes the voxel at `offset`. Returns `true` if one was present.
    pub fn remove(&mut self, offset: IVec3) -> bool {
        let before = self.voxels.len();
        self.voxels.retain(|v| v.offset != offset);
        self.voxels.len() != before
    }

    /// Cells of the structure.
    pub fn voxels(&self) -> &[StructureVoxel] {
        &self.voxels
    }

    /// Placements of this structure with its origin at the local cell `origin`.
    pub fn placements_at(&self, origin: IVec3) -> impl Iterator<Item = Placement> + '_ {
        self.voxels.iter().map(move |v| Placement {
            local: origin + v.offset,
            voxel: v.voxel,
        })
    }
}

/// A voxel a generator wants written into its chunk at a local index.
///
/// The index may lie outside the chunk; such placements are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Cell index relative to the chunk's origin.
    pub local: IVec3,
    /// Id to write.
    pub voxel: Voxel,
}

/// Writes placements into `grid`, only onto air cells inside the chunk.
///
/// Returns the number of cells written.
pub fn apply_placements(grid: &mut VoxelGrid, placements: &[Placement]) -> usize {
    let r = CHUNK_RESOLUTION as i32;
    let h = CHUNK_HEIGHT as i32;
    let mut written = 0;
    for p in placements {
        let IVec3 { x, y, z } = p.local;
        if !(0..r).contains(&x) || !(0..h).contains(&y) || !(0..r).contains(&z) {
            continue;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if grid.get(x, y, z).is_air() {
            grid.set(x, y, z, p.voxel);
            written += 1;
        }
    }
    written
}
