//! Face culling: decides which voxel faces are exposed and emits them.
//!
//! Cells are visited in `y, x, z` order and faces in [`FaceDirection::ALL`]
//! order, so the output is a pure function of the neighborhood.

use glam::IVec3;
use tessera_voxel::{
    CHUNK_HEIGHT, CHUNK_RESOLUTION, CellClass, ChunkNeighborhood, Voxel, VoxelTypeRegistry,
    classify,
};

use crate::chunk_mesh::ChunkMesh;
use crate::face_direction::FaceDirection;
use crate::submesh::{FaceCounts, SubmeshBuilder};

/// Whether the face of an inner `voxel` at `cell` towards `direction` is
/// exposed. Cells past the vertical range, or with no linked neighbor, read
/// as air.
#[inline]
pub fn inner_face_visible(
    hood: &ChunkNeighborhood,
    registry: &VoxelTypeRegistry,
    voxel: Voxel,
    cell: IVec3,
    direction: FaceDirection,
) -> bool {
    let n = cell + direction.step();
    registry.faces_towards(voxel, hood.resolve(n.x, n.y, n.z))
}

/// Whether the face of a solid ring cell towards `direction` is exposed.
///
/// Only neighbors that are themselves inside the chunk or in the ring count;
/// anything further out never produces a face.
#[inline]
pub fn outer_face_visible(
    hood: &ChunkNeighborhood,
    registry: &VoxelTypeRegistry,
    voxel: Voxel,
    cell: IVec3,
    direction: FaceDirection,
) -> bool {
    let n = cell + direction.step();
    match classify(n.x, n.y, n.z) {
        CellClass::OutOfRange => false,
        _ => registry.faces_towards(voxel, hood.resolve(n.x, n.y, n.z)),
    }
}

/// Visits every solid inner cell in meshing order.
fn for_each_solid(hood: &ChunkNeighborhood, mut f: impl FnMut(IVec3, Voxel)) {
    let center = hood.center();
    for y in 0..CHUNK_HEIGHT {
        for x in 0..CHUNK_RESOLUTION {
            for z in 0..CHUNK_RESOLUTION {
                let voxel = center.get(x, y, z);
                if voxel.is_solid() {
                    f(IVec3::new(x as i32, y as i32, z as i32), voxel);
                }
            }
        }
    }
}

/// Counting pass: exposed faces per material and the mesh height.
///
/// The second return value is the number of exposed faces whose material
/// slot does not exist; those faces are left out of the mesh.
pub fn count_faces(
    hood: &ChunkNeighborhood,
    registry: &VoxelTypeRegistry,
    materials: usize,
) -> (FaceCounts, usize) {
    let mut counts = FaceCounts::new(materials);
    let mut dropped = 0;
    for_each_solid(hood, |cell, voxel| {
        let material = registry.get(voxel).material;
        for direction in FaceDirection::ALL {
            if inner_face_visible(hood, registry, voxel, cell, direction) && !counts.count(material)
            {
                dropped += 1;
            }
        }
        counts.mesh_height = counts.mesh_height.max(cell.y as usize + 1);
    });
    (counts, dropped)
}

/// Writing pass: emits every exposed face into a mesh sized by `counts`.
pub fn emit_faces(
    hood: &ChunkNeighborhood,
    registry: &VoxelTypeRegistry,
    counts: &FaceCounts,
) -> ChunkMesh {
    let mut builder = SubmeshBuilder::new(counts);
    for_each_solid(hood, |cell, voxel| {
        let def = registry.get(voxel);
        for direction in FaceDirection::ALL {
            if inner_face_visible(hood, registry, voxel, cell, direction) {
                builder.push_face(cell, direction, def.material, def.color);
            }
        }
    });
    builder.finish(CHUNK_RESOLUTION as f32)
}

/// Culls and emits a cubic mesh in one call.
pub fn cull_mesh(
    hood: &ChunkNeighborhood,
    registry: &VoxelTypeRegistry,
    materials: usize,
) -> ChunkMesh {
    let (counts, _) = count_faces(hood, registry, materials);
    emit_faces(hood, registry, &counts)
}
