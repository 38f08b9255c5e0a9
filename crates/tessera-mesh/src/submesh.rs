//! Two-pass submesh assembly.
//!
//! A counting pass records how many faces each material owns. The builder
//! then sizes the vertex buffer and carves the index buffer into one range
//! per material, so faces can be written in visiting order while their
//! indices land in their material's range.

use glam::{IVec3, Vec3};

use crate::chunk_mesh::{ChunkMesh, MeshBounds, MeshVertex, QuadInfo, SubMesh};
use crate::face_direction::{FaceDirection, QUAD_TRIANGLES};

/// Result of the counting pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceCounts {
    /// Faces per material slot.
    pub per_material: Vec<usize>,
    /// One above the highest solid cell, 0 for an empty chunk.
    pub mesh_height: usize,
}

impl FaceCounts {
    /// Zeroed counts for `materials` slots.
    pub fn new(materials: usize) -> Self {
        Self {
            per_material: vec![0; materials],
            mesh_height: 0,
        }
    }

    /// Records one face for `material`. Out-of-range materials are ignored
    /// and reported as `false`.
    pub fn count(&mut self, material: usize) -> bool {
        match self.per_material.get_mut(material) {
            Some(n) => {
                *n += 1;
                true
            }
            None => false,
        }
    }

    /// Total faces across all materials.
    pub fn total(&self) -> usize {
        self.per_material.iter().sum()
    }
}

/// Writes faces into pre-sized buffers.
pub struct SubmeshBuilder {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    quads: Vec<QuadInfo>,
    submeshes: Vec<SubMesh>,
    /// Next free index slot per material.
    cursors: Vec<usize>,
    mesh_height: usize,
}

impl SubmeshBuilder {
    /// Allocates buffers for exactly `counts.total()` faces.
    pub fn new(counts: &FaceCounts) -> Self {
        let total = counts.total();
        let mut submeshes = Vec::with_capacity(counts.per_material.len());
        let mut start = 0;
        for (material, &faces) in counts.per_material.iter().enumerate() {
            submeshes.push(SubMesh {
                material,
                index_start: start,
                index_count: faces * 6,
                vertex_count: faces * 4,
            });
            start += faces * 6;
        }
        let cursors = submeshes.iter().map(|s| s.index_start).collect();
        Self {
            vertices: Vec::with_capacity(total * 4),
            indices: vec![0; total * 6],
            quads: Vec::with_capacity(total),
            submeshes,
            cursors,
            mesh_height: counts.mesh_height,
        }
    }

    /// Appends one face of `cell`. Returns `false` if the material's range is
    /// already full or the material slot does not exist.
    pub fn push_face(
        &mut self,
        cell: IVec3,
        direction: FaceDirection,
        material: usize,
        color: [f32; 4],
    ) -> bool {
        let Some(submesh) = self.submeshes.get(material) else {
            return false;
        };
        let cursor = self.cursors[material];
        if cursor + 6 > submesh.index_start + submesh.index_count {
            return false;
        }

        let base = self.vertices.len() as u32;
        let normal = direction.normal();
        for position in direction.quad(cell) {
            self.vertices.push(MeshVertex {
                position: position.to_array(),
                normal,
                color,
            });
        }
        for (slot, offset) in QUAD_TRIANGLES.iter().enumerate() {
            self.indices[cursor + slot] = base + offset;
        }
        self.cursors[material] += 6;
        self.quads.push(QuadInfo {
            direction,
            cell,
            material,
        });
        true
    }

    /// Finishes the mesh with bounds covering the chunk footprint up to the
    /// recorded mesh height.
    pub fn finish(self, footprint: f32) -> ChunkMesh {
        ChunkMesh {
            vertices: self.vertices,
            indices: self.indices,
            submeshes: self.submeshes,
            quads: self.quads,
            bounds: MeshBounds {
                min: Vec3::ZERO,
                max: Vec3::new(footprint, self.mesh_height as f32, footprint),
            },
        }
    }
}
