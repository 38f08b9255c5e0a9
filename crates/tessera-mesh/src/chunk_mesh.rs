//! Chunk mesh data: one shared vertex buffer, one index buffer split into
//! per-material submeshes.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};
use static_assertions::const_assert_eq;

use crate::face_direction::FaceDirection;

/// A single vertex in a chunk mesh.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local coordinates.
    pub position: [f32; 3],
    /// Vertex normal.
    pub normal: [f32; 3],
    /// Linear RGBA color of the voxel type.
    pub color: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<MeshVertex>(), 40);

/// Metadata for one emitted face, for analysis and tests.
///
/// `quads[k]` owns vertices `4k..4k + 4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadInfo {
    /// Which face direction this quad belongs to.
    pub direction: FaceDirection,
    /// Local cell the face was emitted for.
    pub cell: IVec3,
    /// Submesh the quad's indices live in.
    pub material: usize,
}

/// A contiguous index range drawn with one material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubMesh {
    /// Material slot.
    pub material: usize,
    /// First index in [`ChunkMesh::indices`].
    pub index_start: usize,
    /// Number of indices (6 per face).
    pub index_count: usize,
    /// Number of vertices referenced (4 per face).
    pub vertex_count: usize,
}

/// Axis-aligned bounds in chunk-local space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshBounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl MeshBounds {
    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// The mesh output of a chunk meshing pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    /// Vertex buffer, four vertices per face in emission order.
    pub vertices: Vec<MeshVertex>,
    /// Index buffer (triangles), grouped by submesh.
    pub indices: Vec<u32>,
    /// One entry per material slot, in material order.
    pub submeshes: Vec<SubMesh>,
    /// One entry per emitted face.
    pub quads: Vec<QuadInfo>,
    /// Footprint of the chunk up to one above its highest solid cell.
    pub bounds: MeshBounds,
}

impl ChunkMesh {
    /// Creates an empty mesh with no submeshes.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if no faces were emitted.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Returns the total number of faces in the mesh.
    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    /// Counts the faces emitted for a specific direction.
    pub fn count_quads_for_direction(&self, direction: FaceDirection) -> usize {
        self.quads
            .iter()
            .filter(|q| q.direction == direction)
            .count()
    }

    /// Index slice of one submesh.
    pub fn submesh_indices(&self, submesh: usize) -> &[u32] {
        match self.submeshes.get(submesh) {
            Some(s) => &self.indices[s.index_start..s.index_start + s.index_count],
            None => &[],
        }
    }

    /// Recomputes every vertex normal from the triangles that use it.
    ///
    /// Vertices touched only by degenerate triangles keep their old normal.
    pub fn recalculate_normals(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let n = (pb - pa).cross(pc - pa);
            sums[a] += n;
            sums[b] += n;
            sums[c] += n;
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            if let Some(n) = sum.try_normalize() {
                vertex.normal = n.to_array();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Usage tagging
// ---------------------------------------------------------------------------

/// What a produced mesh is meant for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshUsage {
    /// Drawn only.
    Render,
    /// Physics collider only.
    Collision,
    /// Drawn and used as a collider.
    CollisionAndRender,
    /// Trigger volume only.
    Trigger,
    /// Drawn and used as a trigger volume.
    TriggerAndRender,
}

impl MeshUsage {
    /// `true` if the mesh should be drawn.
    pub fn renders(self) -> bool {
        matches!(
            self,
            Self::Render | Self::CollisionAndRender | Self::TriggerAndRender
        )
    }

    /// `true` if the mesh should back a collider or trigger.
    pub fn collides(self) -> bool {
        !matches!(self, Self::Render)
    }
}

/// A mesh tagged with its usage.
#[derive(Clone, Debug, PartialEq)]
pub struct UsageMesh {
    /// Intended use.
    pub usage: MeshUsage,
    /// Geometry.
    pub mesh: ChunkMesh,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_quad_mesh(direction: FaceDirection) -> ChunkMesh {
        let mut mesh = ChunkMesh::new();
        for p in direction.quad(IVec3::ZERO) {
            mesh.vertices.push(MeshVertex {
                position: p.to_array(),
                normal: [0.0; 3],
                color: [1.0; 4],
            });
        }
        mesh.indices.extend_from_slice(&crate::face_direction::QUAD_TRIANGLES);
        mesh.submeshes.push(SubMesh {
            material: 0,
            index_start: 0,
            index_count: 6,
            vertex_count: 4,
        });
        mesh.quads.push(QuadInfo {
            direction,
            cell: IVec3::ZERO,
            material: 0,
        });
        mesh
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = ChunkMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.quad_count(), 0);
        assert!(mesh.submesh_indices(0).is_empty());
    }

    #[test]
    fn test_recalculated_normals_match_face_normals() {
        for dir in FaceDirection::ALL {
            let mut mesh = single_quad_mesh(dir);
            mesh.recalculate_normals();
            for v in &mesh.vertices {
                let n = Vec3::from(v.normal);
                assert!((n - Vec3::from(dir.normal())).length() < 1e-5, "{dir:?}: {n}");
            }
        }
    }

    #[test]
    fn test_count_quads_by_direction() {
        let mesh = single_quad_mesh(FaceDirection::PosY);
        assert_eq!(mesh.count_quads_for_direction(FaceDirection::PosY), 1);
        assert_eq!(mesh.count_quads_for_direction(FaceDirection::NegY), 0);
        assert_eq!(mesh.submesh_indices(0), &[0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn test_usage_flags() {
        assert!(MeshUsage::CollisionAndRender.renders());
        assert!(MeshUsage::CollisionAndRender.collides());
        assert!(!MeshUsage::Render.collides());
        assert!(!MeshUsage::Trigger.renders());
    }

    #[test]
    fn test_bounds_center() {
        let b = MeshBounds {
            min: Vec3::ZERO,
            max: Vec3::new(16.0, 9.0, 16.0),
        };
        assert_eq!(b.center(), Vec3::new(8.0, 4.5, 8.0));
    }
}
