//! Chunk meshing: face culling across chunk seams, per-material submeshes,
//! and optional surface-nets relaxation.

pub mod chunk_mesh;
pub mod culling;
pub mod face_direction;
pub mod mesher;
pub mod submesh;
pub mod surface_nets;

pub use chunk_mesh::{ChunkMesh, MeshBounds, MeshUsage, MeshVertex, QuadInfo, SubMesh, UsageMesh};
pub use culling::{count_faces, cull_mesh, emit_faces, inner_face_visible, outer_face_visible};
pub use face_direction::{CUBE_CORNERS, FaceDirection, QUAD_TRIANGLES};
pub use mesher::{MesherConfig, VoxelMesher};
pub use submesh::{FaceCounts, SubmeshBuilder};
pub use surface_nets::{collect_flap_corners, relax};
