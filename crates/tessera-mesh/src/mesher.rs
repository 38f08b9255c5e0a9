//! The chunk mesher: culling, submesh assembly and optional relaxation
//! behind one entry point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tessera_voxel::{ChunkNeighborhood, VoxelTypeRegistry};

use crate::chunk_mesh::{ChunkMesh, MeshUsage, UsageMesh};
use crate::culling::{count_faces, emit_faces};
use crate::surface_nets::{collect_flap_corners, relax};

/// Mesher settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MesherConfig {
    /// Number of material slots (one submesh each).
    pub materials: usize,
    /// Smooth the cubic mesh with one relaxation pass.
    pub surface_nets: bool,
    /// Usage tag attached to the produced mesh.
    pub usage: MeshUsage,
}

impl Default for MesherConfig {
    fn default() -> Self {
        Self {
            materials: 1,
            surface_nets: false,
            usage: MeshUsage::CollisionAndRender,
        }
    }
}

/// Turns chunk neighborhoods into material-partitioned meshes.
///
/// Shared across meshing workers; every call is independent and produces
/// identical output for identical input.
pub struct VoxelMesher {
    registry: Arc<VoxelTypeRegistry>,
    config: MesherConfig,
    warned_no_materials: AtomicBool,
}

impl VoxelMesher {
    /// Creates a mesher over a shared registry.
    pub fn new(registry: Arc<VoxelTypeRegistry>, config: MesherConfig) -> Self {
        Self {
            registry,
            config,
            warned_no_materials: AtomicBool::new(false),
        }
    }

    /// Current settings.
    pub fn config(&self) -> &MesherConfig {
        &self.config
    }

    /// The registry faces are resolved against.
    pub fn registry(&self) -> &VoxelTypeRegistry {
        &self.registry
    }

    /// Meshes the center chunk of `hood`.
    pub fn mesh(&self, hood: &ChunkNeighborhood) -> ChunkMesh {
        if self.config.materials == 0 {
            if !self.warned_no_materials.swap(true, Ordering::Relaxed) {
                tracing::warn!("no materials configured for the voxel mesher; meshes will be empty");
            }
            return ChunkMesh::new();
        }

        let (counts, dropped) = count_faces(hood, &self.registry, self.config.materials);
        if dropped > 0 {
            tracing::warn!(
                dropped,
                materials = self.config.materials,
                "faces reference a material slot that does not exist"
            );
        }
        let mut mesh = emit_faces(hood, &self.registry, &counts);

        if self.config.surface_nets {
            let flaps = collect_flap_corners(hood, &self.registry);
            relax(&mut mesh, &flaps);
            mesh.recalculate_normals();
        }
        mesh
    }

    /// Meshes `hood` and tags the result with the configured usage.
    pub fn mesh_tagged(&self, hood: &ChunkNeighborhood) -> Vec<UsageMesh> {
        vec![UsageMesh {
            usage: self.config.usage,
            mesh: self.mesh(hood),
        }]
    }
}
