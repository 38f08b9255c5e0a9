//! Voxel type registry: maps compact [`Voxel`] ids to their [`VoxelTypeDef`].
//!
//! The registry is built once at startup and shared read-only with workers.
//! Air is always id 0. Ids with no registered definition resolve to a
//! fallback "missing voxel type" so a bad id never aborts meshing.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::voxel::Voxel;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Descriptor for one voxel type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoxelTypeDef {
    /// Human-readable name.
    pub name: String,
    /// Submesh (material) index the type renders into.
    pub material: usize,
    /// Merge group. Two adjacent solid voxels hide their shared faces iff
    /// they are in the same group.
    pub group: u8,
    /// Linear RGBA vertex color.
    pub color: [f32; 4],
}

impl VoxelTypeDef {
    /// Definition used for ids that were never registered.
    pub fn missing() -> Self {
        Self {
            name: "missing voxel type".to_string(),
            material: 0,
            group: 0,
            color: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Errors that can occur during voxel type registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A type with the same name has already been registered.
    #[error("duplicate voxel type name: {0}")]
    DuplicateName(String),
    /// All 255 non-air ids are in use.
    #[error("voxel type registry is full (max 256 types)")]
    RegistryFull,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Dense id → definition table with reverse lookup by name.
#[derive(Clone, Debug)]
pub struct VoxelTypeRegistry {
    /// `types[id]` is the definition for `Voxel(id)`.
    types: Vec<VoxelTypeDef>,
    name_to_id: FxHashMap<String, Voxel>,
    missing: VoxelTypeDef,
}

impl VoxelTypeRegistry {
    /// Creates a registry holding only air.
    pub fn new() -> Self {
        let air = VoxelTypeDef {
            name: "air".to_string(),
            material: 0,
            group: 0,
            color: [0.0; 4],
        };
        let mut name_to_id = FxHashMap::default();
        name_to_id.insert(air.name.clone(), Voxel::AIR);
        Self {
            types: vec![air],
            name_to_id,
            missing: VoxelTypeDef::missing(),
        }
    }

    /// Builds a registry from definitions assigned ids `1, 2, ...` in order.
    pub fn from_defs(defs: impl IntoIterator<Item = VoxelTypeDef>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Registers a type and returns its id.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] if the name is taken,
    /// [`RegistryError::RegistryFull`] once id 255 has been handed out.
    pub fn register(&mut self, def: VoxelTypeDef) -> Result<Voxel, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.types.len() > u8::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }
        let id = Voxel(self.types.len() as u8);
        tracing::debug!(name = %def.name, id = id.0, "registered voxel type");
        self.name_to_id.insert(def.name.clone(), id);
        self.types.push(def);
        Ok(id)
    }

    /// Definition for `voxel`, or the fallback for unknown ids.
    #[inline]
    pub fn get(&self, voxel: Voxel) -> &VoxelTypeDef {
        self.types.get(voxel.0 as usize).unwrap_or(&self.missing)
    }

    /// Id of a named type.
    pub fn lookup_by_name(&self, name: &str) -> Option<Voxel> {
        self.name_to_id.get(name).copied()
    }

    /// Number of registered types including air.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// Face predicate: a solid `voxel` shows its face towards `neighbor` iff
    /// the neighbor is air or belongs to a different merge group.
    #[inline]
    pub fn faces_towards(&self, voxel: Voxel, neighbor: Voxel) -> bool {
        neighbor.is_air() || self.get(voxel).group != self.get(neighbor).group
    }
}

impl Default for VoxelTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
