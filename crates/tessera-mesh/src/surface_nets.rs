//! Surface-nets style smoothing of a cubic chunk mesh.
//!
//! Every distinct vertex position becomes a node. A single relaxation pass
//! moves each node to the mean of its axis-aligned neighbor nodes, reading
//! only the pre-pass positions. Nodes on the chunk's vertical corner edges
//! and "flap" nodes outside the chunk keep their X/Z so adjacent chunks meet
//! without gaps. Every node stays within half a cell of where it started.

use glam::{IVec3, Vec3};
use rustc_hash::FxHashMap;
use tessera_voxel::{
    CHUNK_HEIGHT, CHUNK_RESOLUTION, ChunkNeighborhood, VoxelTypeRegistry, within_outer_buffer,
};

use crate::chunk_mesh::ChunkMesh;
use crate::culling::outer_face_visible;
use crate::face_direction::FaceDirection;

const AXIS_STEPS: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

#[derive(Debug)]
struct Node {
    original: IVec3,
    vertices: Vec<u32>,
    neighbors: Vec<usize>,
}

/// Quad corners of exposed faces belonging to solid cells in the one-cell
/// ring around the chunk.
///
/// These positions carry no vertices of their own; they anchor the
/// relaxation of edge nodes to the neighbor's surface.
pub fn collect_flap_corners(hood: &ChunkNeighborhood, registry: &VoxelTypeRegistry) -> Vec<IVec3> {
    let r = CHUNK_RESOLUTION as i32;
    let mut corners = Vec::new();
    for y in 0..CHUNK_HEIGHT as i32 {
        for x in -1..=r {
            for z in -1..=r {
                if !within_outer_buffer(x, y, z) {
                    continue;
                }
                let voxel = hood.resolve(x, y, z);
                if voxel.is_air() {
                    continue;
                }
                let cell = IVec3::new(x, y, z);
                for direction in FaceDirection::ALL {
                    if outer_face_visible(hood, registry, voxel, cell, direction) {
                        corners.extend(direction.quad(cell).map(|p| p.round().as_ivec3()));
                    }
                }
            }
        }
    }
    corners
}

fn is_corner_column(p: IVec3) -> bool {
    let r = CHUNK_RESOLUTION as i32;
    (p.x == 0 || p.x == r) && (p.z == 0 || p.z == r)
}

fn is_flap(p: IVec3) -> bool {
    let r = CHUNK_RESOLUTION as i32;
    p.x < 0 || p.x > r || p.z < 0 || p.z > r
}

/// Runs one relaxation pass over `mesh` in place.
///
/// `mesh` must still hold the unmodified integer-cornered cubic positions.
/// Normals are not touched; call [`ChunkMesh::recalculate_normals`] after.
pub fn relax(mesh: &mut ChunkMesh, flaps: &[IVec3]) {
    let mut lookup: FxHashMap<IVec3, usize> = FxHashMap::default();
    let mut nodes: Vec<Node> = Vec::new();

    let mut node_at = |p: IVec3, nodes: &mut Vec<Node>| -> usize {
        *lookup.entry(p).or_insert_with(|| {
            nodes.push(Node {
                original: p,
                vertices: Vec::new(),
                neighbors: Vec::new(),
            });
            nodes.len() - 1
        })
    };

    for &p in flaps {
        node_at(p, &mut nodes);
    }
    for (i, vertex) in mesh.vertices.iter().enumerate() {
        let p = Vec3::from(vertex.position).round().as_ivec3();
        let n = node_at(p, &mut nodes);
        nodes[n].vertices.push(i as u32);
    }

    for node in &mut nodes {
        node.neighbors = AXIS_STEPS
            .iter()
            .filter_map(|step| lookup.get(&(node.original + *step)).copied())
            .collect();
    }

    let relaxed: Vec<Vec3> = nodes
        .iter()
        .map(|node| {
            let original = node.original.as_vec3();
            let mut target = if node.neighbors.is_empty() {
                original
            } else {
                let sum: Vec3 = node
                    .neighbors
                    .iter()
                    .map(|&n| nodes[n].original.as_vec3())
                    .sum();
                sum / node.neighbors.len() as f32
            };
            if is_corner_column(node.original) || is_flap(node.original) {
                target.x = original.x;
                target.z = original.z;
            }
            target.clamp(original - Vec3::splat(0.5), original + Vec3::splat(0.5))
        })
        .collect();

    for (node, position) in nodes.iter().zip(relaxed) {
        for &v in &node.vertices {
            mesh.vertices[v as usize].position = position.to_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_voxel::{Side, Voxel, VoxelGrid, VoxelTypeDef};

    use super::*;
    use crate::culling::cull_mesh;

    fn registry() -> VoxelTypeRegistry {
        VoxelTypeRegistry::from_defs([VoxelTypeDef {
            name: "sand".to_string(),
            material: 0,
            group: 0,
            color: [1.0; 4],
        }])
        .unwrap()
    }

    fn single(x: usize, y: usize, z: usize) -> ChunkNeighborhood {
        let mut grid = VoxelGrid::empty();
        grid.set(x, y, z, Voxel(1));
        ChunkNeighborhood::from_center_only(grid)
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_cube_corner_moves_to_neighbor_mean() {
        let hood = single(8, 100, 8);
        let mut mesh = cull_mesh(&hood, &registry(), 1);
        relax(&mut mesh, &[]);
        let third = 1.0 / 3.0;
        let expected = Vec3::new(8.0 + third, 100.0 + third, 8.0 + third);
        assert!(mesh.vertices.iter().any(|v| approx(Vec3::from(v.position), expected)));
    }

    #[test]
    fn test_relaxed_vertices_stay_within_half_a_cell() {
        let mut grid = VoxelGrid::empty();
        for x in 2..9 {
            for z in 3..7 {
                for y in 0..(x + z) % 5 + 1 {
                    grid.set(x, y, z, Voxel(1));
                }
            }
        }
        let hood = ChunkNeighborhood::from_center_only(grid);
        let cubic = cull_mesh(&hood, &registry(), 1);
        let mut relaxed = cubic.clone();
        relax(&mut relaxed, &collect_flap_corners(&hood, &registry()));
        for (a, b) in cubic.vertices.iter().zip(&relaxed.vertices) {
            let d = (Vec3::from(a.position) - Vec3::from(b.position)).abs();
            assert!(d.max_element() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn test_corner_column_keeps_xz() {
        let hood = single(0, 0, 0);
        let mut mesh = cull_mesh(&hood, &registry(), 1);
        let corner = mesh
            .vertices
            .iter()
            .position(|v| v.position == [0.0, 0.0, 0.0])
            .unwrap();
        relax(&mut mesh, &[]);
        let p = Vec3::from(mesh.vertices[corner].position);
        assert!(approx(p, Vec3::new(0.0, 1.0 / 3.0, 0.0)), "{p}");
    }

    #[test]
    fn test_shared_position_moves_together() {
        let hood = single(5, 5, 5);
        let mut mesh = cull_mesh(&hood, &registry(), 1);
        let cubic = mesh.clone();
        relax(&mut mesh, &[]);
        for i in 0..cubic.vertices.len() {
            for j in 0..cubic.vertices.len() {
                if cubic.vertices[i].position == cubic.vertices[j].position {
                    assert_eq!(mesh.vertices[i].position, mesh.vertices[j].position);
                }
            }
        }
    }

    #[test]
    fn test_flap_corners_come_from_linked_neighbor() {
        let mut east = VoxelGrid::empty();
        east.set(0, 4, 7, Voxel(1));
        let hood = ChunkNeighborhood::from_center_only(VoxelGrid::empty())
            .with_neighbor(Side::PosX, std::sync::Arc::new(east));
        let flaps = collect_flap_corners(&hood, &registry());
        assert!(!flaps.is_empty());
        assert!(flaps.iter().all(|p| p.x == 16 || p.x == 17));
        assert!(flaps.contains(&IVec3::new(16, 4, 7)));
    }

    #[test]
    fn test_flap_anchors_edge_node() {
        let hood = single(15, 0, 8);
        let cubic = cull_mesh(&hood, &registry(), 1);
        let edge = cubic
            .vertices
            .iter()
            .position(|v| v.position == [16.0, 0.0, 8.0])
            .unwrap();

        let mut free = cubic.clone();
        relax(&mut free, &[]);
        assert!((free.vertices[edge].position[0] - (15.0 + 2.0 / 3.0)).abs() < 1e-5);

        // A vertex-less flap one cell further out pulls the node back onto
        // the chunk boundary.
        let mut anchored = cubic.clone();
        relax(&mut anchored, &[IVec3::new(17, 0, 8)]);
        assert!((anchored.vertices[edge].position[0] - 16.0).abs() < 1e-5);
        assert_eq!(anchored.vertices.len(), cubic.vertices.len());
    }

    #[test]
    fn test_relaxation_is_deterministic() {
        let hood = single(3, 3, 3);
        let mut a = cull_mesh(&hood, &registry(), 1);
        let mut b = a.clone();
        relax(&mut a, &[]);
        relax(&mut b, &[]);
        assert_eq!(a, b);
    }
}
