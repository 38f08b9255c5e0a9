//! The six voxel face directions and the fixed cube geometry tables.

use glam::{IVec3, Vec3};
use tessera_voxel::Side;

/// The eight corners of a unit voxel cube, relative to its minimum corner.
pub const CUBE_CORNERS: [Vec3; 8] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(0.0, 1.0, 1.0),
];

/// Corner indices of each face quad, in [`FaceDirection`] order.
const QUAD_CORNERS: [[usize; 4]; 6] = [
    [1, 2, 5, 6],
    [4, 7, 0, 3],
    [3, 7, 2, 6],
    [1, 5, 0, 4],
    [5, 6, 4, 7],
    [0, 3, 1, 2],
];

/// Two triangles per quad, as offsets into the quad's four vertices.
pub const QUAD_TRIANGLES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// One of the six directions a voxel face can point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceDirection {
    /// +X direction.
    PosX = 0,
    /// −X direction.
    NegX = 1,
    /// +Y direction.
    PosY = 2,
    /// −Y direction.
    NegY = 3,
    /// +Z direction.
    PosZ = 4,
    /// −Z direction.
    NegZ = 5,
}

impl FaceDirection {
    /// All six directions in meshing order.
    pub const ALL: [FaceDirection; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Unit outward normal.
    pub fn normal(self) -> [f32; 3] {
        match self {
            Self::PosX => [1.0, 0.0, 0.0],
            Self::NegX => [-1.0, 0.0, 0.0],
            Self::PosY => [0.0, 1.0, 0.0],
            Self::NegY => [0.0, -1.0, 0.0],
            Self::PosZ => [0.0, 0.0, 1.0],
            Self::NegZ => [0.0, 0.0, -1.0],
        }
    }

    /// Integer step towards the neighboring cell.
    pub fn step(self) -> IVec3 {
        match self {
            Self::PosX => IVec3::X,
            Self::NegX => IVec3::NEG_X,
            Self::PosY => IVec3::Y,
            Self::NegY => IVec3::NEG_Y,
            Self::PosZ => IVec3::Z,
            Self::NegZ => IVec3::NEG_Z,
        }
    }

    /// Returns the neighbor coordinate offset for this direction.
    pub fn offset(self, x: i32, y: i32, z: i32) -> (i32, i32, i32) {
        let s = self.step();
        (x + s.x, y + s.y, z + s.z)
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// The four quad corners of this face for the cell at `cell`.
    pub fn quad(self, cell: IVec3) -> [Vec3; 4] {
        let base = cell.as_vec3();
        QUAD_CORNERS[self.index()].map(|c| base + CUBE_CORNERS[c])
    }

    /// Returns the direction index (0–5).
    pub fn index(self) -> usize {
        self as usize
    }
}
