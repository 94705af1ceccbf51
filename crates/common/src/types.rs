use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Integer address of one cell in the voxel grid. `+y` is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    /// The six axis-aligned neighbor offsets, in a fixed order.
    pub const NEIGHBOR_OFFSETS: [IVec3; 6] = [
        IVec3::X,
        IVec3::NEG_X,
        IVec3::Y,
        IVec3::NEG_Y,
        IVec3::Z,
        IVec3::NEG_Z,
    ];

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Saturates at the `i32` range, which lies outside any grid.
    pub fn offset(self, delta: IVec3) -> Self {
        Self {
            x: self.x.saturating_add(delta.x),
            y: self.y.saturating_add(delta.y),
            z: self.z.saturating_add(delta.z),
        }
    }

    /// The cell directly above this one.
    pub fn up(self) -> Self {
        self.offset(IVec3::Y)
    }

    /// The support cell directly below this one.
    pub fn down(self) -> Self {
        self.offset(IVec3::NEG_Y)
    }

    pub fn neighbors(self) -> [CellCoord; 6] {
        Self::NEIGHBOR_OFFSETS.map(|d| self.offset(d))
    }
}

impl From<IVec3> for CellCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<CellCoord> for IVec3 {
    fn from(c: CellCoord) -> Self {
        IVec3::new(c.x, c.y, c.z)
    }
}

impl From<(i32, i32, i32)> for CellCoord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// What occupies a cell.
///
/// `Bedrock` is the only unbreakable type; everything else can be removed by
/// a player interaction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CellType {
    #[default]
    Empty,
    Soil,
    Turf,
    Stone,
    Sand,
    Log,
    Leaves,
    Planks,
    Bedrock,
}

impl CellType {
    /// Every variant, in declaration order.
    pub const ALL: [CellType; 9] = [
        CellType::Empty,
        CellType::Soil,
        CellType::Turf,
        CellType::Stone,
        CellType::Sand,
        CellType::Log,
        CellType::Leaves,
        CellType::Planks,
        CellType::Bedrock,
    ];

    pub fn is_empty(self) -> bool {
        self == CellType::Empty
    }

    pub fn is_solid(self) -> bool {
        !self.is_empty()
    }

    pub fn is_unbreakable(self) -> bool {
        matches!(self, CellType::Bedrock)
    }

    /// Single-character glyph used by text renderers and logs.
    pub fn glyph(self) -> char {
        match self {
            CellType::Empty => '.',
            CellType::Soil => 'd',
            CellType::Turf => 'g',
            CellType::Stone => '#',
            CellType::Sand => 's',
            CellType::Log => 'L',
            CellType::Leaves => '*',
            CellType::Planks => 'p',
            CellType::Bedrock => 'B',
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
