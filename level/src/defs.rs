//! The decoded map records. Cross references between records are plain
//! indices in to the arrays held by [`crate::MapData`], all of them checked at
//! load time.

use math::{FixedPoint, FixedVertex};
use wad::LumpName;

/// Set on a node child when it refers to a subsector rather than a node
pub const IS_SSECTOR_MASK: u32 = 0x8000_0000;
/// The same flag in the 16 bit children of vanilla and early GL nodes
pub(crate) const IS_OLD_SSECTOR_MASK: u16 = 0x8000;

/// Linedef flags, as stored in the `LINEDEFS` lump
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDefFlags {
    /// Solid, is an obstacle
    Blocking = 1,
    /// Blocks monsters only
    BlockMonsters = 1 << 1,
    /// Backside will not be present at all if not two sided
    TwoSided = 1 << 2,
    /// Upper texture unpegged
    UnpegTop = 1 << 3,
    /// Lower texture unpegged
    UnpegBottom = 1 << 4,
    /// In automap: don't map as two sided: IT'S A SECRET!
    Secret = 1 << 5,
    /// Sound rendering: don't let sound cross two of these
    BlockSound = 1 << 6,
    /// Don't draw on the automap at all
    DontDraw = 1 << 7,
    /// Set if already seen, thus drawn in automap
    Draw = 1 << 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeType {
    Horizontal,
    Vertical,
    Positive,
    Negative,
}

impl SlopeType {
    pub fn from_delta(delta: FixedVertex) -> Self {
        let (dx, dy) = (delta.x.raw(), delta.y.raw());
        if dx == 0 {
            SlopeType::Vertical
        } else if dy == 0 {
            SlopeType::Horizontal
        } else if (dx > 0) == (dy > 0) {
            SlopeType::Positive
        } else {
            SlopeType::Negative
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
    pub top: FixedPoint,
    pub bottom: FixedPoint,
    pub left: FixedPoint,
    pub right: FixedPoint,
}

impl BBox {
    pub fn new(v1: FixedVertex, v2: FixedVertex) -> Self {
        BBox {
            top: Ord::max(v1.y, v2.y),
            bottom: Ord::min(v1.y, v2.y),
            left: Ord::min(v1.x, v2.x),
            right: Ord::max(v1.x, v2.x),
        }
    }

    pub fn contains(&self, v: FixedVertex) -> bool {
        v.x >= self.left && v.x <= self.right && v.y >= self.bottom && v.y <= self.top
    }
}

/// A `THINGS` record. Positions are whole map units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Thing {
    pub x: i16,
    pub y: i16,
    /// Facing, in degrees
    pub angle: i16,
    /// The DoomEd number
    pub kind: i16,
    pub flags: i16,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sector {
    pub num: usize,
    pub floorheight: FixedPoint,
    pub ceilingheight: FixedPoint,
    pub floorpic: LumpName,
    pub ceilingpic: LumpName,
    /// Directory index of the floor flat, when it could be found
    pub floor_flat: Option<usize>,
    /// Directory index of the ceiling flat, when it could be found
    pub ceiling_flat: Option<usize>,
    pub lightlevel: i16,
    pub special: i16,
    pub tag: i16,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SideDef {
    pub textureoffset: FixedPoint,
    pub rowoffset: FixedPoint,
    pub toptexture: LumpName,
    pub bottomtexture: LumpName,
    pub midtexture: LumpName,
    /// Sector the sidedef is facing
    pub sector: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineDef {
    pub v1: usize,
    pub v2: usize,
    /// Precalculated v2 - v1 for side checking
    pub delta: FixedVertex,
    pub flags: u16,
    pub special: i16,
    pub tag: i16,
    pub bbox: BBox,
    pub slopetype: SlopeType,
    pub front_sidedef: usize,
    /// `None` when the stored index was 0xFFFF
    pub back_sidedef: Option<usize>,
    pub frontsector: usize,
    pub backsector: Option<usize>,
}

impl LineDef {
    /// Sidedefs indexed by side, 0 is the front
    pub fn sides(&self) -> [Option<usize>; 2] {
        [Some(self.front_sidedef), self.back_sidedef]
    }

    pub fn has_flag(&self, flag: LineDefFlags) -> bool {
        self.flags & flag as u16 != 0
    }

    pub fn is_two_sided(&self) -> bool {
        self.has_flag(LineDefFlags::TwoSided)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub v1: usize,
    pub v2: usize,
    /// Distance from the linedef vertex on this seg's side to `v1`
    pub offset: FixedPoint,
    /// Binary angle of v1 to v2
    pub angle: u32,
    /// `None` for GL minisegs, which run along no line
    pub linedef: Option<usize>,
    pub side: u8,
    pub sidedef: Option<usize>,
    pub frontsector: Option<usize>,
    pub backsector: Option<usize>,
}

impl Segment {
    pub fn is_miniseg(&self) -> bool {
        self.linedef.is_none()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubSector {
    /// Sector of the first seg with a front sector. Only a subsector made
    /// entirely of minisegs has none.
    pub sector: Option<usize>,
    /// How many `Segment`s line this `SubSector`
    pub seg_count: u32,
    /// The `Segment` to start with
    pub start_seg: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Where the line used for splitting the level starts
    pub xy: FixedVertex,
    /// Direction of the splitting line
    pub delta: FixedVertex,
    /// Right then left child bounding boxes
    pub bboxes: [BBox; 2],
    /// The node children. A child with [`IS_SSECTOR_MASK`] set is a leaf, the
    /// remaining bits index the subsector array.
    pub children: [u32; 2],
}

impl Node {
    pub fn child_is_subsector(&self, side: usize) -> bool {
        self.children[side] & IS_SSECTOR_MASK != 0
    }

    /// The child index with the leaf flag removed
    pub fn child_index(&self, side: usize) -> usize {
        (self.children[side] & !IS_SSECTOR_MASK) as usize
    }
}
