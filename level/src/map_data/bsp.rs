//! Segs, subsectors, and nodes for each supported node builder layout.
//!
//! | Version    | Segs                 | Subsectors            | Nodes                  |
//! |------------|----------------------|-----------------------|------------------------|
//! | Vanilla    | `SEGS`, 12 bytes     | `SSECTORS`, 4 bytes   | `NODES`, 28 bytes      |
//! | GL v1, v2  | `GL_SEGS`, 10 bytes  | `GL_SSECT`, 4 bytes   | `GL_NODES`, 28 bytes   |
//! | GL v3      | `GL_SEGS`, `gNd3` + 16 bytes | `GL_SSECT`, `gNd3` + 8 bytes | `GL_NODES`, 28 bytes |
//! | GL v4, v5  | `GL_SEGS`, 16 bytes  | `GL_SSECT`, 8 bytes   | `GL_NODES`, 32 bytes   |
//! | DeepBSP v4 | `SEGS`, 16 bytes     | `SSECTORS`, 6 bytes   | `NODES`, `xNd4` + 32 bytes |
//!
//! GL segs refer to GL vertices by setting a flag bit on the vertex index, and
//! to no linedef at all (a miniseg) with 0xFFFF.

use log::{info, warn};
use math::{FixedPoint, FixedVertex, radian_to_bam};
use wad::{ByteCursor, Lump};

use super::MapData;
use crate::defs::IS_OLD_SSECTOR_MASK;
use crate::error::{MapError, Unimplemented};
use crate::lumps::{MapLump, MapLumps};
use crate::nodes_version::NodesVersion;
use crate::options::LoadOptions;
use crate::records::{check_index, decode_records};
use crate::{BBox, IS_SSECTOR_MASK, Node, Segment, SubSector};

const MINISEG: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegLayout {
    Vanilla,
    Gl,
    Gl3,
    Gl5,
    DeepBsp,
}

impl SegLayout {
    const fn lump(self) -> &'static str {
        match self {
            SegLayout::Vanilla | SegLayout::DeepBsp => "SEGS",
            _ => "GL_SEGS",
        }
    }

    const fn header(self) -> usize {
        match self {
            SegLayout::Gl3 => 4,
            _ => 0,
        }
    }

    const fn size(self) -> usize {
        match self {
            SegLayout::Vanilla => 12,
            SegLayout::Gl => 10,
            SegLayout::Gl3 | SegLayout::Gl5 | SegLayout::DeepBsp => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubSectorLayout {
    Vanilla,
    Gl,
    Gl3,
    Gl5,
    DeepBsp,
}

impl SubSectorLayout {
    const fn lump(self) -> &'static str {
        match self {
            SubSectorLayout::Vanilla | SubSectorLayout::DeepBsp => "SSECTORS",
            _ => "GL_SSECT",
        }
    }

    const fn header(self) -> usize {
        match self {
            SubSectorLayout::Gl3 => 4,
            _ => 0,
        }
    }

    const fn size(self) -> usize {
        match self {
            SubSectorLayout::Vanilla | SubSectorLayout::Gl => 4,
            SubSectorLayout::DeepBsp => 6,
            SubSectorLayout::Gl3 | SubSectorLayout::Gl5 => 8,
        }
    }

    /// Seg count and first seg
    fn read(self, r: ByteCursor<'_>) -> Result<(u32, u32), MapError> {
        Ok(match self {
            SubSectorLayout::Vanilla | SubSectorLayout::Gl => {
                (r.read_u16(0)? as u32, r.read_u16(2)? as u32)
            }
            SubSectorLayout::DeepBsp => (r.read_u16(0)? as u32, r.read_u32(2)?),
            SubSectorLayout::Gl3 | SubSectorLayout::Gl5 => (r.read_u32(0)?, r.read_u32(4)?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeLayout {
    /// 16 bit children, as in vanilla and GL v1 to v3
    Short(&'static str),
    /// 32 bit children after `header` bytes
    Long(&'static str, usize),
}

impl NodeLayout {
    const fn lump(self) -> &'static str {
        match self {
            NodeLayout::Short(lump) | NodeLayout::Long(lump, _) => lump,
        }
    }
}

/// A seg as stored, before any index is checked
struct RawSeg {
    v1: usize,
    v2: usize,
    /// Only stored by the vanilla and DeepBSP layouts
    angle: Option<u32>,
    /// `None` for a miniseg
    linedef: Option<usize>,
    side: u16,
}

impl RawSeg {
    fn read(layout: SegLayout, r: ByteCursor<'_>, gl_vertex_start: usize) -> Result<Self, MapError> {
        let gl_vertex = |index: u32, flag: u32| {
            if index & flag != 0 {
                gl_vertex_start + (index & !flag) as usize
            } else {
                index as usize
            }
        };
        let gl_linedef = |linedef: u16| (linedef != MINISEG).then_some(linedef as usize);

        Ok(match layout {
            SegLayout::Vanilla => RawSeg {
                v1: r.read_u16(0)? as usize,
                v2: r.read_u16(2)? as usize,
                angle: Some((r.read_u16(4)? as u32) << 16),
                linedef: Some(r.read_u16(6)? as usize),
                side: r.read_u16(8)?,
            },
            SegLayout::Gl => RawSeg {
                v1: gl_vertex(r.read_u16(0)? as u32, 0x8000),
                v2: gl_vertex(r.read_u16(2)? as u32, 0x8000),
                angle: None,
                linedef: gl_linedef(r.read_u16(4)?),
                side: r.read_u16(6)?,
            },
            SegLayout::Gl3 | SegLayout::Gl5 => {
                let flag = if layout == SegLayout::Gl3 {
                    0x4000_0000
                } else {
                    0x8000_0000
                };
                RawSeg {
                    v1: gl_vertex(r.read_u32(0)?, flag),
                    v2: gl_vertex(r.read_u32(4)?, flag),
                    angle: None,
                    linedef: gl_linedef(r.read_u16(8)?),
                    side: r.read_u16(10)?,
                }
            }
            SegLayout::DeepBsp => RawSeg {
                v1: r.read_u32(0)? as usize,
                v2: r.read_u32(4)? as usize,
                angle: Some((r.read_u16(8)? as u32) << 16),
                linedef: Some(r.read_u16(10)? as usize),
                side: r.read_u16(12)?,
            },
        })
    }
}

fn angle_between(v1: FixedVertex, v2: FixedVertex) -> u32 {
    let dx = f64::from(v2.x.raw()) - f64::from(v1.x.raw());
    let dy = f64::from(v2.y.raw()) - f64::from(v1.y.raw());
    radian_to_bam(dy.atan2(dx))
}

impl MapData {
    pub(super) fn load_bsp(&mut self, lumps: &MapLumps, options: &LoadOptions) -> Result<(), MapError> {
        let (segs, subsectors, nodes, seg_layout, subsector_layout, node_layout) =
            match self.nodes_version {
                NodesVersion::Vanilla => (
                    lumps.vanilla(MapLump::Segs)?,
                    lumps.vanilla(MapLump::SubSectors)?,
                    lumps.vanilla(MapLump::Nodes)?,
                    SegLayout::Vanilla,
                    SubSectorLayout::Vanilla,
                    NodeLayout::Short("NODES"),
                ),
                NodesVersion::DeepBsp4 => (
                    lumps.vanilla(MapLump::Segs)?,
                    lumps.vanilla(MapLump::SubSectors)?,
                    lumps.vanilla(MapLump::Nodes)?,
                    SegLayout::DeepBsp,
                    SubSectorLayout::DeepBsp,
                    NodeLayout::Long("NODES", 8),
                ),
                NodesVersion::GlNodes1 | NodesVersion::GlNodes2 => {
                    let gl = lumps.gl()?;
                    (
                        gl.segs,
                        gl.subsectors,
                        gl.nodes,
                        SegLayout::Gl,
                        SubSectorLayout::Gl,
                        NodeLayout::Short("GL_NODES"),
                    )
                }
                NodesVersion::GlNodes3 => {
                    let gl = lumps.gl()?;
                    (
                        gl.segs,
                        gl.subsectors,
                        gl.nodes,
                        SegLayout::Gl3,
                        SubSectorLayout::Gl3,
                        NodeLayout::Short("GL_NODES"),
                    )
                }
                NodesVersion::GlNodes4 | NodesVersion::GlNodes5 => {
                    let gl = lumps.gl()?;
                    (
                        gl.segs,
                        gl.subsectors,
                        gl.nodes,
                        SegLayout::Gl5,
                        SubSectorLayout::Gl5,
                        NodeLayout::Long("GL_NODES", 0),
                    )
                }
                version => {
                    return Err(MapError::NotImplemented(Unimplemented::Nodes(version)));
                }
            };

        self.segments = self.decode_segs(segs, seg_layout, options)?;
        info!("{}: Loaded {} segments", self.name, self.segments.len());
        self.subsectors = self.decode_subsectors(subsectors, subsector_layout)?;
        info!("{}: Loaded {} subsectors", self.name, self.subsectors.len());
        self.nodes = self.decode_nodes(nodes, node_layout)?;
        info!("{}: Loaded {} bsp nodes", self.name, self.nodes.len());

        self.start_node = match self.nodes.len() {
            0 => IS_SSECTOR_MASK,
            n => (n - 1) as u32,
        };
        Ok(())
    }

    fn decode_segs(
        &self,
        lump: &Lump,
        layout: SegLayout,
        options: &LoadOptions,
    ) -> Result<Vec<Segment>, MapError> {
        decode_records(
            layout.lump(),
            lump.data(),
            layout.header(),
            layout.size(),
            |i, r| {
                let raw = RawSeg::read(layout, r, self.gl_vertex_start)?;
                self.build_seg(layout.lump(), i, raw, options)
            },
        )
    }

    fn build_seg(
        &self,
        lump: &'static str,
        record: usize,
        raw: RawSeg,
        options: &LoadOptions,
    ) -> Result<Segment, MapError> {
        let v1 = check_index(lump, record, "start vertex", raw.v1, self.vertexes.len())?;
        let v2 = check_index(lump, record, "end vertex", raw.v2, self.vertexes.len())?;
        if raw.side > 1 {
            return Err(MapError::InvalidSegSide {
                lump,
                record,
                side: raw.side,
            });
        }
        let side = raw.side as usize;
        let angle = raw
            .angle
            .unwrap_or_else(|| angle_between(self.vertexes[v1], self.vertexes[v2]));

        let Some(linedef) = raw.linedef else {
            return Ok(Segment {
                v1,
                v2,
                offset: FixedPoint::zero(),
                angle,
                linedef: None,
                side: side as u8,
                sidedef: None,
                frontsector: None,
                backsector: None,
            });
        };
        let linedef = check_index(lump, record, "linedef", linedef, self.linedefs.len())?;
        let line = &self.linedefs[linedef];
        let sides = line.sides();

        let sidedef = sides[side];
        if sidedef.is_none() {
            if !options.vanilla_compat {
                return Err(MapError::SegMissingSide {
                    lump,
                    record,
                    side: raw.side,
                });
            }
            warn!(
                "{}: Seg {} is on side {} of linedef {} which has no sidedef there",
                self.name, record, side, linedef
            );
        }

        let backsector = if line.is_two_sided() {
            match sides[side ^ 1] {
                Some(other) => Some(self.sidedefs[other].sector),
                None if options.vanilla_compat => {
                    warn!(
                        "{}: Two-sided seg {} has no back side, treating as one-sided",
                        self.name, record
                    );
                    None
                }
                None => return Err(MapError::TwoSidedSegMissingOtherSide { lump, record }),
            }
        } else {
            None
        };

        // Node builders do not agree on the stored offset, so measure it
        let line_start = if side == 0 { line.v1 } else { line.v2 };
        let offset = self.vertexes[line_start].distance(self.vertexes[v1]);

        Ok(Segment {
            v1,
            v2,
            offset,
            angle,
            linedef: Some(linedef),
            side: side as u8,
            sidedef,
            frontsector: sidedef.map(|s| self.sidedefs[s].sector),
            backsector,
        })
    }

    fn decode_subsectors(
        &self,
        lump: &Lump,
        layout: SubSectorLayout,
    ) -> Result<Vec<SubSector>, MapError> {
        let segs = &self.segments;
        decode_records(
            layout.lump(),
            lump.data(),
            layout.header(),
            layout.size(),
            |i, r| {
                let (seg_count, start_seg) = layout.read(r)?;
                let end = start_seg as usize + seg_count as usize;
                if end > segs.len() {
                    return Err(MapError::InvalidIndex {
                        lump: layout.lump(),
                        record: i,
                        field: "first seg",
                        index: start_seg as usize,
                        len: segs.len(),
                    });
                }
                Ok(SubSector {
                    sector: segs[start_seg as usize..end]
                        .iter()
                        .find_map(|seg| seg.frontsector),
                    seg_count,
                    start_seg,
                })
            },
        )
    }

    fn decode_nodes(&self, lump: &Lump, layout: NodeLayout) -> Result<Vec<Node>, MapError> {
        let (header, size) = match layout {
            NodeLayout::Short(_) => (0, 28),
            NodeLayout::Long(_, header) => (header, 32),
        };
        let nodes = decode_records(layout.lump(), lump.data(), header, size, |_, r| {
            let fixed = |offset| -> Result<FixedPoint, MapError> {
                Ok(FixedPoint::from(r.read_i16(offset)?))
            };
            let bbox = |offset| -> Result<BBox, MapError> {
                Ok(BBox {
                    top: fixed(offset)?,
                    bottom: fixed(offset + 2)?,
                    left: fixed(offset + 4)?,
                    right: fixed(offset + 6)?,
                })
            };
            let child = |offset| -> Result<u32, MapError> {
                Ok(match layout {
                    NodeLayout::Short(_) => {
                        let child = r.read_u16(offset)?;
                        if child & IS_OLD_SSECTOR_MASK != 0 {
                            IS_SSECTOR_MASK | (child & !IS_OLD_SSECTOR_MASK) as u32
                        } else {
                            child as u32
                        }
                    }
                    NodeLayout::Long(..) => r.read_u32(offset)?,
                })
            };
            let child_offset = if size == 28 { 2 } else { 4 };

            Ok(Node {
                xy: FixedVertex::new(fixed(0)?, fixed(2)?),
                delta: FixedVertex::new(fixed(4)?, fixed(6)?),
                bboxes: [bbox(8)?, bbox(16)?],
                children: [child(24)?, child(24 + child_offset)?],
            })
        })?;

        for (i, node) in nodes.iter().enumerate() {
            for side in 0..2 {
                let (index, len) = if node.child_is_subsector(side) {
                    (node.child_index(side), self.subsectors.len())
                } else {
                    (node.child_index(side), nodes.len())
                };
                check_index(layout.lump(), i, "child", index, len)?;
            }
        }
        Ok(nodes)
    }
}
