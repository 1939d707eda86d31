//! A small editable map for loader tests

use wad::test_utils::{LumpWriter, WadBuilder};
use wad::{Wad, WadData, WadKind};

use crate::lumps::MapLump;

#[derive(Debug, Clone)]
pub(crate) struct TestLine {
    pub v1: u16,
    pub v2: u16,
    pub flags: u16,
    pub front: u16,
    pub back: u16,
}

#[derive(Debug, Clone)]
pub(crate) struct TestSeg {
    pub v1: u16,
    pub v2: u16,
    pub angle: u16,
    pub linedef: u16,
    pub side: u16,
    pub offset: i16,
}

#[derive(Debug, Clone)]
pub(crate) struct TestNode {
    pub xy: (i16, i16),
    pub delta: (i16, i16),
    /// Top, bottom, left, right for the right then left child
    pub bboxes: [[i16; 4]; 2],
    pub children: [u16; 2],
}

/// A 64x64 room, one sector, four one-sided lines and one subsector. Fields
/// are edited by tests before [`TestMap::build`] writes the lumps.
#[derive(Debug, Clone)]
pub(crate) struct TestMap {
    pub vertexes: Vec<(i16, i16)>,
    pub sidedef_sectors: Vec<u16>,
    pub linedefs: Vec<TestLine>,
    pub extra_linedef_bytes: usize,
    pub segs: Vec<TestSeg>,
    /// (seg count, first seg)
    pub subsectors: Vec<(u16, u16)>,
    pub nodes: Vec<TestNode>,
    pub blockmap_lines: Vec<u16>,
    /// Leave out the vanilla BSP lumps that have no override, for maps
    /// carrying GL nodes
    pub vanilla_bsp: bool,
    pub segs_override: Option<Vec<u8>>,
    pub subsectors_override: Option<Vec<u8>>,
    pub nodes_override: Option<Vec<u8>>,
    pub gl_vert: Option<Vec<u8>>,
    pub gl_segs: Option<Vec<u8>>,
    pub gl_ssect: Option<Vec<u8>>,
    pub gl_nodes: Option<Vec<u8>>,
}

impl TestMap {
    pub fn square() -> Self {
        let vertexes = vec![(0, 0), (64, 0), (64, 64), (0, 64)];
        let linedefs = (0..4u16)
            .map(|i| TestLine {
                v1: i,
                v2: (i + 1) % 4,
                flags: 1,
                front: i,
                back: 0xFFFF,
            })
            .collect();
        let segs = (0..4u16)
            .map(|i| TestSeg {
                v1: i,
                v2: (i + 1) % 4,
                angle: i << 14,
                linedef: i,
                side: 0,
                offset: 0,
            })
            .collect();

        TestMap {
            vertexes,
            sidedef_sectors: vec![0; 4],
            linedefs,
            extra_linedef_bytes: 0,
            segs,
            subsectors: vec![(4, 0)],
            nodes: Vec::new(),
            blockmap_lines: vec![0, 1, 2, 3],
            vanilla_bsp: true,
            segs_override: None,
            subsectors_override: None,
            nodes_override: None,
            gl_vert: None,
            gl_segs: None,
            gl_ssect: None,
            gl_nodes: None,
        }
    }

    /// Write the map lumps after a `name` marker
    pub fn build(&self, name: &str) -> WadBuilder {
        let things = LumpWriter::new()
            .i16(32)
            .i16(32)
            .i16(90)
            .i16(1)
            .i16(7)
            .finish();

        let vertexes = self
            .vertexes
            .iter()
            .fold(LumpWriter::new(), |w, (x, y)| w.i16(*x).i16(*y))
            .finish();

        let sidedefs = self
            .sidedef_sectors
            .iter()
            .fold(LumpWriter::new(), |w, sector| {
                w.i16(0)
                    .i16(0)
                    .name("-")
                    .name("-")
                    .name("STARTAN3")
                    .u16(*sector)
            })
            .finish();

        let mut linedefs = self
            .linedefs
            .iter()
            .fold(LumpWriter::new(), |w, l| {
                w.u16(l.v1)
                    .u16(l.v2)
                    .u16(l.flags)
                    .i16(0)
                    .i16(0)
                    .u16(l.front)
                    .u16(l.back)
            })
            .finish();
        linedefs.extend(std::iter::repeat_n(0u8, self.extra_linedef_bytes));

        let segs = self
            .segs
            .iter()
            .fold(LumpWriter::new(), |w, s| {
                w.u16(s.v1)
                    .u16(s.v2)
                    .u16(s.angle)
                    .u16(s.linedef)
                    .u16(s.side)
                    .i16(s.offset)
            })
            .finish();

        let subsectors = self
            .subsectors
            .iter()
            .fold(LumpWriter::new(), |w, (count, first)| w.u16(*count).u16(*first))
            .finish();

        let nodes = self
            .nodes
            .iter()
            .fold(LumpWriter::new(), |w, n| {
                let w = w.i16(n.xy.0).i16(n.xy.1).i16(n.delta.0).i16(n.delta.1);
                let w = n
                    .bboxes
                    .iter()
                    .flatten()
                    .fold(w, |w, coord| w.i16(*coord));
                w.u16(n.children[0]).u16(n.children[1])
            })
            .finish();

        let sectors = LumpWriter::new()
            .i16(0)
            .i16(128)
            .name("FLOOR4_8")
            .name("CEIL3_5")
            .i16(160)
            .i16(0)
            .i16(0)
            .finish();

        // One cell at the origin
        let blockmap = self
            .blockmap_lines
            .iter()
            .fold(
                LumpWriter::new().i16(0).i16(0).i16(1).i16(1).u16(5).u16(0),
                |w, line| w.u16(*line),
            )
            .u16(0xFFFF)
            .finish();

        let bsp = |lump: &Option<Vec<u8>>, vanilla: Vec<u8>| match lump {
            Some(data) => Some(data.clone()),
            None if self.vanilla_bsp => Some(vanilla),
            None => None,
        };

        let mut builder = WadBuilder::pwad()
            .marker(name)
            .lump(MapLump::Things.name(), things)
            .lump(MapLump::LineDefs.name(), linedefs)
            .lump(MapLump::SideDefs.name(), sidedefs)
            .lump(MapLump::Vertexes.name(), vertexes);
        for (lump, data) in [
            (MapLump::Segs, bsp(&self.segs_override, segs)),
            (MapLump::SubSectors, bsp(&self.subsectors_override, subsectors)),
            (MapLump::Nodes, bsp(&self.nodes_override, nodes)),
        ] {
            if let Some(data) = data {
                builder = builder.lump(lump.name(), data);
            }
        }
        builder = builder
            .lump(MapLump::Sectors.name(), sectors)
            .lump(MapLump::Reject.name(), vec![0u8])
            .lump(MapLump::Blockmap.name(), blockmap);

        if let (Some(vert), Some(segs), Some(ssect), Some(nodes)) =
            (&self.gl_vert, &self.gl_segs, &self.gl_ssect, &self.gl_nodes)
        {
            builder = builder
                .marker(&format!("GL_{name}"))
                .lump("GL_VERT", vert.clone())
                .lump("GL_SEGS", segs.clone())
                .lump("GL_SSECT", ssect.clone())
                .lump("GL_NODES", nodes.clone());
        }
        builder
    }
}

pub(crate) fn catalog(builder: WadBuilder) -> WadData {
    let wad = Wad::from_bytes("test.wad", builder.build(), WadKind::Pwad)
        .expect("test map should decode");
    WadData::new(vec![wad]).expect("test catalog should build")
}
