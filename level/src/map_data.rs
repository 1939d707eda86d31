use log::{debug, info, warn};
use math::{FixedPoint, FixedVertex};
use wad::{ByteCursor, Lump, LumpName, Namespace, WadData};

use crate::blockmap::Blockmap;
use crate::error::{MapError, Unimplemented};
use crate::lumps::{MapLump, MapLumps};
use crate::nodes_version::{NodesVersion, detect_nodes_version};
use crate::options::LoadOptions;
use crate::records::{check_index, decode_records};
use crate::{BBox, LineDef, Node, Sector, Segment, SideDef, SlopeType, SubSector, Thing};

mod bsp;

const THING_SIZE: usize = 10;
const VERTEX_SIZE: usize = 4;
const GL_VERTEX_SIZE: usize = 8;
const GL_VERT_HEADER_SIZE: usize = 4;
const SECTOR_SIZE: usize = 26;
const SIDEDEF_SIZE: usize = 30;
const LINEDEF_SIZE: usize = 14;
const NO_SIDEDEF: u16 = 0xFFFF;

/// A fully decoded map. Every index held by one record in to another array is
/// checked during [`MapData::load`], so lookups through them cannot fail.
///
/// `nodes`, `subsectors`, and `segments` are the BSP tree used to render and
/// walk the level. Vertices added by a GL node builder follow the map's own
/// vertices, starting at [`MapData::gl_vertex_start`].
#[derive(Debug, Default, Clone)]
pub struct MapData {
    name: String,
    nodes_version: NodesVersion,
    things: Vec<Thing>,
    vertexes: Vec<FixedVertex>,
    gl_vertex_start: usize,
    sectors: Vec<Sector>,
    sidedefs: Vec<SideDef>,
    linedefs: Vec<LineDef>,
    segments: Vec<Segment>,
    subsectors: Vec<SubSector>,
    nodes: Vec<Node>,
    start_node: u32,
    blockmap: Blockmap,
    reject: Vec<u8>,
}

impl MapData {
    /// Load `map_name` from the catalog. Either the whole map loads or an
    /// error is returned, nothing partially decoded is handed back.
    pub fn load(wad: &WadData, map_name: &str, options: &LoadOptions) -> Result<Self, MapError> {
        let lumps = MapLumps::locate(wad, map_name)?;
        let nodes_version = detect_nodes_version(&lumps.nodes_candidates())?;
        info!("{}: Nodes version is {}", lumps.name, nodes_version);
        if !nodes_version.is_supported() {
            return Err(MapError::NotImplemented(Unimplemented::Nodes(
                nodes_version,
            )));
        }

        let mut map = MapData {
            name: lumps.name.clone(),
            nodes_version,
            ..MapData::default()
        };
        map.load_things(&lumps)?;
        map.load_vertexes(&lumps)?;
        map.load_sectors(&lumps, wad, options)?;
        map.load_sidedefs(&lumps)?;
        map.load_linedefs(&lumps)?;
        map.load_blockmap(&lumps, options)?;
        map.load_reject(&lumps)?;
        // Segs need the linedefs, subsectors the segs, and nodes both
        map.load_bsp(&lumps, options)?;
        Ok(map)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes_version(&self) -> NodesVersion {
        self.nodes_version
    }

    pub fn things(&self) -> &[Thing] {
        &self.things
    }

    pub fn vertexes(&self) -> &[FixedVertex] {
        &self.vertexes
    }

    /// Index of the first vertex that came from `GL_VERT`
    pub fn gl_vertex_start(&self) -> usize {
        self.gl_vertex_start
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sidedefs(&self) -> &[SideDef] {
        &self.sidedefs
    }

    pub fn linedefs(&self) -> &[LineDef] {
        &self.linedefs
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn subsectors(&self) -> &[SubSector] {
        &self.subsectors
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Root of the BSP tree. A map without nodes is a single subsector.
    pub fn start_node(&self) -> u32 {
        self.start_node
    }

    pub fn blockmap(&self) -> &Blockmap {
        &self.blockmap
    }

    pub fn reject(&self) -> &[u8] {
        &self.reject
    }

    fn load_things(&mut self, lumps: &MapLumps) -> Result<(), MapError> {
        self.things = decode_records("THINGS", lumps.things.data(), 0, THING_SIZE, |_, r| {
            Ok(Thing {
                x: r.read_i16(0)?,
                y: r.read_i16(2)?,
                angle: r.read_i16(4)?,
                kind: r.read_i16(6)?,
                flags: r.read_i16(8)?,
            })
        })?;
        info!("{}: Loaded {} things", self.name, self.things.len());
        Ok(())
    }

    fn load_vertexes(&mut self, lumps: &MapLumps) -> Result<(), MapError> {
        let map_units = |_: usize, r: ByteCursor<'_>| -> Result<FixedVertex, MapError> {
            Ok(FixedVertex::from_map_units(r.read_i16(0)?, r.read_i16(2)?))
        };

        if let Some(lump) = lumps.vertexes {
            self.vertexes = decode_records("VERTEXES", lump.data(), 0, VERTEX_SIZE, map_units)?;
        }
        self.gl_vertex_start = self.vertexes.len();
        info!("{}: Loaded {} vertexes", self.name, self.vertexes.len());

        if !self.nodes_version.is_gl() {
            return Ok(());
        }
        let gl = lumps.gl()?;
        let gl_vertexes = if self.nodes_version == NodesVersion::GlNodes1 {
            decode_records("GL_VERT", gl.vert.data(), 0, VERTEX_SIZE, map_units)?
        } else {
            // Anything newer has a signature and full fixed point vertices
            decode_records(
                "GL_VERT",
                gl.vert.data(),
                GL_VERT_HEADER_SIZE,
                GL_VERTEX_SIZE,
                |_, r| {
                    Ok(FixedVertex::new(
                        FixedPoint::new(r.read_i32(0)?),
                        FixedPoint::new(r.read_i32(4)?),
                    ))
                },
            )?
        };
        self.vertexes.try_reserve_exact(gl_vertexes.len())?;
        self.vertexes.extend(gl_vertexes);
        info!(
            "{}: Loaded {} GL vertexes",
            self.name,
            self.vertexes.len() - self.gl_vertex_start
        );
        Ok(())
    }

    fn load_sectors(
        &mut self,
        lumps: &MapLumps,
        wad: &WadData,
        options: &LoadOptions,
    ) -> Result<(), MapError> {
        let find_flat = |name: LumpName| {
            if !options.resolve_flats {
                return None;
            }
            let found = wad
                .lump_ns(&name.to_ascii_uppercase().as_str(), Namespace::Flats)
                .map(Lump::index);
            if found.is_none() {
                debug!("Sectors: Did not find flat for {}", name);
            }
            found
        };

        self.sectors = decode_records("SECTORS", lumps.sectors.data(), 0, SECTOR_SIZE, |i, r| {
            let floorpic = r.read_name(4)?;
            let ceilingpic = r.read_name(12)?;
            Ok(Sector {
                num: i,
                floorheight: FixedPoint::from(r.read_i16(0)?),
                ceilingheight: FixedPoint::from(r.read_i16(2)?),
                floorpic,
                ceilingpic,
                floor_flat: find_flat(floorpic),
                ceiling_flat: find_flat(ceilingpic),
                lightlevel: r.read_i16(20)?,
                special: r.read_i16(22)?,
                tag: r.read_i16(24)?,
            })
        })?;
        info!("{}: Loaded {} sectors", self.name, self.sectors.len());
        Ok(())
    }

    fn load_sidedefs(&mut self, lumps: &MapLumps) -> Result<(), MapError> {
        let sector_count = self.sectors.len();
        self.sidedefs =
            decode_records("SIDEDEFS", lumps.sidedefs.data(), 0, SIDEDEF_SIZE, |i, r| {
                Ok(SideDef {
                    textureoffset: FixedPoint::from(r.read_i16(0)?),
                    rowoffset: FixedPoint::from(r.read_i16(2)?),
                    toptexture: r.read_name(4)?.to_ascii_uppercase(),
                    bottomtexture: r.read_name(12)?.to_ascii_uppercase(),
                    midtexture: r.read_name(20)?.to_ascii_uppercase(),
                    sector: check_index(
                        "SIDEDEFS",
                        i,
                        "sector",
                        r.read_u16(28)? as usize,
                        sector_count,
                    )?,
                })
            })?;
        info!("{}: Loaded {} sidedefs", self.name, self.sidedefs.len());
        Ok(())
    }

    fn load_linedefs(&mut self, lumps: &MapLumps) -> Result<(), MapError> {
        let vertexes = &self.vertexes;
        let sidedefs = &self.sidedefs;
        self.linedefs =
            decode_records("LINEDEFS", lumps.linedefs.data(), 0, LINEDEF_SIZE, |i, r| {
                let vertex = |offset, field| -> Result<usize, MapError> {
                    check_index("LINEDEFS", i, field, r.read_u16(offset)? as usize, vertexes.len())
                };
                let v1 = vertex(0, "start vertex")?;
                let v2 = vertex(2, "end vertex")?;

                let front_sidedef = check_index(
                    "LINEDEFS",
                    i,
                    "front sidedef",
                    r.read_u16(10)? as usize,
                    sidedefs.len(),
                )?;
                let back_sidedef = match r.read_u16(12)? {
                    NO_SIDEDEF => None,
                    back => Some(check_index(
                        "LINEDEFS",
                        i,
                        "back sidedef",
                        back as usize,
                        sidedefs.len(),
                    )?),
                };

                let delta = FixedVertex::new(
                    vertexes[v2].x - vertexes[v1].x,
                    vertexes[v2].y - vertexes[v1].y,
                );
                Ok(LineDef {
                    v1,
                    v2,
                    delta,
                    flags: r.read_u16(4)?,
                    special: r.read_i16(6)?,
                    tag: r.read_i16(8)?,
                    bbox: BBox::new(vertexes[v1], vertexes[v2]),
                    slopetype: SlopeType::from_delta(delta),
                    front_sidedef,
                    back_sidedef,
                    frontsector: sidedefs[front_sidedef].sector,
                    backsector: back_sidedef.map(|back| sidedefs[back].sector),
                })
            })?;
        info!("{}: Loaded {} linedefs", self.name, self.linedefs.len());
        Ok(())
    }

    fn load_blockmap(&mut self, lumps: &MapLumps, options: &LoadOptions) -> Result<(), MapError> {
        if options.force_blockmap_rebuild {
            self.blockmap = Blockmap::build(&self.vertexes, &self.linedefs)?;
            info!(
                "{}: Built blockmap, {} blocks",
                self.name,
                self.blockmap.columns * self.blockmap.rows
            );
            return Ok(());
        }

        self.blockmap = match self.decode_blockmap(lumps.blockmap) {
            Ok(blockmap) => blockmap,
            Err(e) if options.rebuild_invalid_blockmap => {
                warn!("{}: Rebuilding invalid blockmap: {}", self.name, e);
                Blockmap::build(&self.vertexes, &self.linedefs)?
            }
            Err(e) => return Err(e),
        };
        info!(
            "{}: Loaded blockmap, {} blocks",
            self.name,
            self.blockmap.columns * self.blockmap.rows
        );
        Ok(())
    }

    fn decode_blockmap(&self, lump: &Lump) -> Result<Blockmap, MapError> {
        let blockmap = Blockmap::from_lump(lump.data())?;
        if let Some((cell, line)) = blockmap.first_invalid_line(self.linedefs.len()) {
            return Err(MapError::InvalidIndex {
                lump: MapLump::Blockmap.name(),
                record: cell,
                field: "wall",
                index: line as usize,
                len: self.linedefs.len(),
            });
        }
        Ok(blockmap)
    }

    fn load_reject(&mut self, lumps: &MapLumps) -> Result<(), MapError> {
        let data = lumps.reject.data();
        self.reject.try_reserve_exact(data.len())?;
        self.reject.extend_from_slice(data);
        info!("{}: Loaded {} reject bytes", self.name, self.reject.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MapData;
    use crate::error::MapError;
    use crate::options::LoadOptions;
    use crate::test_map::{TestMap, catalog};
    use crate::{LineDefFlags, NodesVersion, SlopeType};
    use math::{FixedPoint, FixedVertex};
    use pretty_assertions::assert_eq;
    use wad::ErrorKind;

    #[test]
    fn load_square_room() {
        let wad = catalog(TestMap::square().build("E1M1"));
        let map = MapData::load(&wad, "e1m1", &LoadOptions::default()).unwrap();

        assert_eq!(map.name(), "E1M1");
        assert_eq!(map.nodes_version(), NodesVersion::Vanilla);
        assert_eq!(map.things().len(), 1);
        assert_eq!(map.things()[0].kind, 1);
        assert_eq!(map.vertexes().len(), 4);
        assert_eq!(map.vertexes()[2], FixedVertex::from_map_units(64, 64));
        assert_eq!(map.sectors().len(), 1);
        assert_eq!(map.sectors()[0].ceilingheight, FixedPoint::from_int(128));
        assert_eq!(map.sidedefs().len(), 4);
        assert_eq!(map.linedefs().len(), 4);

        let line = &map.linedefs()[0];
        assert_eq!((line.v1, line.v2), (0, 1));
        assert_eq!(line.slopetype, SlopeType::Horizontal);
        assert_eq!(line.delta, FixedVertex::from_map_units(64, 0));
        assert!(line.has_flag(LineDefFlags::Blocking));
        assert_eq!(line.back_sidedef, None);
        assert_eq!(line.frontsector, 0);

        assert_eq!(map.segments().len(), 4);
        assert_eq!(map.subsectors().len(), 1);
        assert_eq!(map.subsectors()[0].sector, Some(0));
        assert!(map.nodes().is_empty());
        assert_eq!(map.start_node(), crate::IS_SSECTOR_MASK);
        assert_eq!(map.blockmap().lines_in_block(0, 0), Some([0u32, 1, 2, 3].as_slice()));
        assert_eq!(map.reject(), &[0]);
    }

    #[test]
    fn flats_are_resolved_in_the_flats_namespace() {
        let builder = TestMap::square()
            .build("MAP01")
            .marker("F_START")
            .lump("FLOOR4_8", vec![0u8; 4096])
            .marker("F_END")
            .lump("CEIL3_5", vec![0u8; 16]);
        let wad = catalog(builder);
        let map = MapData::load(&wad, "MAP01", &LoadOptions::default()).unwrap();
        let sector = &map.sectors()[0];
        assert_eq!(sector.floorpic, "FLOOR4_8");
        assert!(sector.floor_flat.is_some());
        assert_eq!(
            wad.lump_at(sector.floor_flat.unwrap()).unwrap().name(),
            "FLOOR4_8"
        );
        // No such flat, left unresolved
        assert_eq!(sector.ceiling_flat, None);

        let options = LoadOptions {
            resolve_flats: false,
            ..LoadOptions::default()
        };
        let map = MapData::load(&wad, "MAP01", &options).unwrap();
        assert_eq!(map.sectors()[0].floor_flat, None);
    }

    #[test]
    fn bad_start_vertex() {
        let mut test = TestMap::square();
        test.linedefs[1].v1 = 9999;
        let wad = catalog(test.build("E1M1"));
        let err = MapData::load(&wad, "E1M1", &LoadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRangeReference);
        match err {
            MapError::InvalidIndex {
                lump,
                record,
                field,
                index,
                len,
            } => {
                assert_eq!(lump, "LINEDEFS");
                assert_eq!(record, 1);
                assert_eq!(field, "start vertex");
                assert_eq!(index, 9999);
                assert_eq!(len, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_sidedef_sector() {
        let mut test = TestMap::square();
        test.sidedef_sectors[2] = 3;
        let wad = catalog(test.build("E1M1"));
        assert!(matches!(
            MapData::load(&wad, "E1M1", &LoadOptions::default()),
            Err(MapError::InvalidIndex {
                lump: "SIDEDEFS",
                record: 2,
                field: "sector",
                ..
            })
        ));
    }

    #[test]
    fn malformed_lump_size() {
        let mut test = TestMap::square();
        test.extra_linedef_bytes = 3;
        let wad = catalog(test.build("E1M1"));
        assert!(matches!(
            MapData::load(&wad, "E1M1", &LoadOptions::default()),
            Err(MapError::MalformedLump {
                lump: "LINEDEFS",
                len: 59,
                record_size: 14
            })
        ));
    }

    #[test]
    fn front_sidedef_is_required() {
        let mut test = TestMap::square();
        test.linedefs[0].front = 0xFFFF;
        let wad = catalog(test.build("E1M1"));
        assert!(matches!(
            MapData::load(&wad, "E1M1", &LoadOptions::default()),
            Err(MapError::InvalidIndex {
                field: "front sidedef",
                index: 0xFFFF,
                ..
            })
        ));
    }

    #[test]
    fn blockmap_line_out_of_range() {
        let mut test = TestMap::square();
        test.blockmap_lines = vec![0, 1, 2, 7];
        let wad = catalog(test.build("E1M1"));
        assert!(matches!(
            MapData::load(&wad, "E1M1", &LoadOptions::default()),
            Err(MapError::InvalidIndex {
                lump: "BLOCKMAP",
                field: "wall",
                index: 7,
                ..
            })
        ));

        let options = LoadOptions {
            rebuild_invalid_blockmap: true,
            ..LoadOptions::default()
        };
        let map = MapData::load(&wad, "E1M1", &options).unwrap();
        assert_eq!(map.blockmap().lines_in_block(0, 0), Some([0u32, 1, 2, 3].as_slice()));
    }

    #[test]
    fn forced_blockmap_rebuild() {
        let mut test = TestMap::square();
        test.blockmap_lines = vec![3];
        let wad = catalog(test.build("E1M1"));

        let map = MapData::load(&wad, "E1M1", &LoadOptions::default()).unwrap();
        assert_eq!(map.blockmap().lines_in_block(0, 0), Some([3u32].as_slice()));

        let options = LoadOptions {
            force_blockmap_rebuild: true,
            ..LoadOptions::default()
        };
        let map = MapData::load(&wad, "E1M1", &options).unwrap();
        assert_eq!(map.blockmap().lines_in_block(0, 0), Some([0u32, 1, 2, 3].as_slice()));
    }

    #[test]
    fn zdoom_nodes_are_refused() {
        let mut test = TestMap::square();
        test.nodes_override = Some(b"XNOD\0\0\0\0".to_vec());
        let wad = catalog(test.build("E1M1"));
        let err = MapData::load(&wad, "E1M1", &LoadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnimplementedFormat);
    }
}
