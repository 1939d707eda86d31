//! Locating the lumps that make up a map.
//!
//! A map is a marker lump (`E1M1`, `MAP01`, ...) followed by its data lumps in
//! a fixed order. Maps built with GL nodes also have a second marker named
//! `GL_<map>` with its own fixed run of lumps, and may leave out the vanilla
//! lumps those replace.

use log::debug;
use wad::{Lump, WadData};

use crate::error::{MapError, Unimplemented};
use crate::nodes_version::NodesCandidates;

/// The lumps following a map marker, valued by their offset from it in a
/// complete map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLump {
    /// Position and type of map objects
    Things = 1,
    /// Lines that make up walls and boundaries
    LineDefs,
    /// Texture information for each side of a linedef
    SideDefs,
    /// Map vertices
    Vertexes,
    /// Segments of linedefs, split by the node builder
    Segs,
    /// Convex areas made of segs
    SubSectors,
    /// The BSP tree
    Nodes,
    /// Floor and ceiling areas
    Sectors,
    /// Sector to sector visibility table
    Reject,
    /// Collision grid of lines
    Blockmap,
    /// Hexen ACS scripts
    Behavior,
}

impl MapLump {
    pub(crate) const VANILLA: [MapLump; 10] = [
        MapLump::Things,
        MapLump::LineDefs,
        MapLump::SideDefs,
        MapLump::Vertexes,
        MapLump::Segs,
        MapLump::SubSectors,
        MapLump::Nodes,
        MapLump::Sectors,
        MapLump::Reject,
        MapLump::Blockmap,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            MapLump::Things => "THINGS",
            MapLump::LineDefs => "LINEDEFS",
            MapLump::SideDefs => "SIDEDEFS",
            MapLump::Vertexes => "VERTEXES",
            MapLump::Segs => "SEGS",
            MapLump::SubSectors => "SSECTORS",
            MapLump::Nodes => "NODES",
            MapLump::Sectors => "SECTORS",
            MapLump::Reject => "REJECT",
            MapLump::Blockmap => "BLOCKMAP",
            MapLump::Behavior => "BEHAVIOR",
        }
    }

    /// Lumps a GL nodes build may leave out, since the GL lumps replace them
    const fn replaced_by_gl(self) -> bool {
        matches!(
            self,
            MapLump::Vertexes | MapLump::Segs | MapLump::SubSectors | MapLump::Nodes
        )
    }
}

/// The lumps following a `GL_<map>` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlLump {
    /// Extra vertices created by the node builder
    Vert = 1,
    Segs,
    SubSectors,
    Nodes,
    /// Optional potentially visible set
    Pvs,
}

impl GlLump {
    pub const fn name(self) -> &'static str {
        match self {
            GlLump::Vert => "GL_VERT",
            GlLump::Segs => "GL_SEGS",
            GlLump::SubSectors => "GL_SSECT",
            GlLump::Nodes => "GL_NODES",
            GlLump::Pvs => "GL_PVS",
        }
    }
}

/// The lumps after a `GL_<map>` marker
#[derive(Debug, Clone, Copy)]
pub struct GlLumps<'a> {
    pub vert: &'a Lump,
    pub segs: &'a Lump,
    pub subsectors: &'a Lump,
    pub nodes: &'a Lump,
    pub pvs: Option<&'a Lump>,
}

/// Every lump of one map, checked for presence and order
#[derive(Debug, Clone)]
pub struct MapLumps<'a> {
    /// Upper case map name
    pub name: String,
    pub marker: &'a Lump,
    pub things: &'a Lump,
    pub linedefs: &'a Lump,
    pub sidedefs: &'a Lump,
    pub vertexes: Option<&'a Lump>,
    pub segs: Option<&'a Lump>,
    pub subsectors: Option<&'a Lump>,
    pub nodes: Option<&'a Lump>,
    pub sectors: &'a Lump,
    pub reject: &'a Lump,
    pub blockmap: &'a Lump,
    pub gl: Option<GlLumps<'a>>,
}

impl<'a> MapLumps<'a> {
    /// Find the map marker and check the lumps after it. The last archive
    /// loaded that carries the marker wins.
    pub fn locate(wad: &'a WadData, map_name: &str) -> Result<Self, MapError> {
        let name = map_name.to_ascii_uppercase();
        let marker = wad
            .lump(&name)
            .ok_or_else(|| MapError::MapNotFound(name.clone()))?;
        let base = marker.index();

        if wad
            .lump_at(base + 1)
            .is_some_and(|l| l.name() == "TEXTMAP")
        {
            return Err(MapError::NotImplemented(Unimplemented::Udmf));
        }

        let gl = locate_gl(wad, &name)?;

        // A lump GL nodes replace may be left out, the rest have to follow
        // the marker in order
        let mut found: [Option<&'a Lump>; 10] = [None; 10];
        let mut next = base + 1;
        for (slot, lump) in found.iter_mut().zip(MapLump::VANILLA) {
            match wad.lump_at(next) {
                Some(l) if l.name() == lump.name() => {
                    *slot = Some(l);
                    next += 1;
                }
                _ if gl.is_some() && lump.replaced_by_gl() => {
                    debug!("{}: No {} lump, using GL nodes", name, lump.name());
                }
                Some(l) => {
                    return Err(MapError::JumbledLumps {
                        map: name,
                        expected: lump.name(),
                        found: l.name().to_string(),
                    });
                }
                None => {
                    return Err(MapError::MissingLump {
                        map: name,
                        lump: lump.name(),
                    });
                }
            }
        }

        if wad
            .lump_at(next)
            .is_some_and(|l| l.name() == MapLump::Behavior.name())
        {
            return Err(MapError::NotImplemented(Unimplemented::HexenFormat));
        }

        let required = |lump: MapLump| {
            found[lump as usize - 1].ok_or_else(|| MapError::MissingLump {
                map: name.clone(),
                lump: lump.name(),
            })
        };
        let things = required(MapLump::Things)?;
        let linedefs = required(MapLump::LineDefs)?;
        let sidedefs = required(MapLump::SideDefs)?;
        let sectors = required(MapLump::Sectors)?;
        let reject = required(MapLump::Reject)?;
        let blockmap = required(MapLump::Blockmap)?;

        Ok(MapLumps {
            marker,
            things,
            linedefs,
            sidedefs,
            vertexes: found[MapLump::Vertexes as usize - 1],
            segs: found[MapLump::Segs as usize - 1],
            subsectors: found[MapLump::SubSectors as usize - 1],
            nodes: found[MapLump::Nodes as usize - 1],
            sectors,
            reject,
            blockmap,
            gl,
            name,
        })
    }

    /// The lump data the nodes version is decided from
    pub fn nodes_candidates(&self) -> NodesCandidates<'a> {
        NodesCandidates {
            nodes: self.nodes.map(Lump::data),
            subsectors: self.subsectors.map(Lump::data),
            gl_vert: self.gl.map(|gl| gl.vert.data()),
            gl_segs: self.gl.map(|gl| gl.segs.data()),
        }
    }

    pub(crate) fn vanilla(&self, lump: MapLump) -> Result<&'a Lump, MapError> {
        let found = match lump {
            MapLump::Vertexes => self.vertexes,
            MapLump::Segs => self.segs,
            MapLump::SubSectors => self.subsectors,
            MapLump::Nodes => self.nodes,
            _ => None,
        };
        found.ok_or_else(|| MapError::MissingLump {
            map: self.name.clone(),
            lump: lump.name(),
        })
    }

    pub(crate) fn gl(&self) -> Result<GlLumps<'a>, MapError> {
        self.gl.ok_or_else(|| MapError::MissingLump {
            map: self.name.clone(),
            lump: "GL_VERT",
        })
    }
}

fn locate_gl<'a>(wad: &'a WadData, map_name: &str) -> Result<Option<GlLumps<'a>>, MapError> {
    let gl_name = format!("GL_{map_name}");
    let Some(marker) = wad.lump(&gl_name) else {
        return Ok(None);
    };
    let base = marker.index();
    debug!("{}: Found GL nodes marker {}", map_name, gl_name);

    let required = |lump: GlLump| match wad.lump_at(base + lump as usize) {
        Some(l) if l.name() == lump.name() => Ok(l),
        Some(l) => Err(MapError::JumbledLumps {
            map: gl_name.clone(),
            expected: lump.name(),
            found: l.name().to_string(),
        }),
        None => Err(MapError::MissingLump {
            map: gl_name.clone(),
            lump: lump.name(),
        }),
    };

    Ok(Some(GlLumps {
        vert: required(GlLump::Vert)?,
        segs: required(GlLump::Segs)?,
        subsectors: required(GlLump::SubSectors)?,
        nodes: required(GlLump::Nodes)?,
        pvs: wad
            .lump_at(base + GlLump::Pvs as usize)
            .filter(|l| l.name() == GlLump::Pvs.name()),
    }))
}

/// Names of every map in the catalog, in directory order. A marker is any lump
/// followed by `THINGS` (or `TEXTMAP` for UDMF maps).
pub fn map_names(wad: &WadData) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for pair in wad.lumps().windows(2) {
        let next = pair[1].name();
        if next == "THINGS" || next == "TEXTMAP" {
            let name = pair[0].name().to_ascii_uppercase().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}
