//! Decoding of the map lumps in a [`wad::WadData`] in to the geometry, BSP
//! tree and blockmap of a level.
//!
//! A map is a marker lump (`E1M1`, `MAP01`, ...) followed by its data lumps
//! in a fixed order. Node builders may add a `GL_<map>` marker with their own
//! BSP lumps after it. [`MapData::load`] finds those lumps, works out which
//! nodes format they use, and checks every cross reference while decoding.

pub mod blockmap;
mod defs;
pub mod error;
pub mod lumps;
mod map_data;
mod nodes_version;
pub mod options;
mod records;

#[cfg(test)]
pub(crate) mod test_map;

pub use blockmap::{Blockmap, BlockmapError};
pub use defs::*;
pub use error::{MapError, Unimplemented};
pub use lumps::{MapLump, map_names};
pub use map_data::MapData;
pub use nodes_version::{NodesCandidates, NodesVersion, detect_nodes_version};
pub use options::LoadOptions;
pub use wad::ErrorKind;
