use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;
use wad::{ErrorKind, WadError};

use crate::NodesVersion;
use crate::blockmap::BlockmapError;

/// Map formats that are recognised but not loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unimplemented {
    /// `TEXTMAP` follows the map marker
    Udmf,
    /// `BEHAVIOR` follows the map lumps
    HexenFormat,
    /// The BSP data is in a layout without a decoder
    Nodes(NodesVersion),
}

impl fmt::Display for Unimplemented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unimplemented::Udmf => f.write_str("UDMF maps"),
            Unimplemented::HexenFormat => f.write_str("Hexen format maps"),
            Unimplemented::Nodes(version) => write!(f, "{version} nodes"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Wad(#[from] WadError),

    #[error("map {0} not found")]
    MapNotFound(String),

    #[error("{map}: missing {lump} lump")]
    MissingLump { map: String, lump: &'static str },

    /// A map lump is missing from its place after the marker, or misnamed
    #[error("{map}: map lumps are jumbled, expected {expected} but found {found}")]
    JumbledLumps {
        map: String,
        expected: &'static str,
        found: String,
    },

    /// The lump size is not a whole number of records
    #[error("malformed {lump} lump: {len} bytes is not a multiple of {record_size}")]
    MalformedLump {
        lump: &'static str,
        len: usize,
        record_size: usize,
    },

    #[error("invalid {field} index {index} in {lump} record {record} ({len} available)")]
    InvalidIndex {
        lump: &'static str,
        record: usize,
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("invalid side {side} in {lump} record {record} (only 0 or 1 expected)")]
    InvalidSegSide {
        lump: &'static str,
        record: usize,
        side: u16,
    },

    #[error("{lump} record {record} is on side {side} of a line without that side")]
    SegMissingSide {
        lump: &'static str,
        record: usize,
        side: u16,
    },

    #[error("2-sided seg {record} in {lump} is missing the other side")]
    TwoSidedSegMissingOtherSide { lump: &'static str, record: usize },

    /// A candidate lump is shorter than the signature being checked for
    #[error("truncated {lump} header: {len} bytes is too short for the {version} signature")]
    TruncatedHeader {
        lump: &'static str,
        version: NodesVersion,
        len: usize,
    },

    #[error("map has multiple nodes versions: {0:?}")]
    AmbiguousNodesVersion(Vec<NodesVersion>),

    #[error("{0} not implemented")]
    NotImplemented(Unimplemented),

    #[error(transparent)]
    Blockmap(#[from] BlockmapError),

    #[error("allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::Wad(e) => e.kind(),
            MapError::Blockmap(e) => e.kind(),
            MapError::MapNotFound(_) | MapError::MissingLump { .. } => ErrorKind::NotFound,
            MapError::JumbledLumps { .. }
            | MapError::MalformedLump { .. }
            | MapError::InvalidSegSide { .. }
            | MapError::TruncatedHeader { .. } => ErrorKind::MalformedInput,
            MapError::InvalidIndex { .. }
            | MapError::SegMissingSide { .. }
            | MapError::TwoSidedSegMissingOtherSide { .. } => ErrorKind::OutOfRangeReference,
            MapError::AmbiguousNodesVersion(_) => ErrorKind::AmbiguousState,
            MapError::NotImplemented(_) => ErrorKind::UnimplementedFormat,
            MapError::OutOfMemory(_) => ErrorKind::ResourceExhaustion,
        }
    }
}
