//! Working out which node builder format a map's BSP data is stored in.
//!
//! Most formats announce themselves with a short signature at the start of
//! one of the BSP lumps:
//!
//! | Version                          | Lump       | Signature      |
//! |----------------------------------|------------|----------------|
//! | DeepBSP v4                       | `NODES`    | `xNd4\0\0\0\0` |
//! | ZDoom extended                   | `NODES`    | `XNOD`         |
//! | ZDoom extended, compressed       | `NODES`    | `ZNOD`         |
//! | ZDoom extended GL                | `SSECTORS` | `XGLN`         |
//! | ZDoom extended GL, compressed    | `SSECTORS` | `ZGLN`         |
//! | ZDoom extended GL v2             | `ZNODES`   | `XGL2`         |
//! | ZDoom extended GL v2, compressed | `ZNODES`   | `ZGL2`         |
//! | GL nodes v2                      | `GL_VERT`  | `gNd2`         |
//! | GL nodes v3                      | `GL_SEGS`  | `gNd3`         |
//! | GL nodes v4                      | `GL_VERT`  | `gNd4`         |
//! | GL nodes v5                      | `GL_VERT`  | `gNd5`         |
//!
//! No signature at all means vanilla nodes, or GL nodes v1 when the GL lumps
//! exist.

use std::fmt;

use log::debug;
use wad::ByteCursor;

use crate::error::MapError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodesVersion {
    #[default]
    Vanilla,
    DeepBsp4,
    ZdoomExtended,
    ZdoomExtendedCompressed,
    ZdoomExtendedGl,
    ZdoomExtendedCompressedGl,
    ZdoomExtendedGlUdmf,
    ZdoomExtendedCompressedGlUdmf,
    GlNodes1,
    GlNodes2,
    GlNodes3,
    GlNodes4,
    GlNodes5,
}

impl NodesVersion {
    /// True for the layouts that keep their BSP data in the `GL_*` lumps
    pub const fn is_gl(self) -> bool {
        matches!(
            self,
            NodesVersion::GlNodes1
                | NodesVersion::GlNodes2
                | NodesVersion::GlNodes3
                | NodesVersion::GlNodes4
                | NodesVersion::GlNodes5
        )
    }

    /// True for the layouts that can be decoded
    pub const fn is_supported(self) -> bool {
        !matches!(
            self,
            NodesVersion::ZdoomExtended
                | NodesVersion::ZdoomExtendedCompressed
                | NodesVersion::ZdoomExtendedGl
                | NodesVersion::ZdoomExtendedCompressedGl
                | NodesVersion::ZdoomExtendedGlUdmf
                | NodesVersion::ZdoomExtendedCompressedGlUdmf
        )
    }
}

impl fmt::Display for NodesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodesVersion::Vanilla => "vanilla",
            NodesVersion::DeepBsp4 => "DeepBSP v4",
            NodesVersion::ZdoomExtended => "ZDoom extended",
            NodesVersion::ZdoomExtendedCompressed => "ZDoom extended compressed",
            NodesVersion::ZdoomExtendedGl => "ZDoom extended GL",
            NodesVersion::ZdoomExtendedCompressedGl => "ZDoom extended compressed GL",
            NodesVersion::ZdoomExtendedGlUdmf => "ZDoom extended GL UDMF",
            NodesVersion::ZdoomExtendedCompressedGlUdmf => "ZDoom extended compressed GL UDMF",
            NodesVersion::GlNodes1 => "GL v1",
            NodesVersion::GlNodes2 => "GL v2",
            NodesVersion::GlNodes3 => "GL v3",
            NodesVersion::GlNodes4 => "GL v4",
            NodesVersion::GlNodes5 => "GL v5",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureLump {
    Nodes,
    SubSectors,
    /// UDMF maps only, which are not loaded
    ZNodes,
    GlVert,
    GlSegs,
}

impl SignatureLump {
    const fn name(self) -> &'static str {
        match self {
            SignatureLump::Nodes => "NODES",
            SignatureLump::SubSectors => "SSECTORS",
            SignatureLump::ZNodes => "ZNODES",
            SignatureLump::GlVert => "GL_VERT",
            SignatureLump::GlSegs => "GL_SEGS",
        }
    }
}

const SIGNATURES: [(NodesVersion, SignatureLump, &[u8]); 11] = [
    (NodesVersion::DeepBsp4, SignatureLump::Nodes, b"xNd4\0\0\0\0"),
    (NodesVersion::ZdoomExtended, SignatureLump::Nodes, b"XNOD"),
    (NodesVersion::ZdoomExtendedCompressed, SignatureLump::Nodes, b"ZNOD"),
    (NodesVersion::ZdoomExtendedGl, SignatureLump::SubSectors, b"XGLN"),
    (NodesVersion::ZdoomExtendedCompressedGl, SignatureLump::SubSectors, b"ZGLN"),
    (NodesVersion::ZdoomExtendedGlUdmf, SignatureLump::ZNodes, b"XGL2"),
    (NodesVersion::ZdoomExtendedCompressedGlUdmf, SignatureLump::ZNodes, b"ZGL2"),
    (NodesVersion::GlNodes2, SignatureLump::GlVert, b"gNd2"),
    (NodesVersion::GlNodes3, SignatureLump::GlSegs, b"gNd3"),
    (NodesVersion::GlNodes4, SignatureLump::GlVert, b"gNd4"),
    (NodesVersion::GlNodes5, SignatureLump::GlVert, b"gNd5"),
];

/// The lump contents a nodes version is decided from. `None` for a lump the
/// map does not have. The GL lumps are either all present or all absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodesCandidates<'a> {
    pub nodes: Option<&'a [u8]>,
    pub subsectors: Option<&'a [u8]>,
    pub gl_vert: Option<&'a [u8]>,
    pub gl_segs: Option<&'a [u8]>,
}

impl<'a> NodesCandidates<'a> {
    fn lump(&self, lump: SignatureLump) -> Option<&'a [u8]> {
        match lump {
            SignatureLump::Nodes => self.nodes,
            SignatureLump::SubSectors => self.subsectors,
            SignatureLump::GlVert => self.gl_vert,
            SignatureLump::GlSegs => self.gl_segs,
            SignatureLump::ZNodes => None,
        }
    }

    fn has_gl_lumps(&self) -> bool {
        self.gl_vert.is_some()
    }
}

/// Check every known signature against the candidate lumps.
///
/// An empty lump never matches. A non-empty lump shorter than a signature is
/// a truncated header. GL v3 maps carry both the v2 and v3 signatures, every
/// other combination of matches is ambiguous.
pub fn detect_nodes_version(candidates: &NodesCandidates) -> Result<NodesVersion, MapError> {
    let mut found = Vec::new();

    for (version, lump, signature) in SIGNATURES {
        let Some(data) = candidates.lump(lump) else {
            continue;
        };
        if data.is_empty() {
            continue;
        }
        let matched = ByteCursor::new(data)
            .starts_with(signature)
            .map_err(|_| MapError::TruncatedHeader {
                lump: lump.name(),
                version,
                len: data.len(),
            })?;
        if matched {
            debug!("Found {} signature in {}", version, lump.name());
            found.push(version);
        }
    }

    let version = match found.as_slice() {
        [] if candidates.has_gl_lumps() => Some(NodesVersion::GlNodes1),
        [] => Some(NodesVersion::Vanilla),
        [version] => Some(*version),
        [NodesVersion::GlNodes2, NodesVersion::GlNodes3] => Some(NodesVersion::GlNodes3),
        _ => None,
    };
    version.ok_or(MapError::AmbiguousNodesVersion(found))
}

#[cfg(test)]
mod tests {
    use super::{NodesCandidates, NodesVersion, detect_nodes_version};
    use crate::error::MapError;

    const VANILLA_NODE: [u8; 28] = [0; 28];

    #[test]
    fn vanilla_without_signatures() {
        let candidates = NodesCandidates {
            nodes: Some(&VANILLA_NODE),
            subsectors: Some(&[1, 0, 0, 0]),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::Vanilla
        );
    }

    #[test]
    fn gl_v1_without_signatures() {
        let candidates = NodesCandidates {
            nodes: Some(&VANILLA_NODE),
            gl_vert: Some(&[0, 0, 0, 0]),
            gl_segs: Some(&[0; 10]),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::GlNodes1
        );
    }

    #[test]
    fn single_signatures() {
        let deep = *b"xNd4\0\0\0\0";
        let candidates = NodesCandidates {
            nodes: Some(&deep),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::DeepBsp4
        );

        let candidates = NodesCandidates {
            nodes: Some(b"XNOD...."),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::ZdoomExtended
        );

        let candidates = NodesCandidates {
            subsectors: Some(b"ZGLN"),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::ZdoomExtendedCompressedGl
        );

        let candidates = NodesCandidates {
            gl_vert: Some(b"gNd5"),
            gl_segs: Some(&[0; 16]),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::GlNodes5
        );
    }

    #[test]
    fn gl_v2_and_v3_signatures_mean_v3() {
        let candidates = NodesCandidates {
            gl_vert: Some(b"gNd2"),
            gl_segs: Some(b"gNd3"),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::GlNodes3
        );
    }

    #[test]
    fn conflicting_signatures() {
        let candidates = NodesCandidates {
            nodes: Some(b"XNOD\0\0\0\0"),
            gl_vert: Some(b"gNd5"),
            gl_segs: Some(&[0; 16]),
            ..Default::default()
        };
        match detect_nodes_version(&candidates) {
            Err(MapError::AmbiguousNodesVersion(found)) => assert_eq!(
                found,
                vec![NodesVersion::ZdoomExtended, NodesVersion::GlNodes5]
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_lumps_do_not_match() {
        let candidates = NodesCandidates {
            nodes: Some(&[]),
            subsectors: Some(&[]),
            ..Default::default()
        };
        assert_eq!(
            detect_nodes_version(&candidates).unwrap(),
            NodesVersion::Vanilla
        );
    }

    #[test]
    fn short_lump_is_truncated_header() {
        let candidates = NodesCandidates {
            nodes: Some(b"xNd"),
            ..Default::default()
        };
        assert!(matches!(
            detect_nodes_version(&candidates),
            Err(MapError::TruncatedHeader { lump: "NODES", .. })
        ));
    }
}
