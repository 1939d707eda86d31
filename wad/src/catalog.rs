use std::collections::HashMap;

use log::{debug, info};

use crate::{Lump, LumpName, Namespace, Wad, WadError};

/// Start and end marker names for a namespace. Passes are run in this order.
const NAMESPACE_MARKERS: [(&str, &str, Namespace); 5] = [
    ("S_START", "S_END", Namespace::Sprites),
    ("F_START", "F_END", Namespace::Flats),
    ("C_START", "C_END", Namespace::Colormaps),
    ("B_START", "B_END", Namespace::Extended),
    ("HI_START", "HI_END", Namespace::Hires),
];

/// Sprite lumps this size or smaller are placeholders and stay where they are
const MIN_SPRITE_SIZE: usize = 8;

/// A lump as found in one of the archives, before it is given a final place
#[derive(Debug, Clone)]
struct SourceLump {
    wad: usize,
    name: LumpName,
    start: usize,
    end: usize,
}

/// An entry in the ordering plan: which source lump goes here, and the
/// namespace it ends up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Planned {
    source: usize,
    namespace: Namespace,
}

/// The merged lump directory of every loaded archive.
///
/// Lumps from later archives override earlier ones when looked up by name.
/// Lumps between namespace markers are gathered together at the end of the
/// directory, each namespace bracketed by a fresh pair of markers.
pub struct WadData {
    wads: Vec<Wad>,
    lumps: Vec<Lump>,
    by_name: HashMap<LumpName, usize>,
    by_namespace: HashMap<(Namespace, LumpName), usize>,
}

impl WadData {
    /// Merge the archives, in load order, in to one directory
    pub fn new(wads: Vec<Wad>) -> Result<Self, WadError> {
        let mut sources = Vec::new();
        sources.try_reserve_exact(wads.iter().map(|w| w.lump_count()).sum())?;
        let mut plan = Vec::new();
        plan.try_reserve_exact(sources.capacity())?;

        for (handle, wad) in wads.iter().enumerate() {
            for dir in wad.directories() {
                plan.push(Planned {
                    source: sources.len(),
                    namespace: dir.namespace,
                });
                sources.push(SourceLump {
                    wad: handle,
                    name: dir.lump_name,
                    start: dir.lump_offset,
                    end: dir.lump_offset + dir.lump_size,
                });
            }
        }

        let plan = coalesce_all(&mut sources, plan)?;

        let mut lumps = Vec::new();
        lumps.try_reserve_exact(plan.len())?;
        let mut by_name = HashMap::new();
        by_name.try_reserve(plan.len())?;
        let mut by_namespace = HashMap::new();
        by_namespace.try_reserve(plan.len())?;

        for (index, planned) in plan.iter().enumerate() {
            let source = &sources[planned.source];
            lumps.push(Lump {
                index,
                namespace: planned.namespace,
                name: source.name,
                wad: source.wad,
                data: wads[source.wad].data().clone(),
                range: source.start..source.end,
            });
            by_name.insert(source.name, index);
            by_namespace.insert((planned.namespace, source.name), index);
        }

        info!(
            "Built lump directory: {} lumps from {} WADs",
            lumps.len(),
            wads.len()
        );
        Ok(Self {
            wads,
            lumps,
            by_name,
            by_namespace,
        })
    }

    /// Rebuild the directory with one more archive loaded last. On error the
    /// existing directory is left as it was.
    pub fn add_wad(&mut self, wad: Wad) -> Result<(), WadError> {
        let mut wads = self.wads.clone();
        wads.push(wad);
        *self = Self::new(wads)?;
        Ok(())
    }

    /// The last loaded lump with this exact name, in any namespace
    pub fn lump(&self, name: &str) -> Option<&Lump> {
        self.by_name
            .get(&LumpName::new(name))
            .map(|i| &self.lumps[*i])
    }

    /// The last loaded lump with this exact name in the namespace
    pub fn lump_ns(&self, name: &str, namespace: Namespace) -> Option<&Lump> {
        self.by_namespace
            .get(&(namespace, LumpName::new(name)))
            .map(|i| &self.lumps[*i])
    }

    /// The lump at a position in the merged directory
    pub fn lump_at(&self, index: usize) -> Option<&Lump> {
        self.lumps.get(index)
    }

    /// Names are matched exactly, in any namespace
    pub fn lump_exists(&self, name: &str) -> bool {
        self.by_name.contains_key(&LumpName::new(name))
    }

    pub fn lumps(&self) -> &[Lump] {
        &self.lumps
    }

    pub fn lumps_in_namespace(&self, namespace: Namespace) -> impl Iterator<Item = &Lump> {
        self.lumps.iter().filter(move |l| l.namespace == namespace)
    }

    pub fn wads(&self) -> &[Wad] {
        &self.wads
    }
}

fn coalesce_all(
    sources: &mut Vec<SourceLump>,
    mut plan: Vec<Planned>,
) -> Result<Vec<Planned>, WadError> {
    for (start, end, namespace) in NAMESPACE_MARKERS {
        if let Some(coalesced) = coalesce(sources, &plan, start, end, namespace)? {
            plan = coalesced;
        }
    }
    Ok(plan)
}

/// Gather every lump between `start`/`end` markers, or already in the
/// namespace, in to one run at the end of the plan. The old markers are
/// dropped and a new pair wraps the run. Returns `None` when there was
/// nothing to move.
fn coalesce(
    sources: &mut Vec<SourceLump>,
    plan: &[Planned],
    start: &str,
    end: &str,
    namespace: Namespace,
) -> Result<Option<Vec<Planned>>, WadError> {
    let start_marker = LumpName::new(start);
    let end_marker = LumpName::new(end);

    let mut kept = Vec::new();
    kept.try_reserve_exact(plan.len() + 2)?;
    let mut run = Vec::new();
    let mut in_marked = false;

    for planned in plan {
        let source = &sources[planned.source];
        if is_marker(&start_marker, &source.name) {
            in_marked = true;
            continue;
        }
        if is_marker(&end_marker, &source.name) {
            in_marked = false;
            continue;
        }
        if in_marked || planned.namespace == namespace {
            if namespace == Namespace::Sprites && source.end - source.start <= MIN_SPRITE_SIZE {
                kept.push(*planned);
                continue;
            }
            run.push(Planned {
                source: planned.source,
                namespace,
            });
        } else {
            kept.push(*planned);
        }
    }

    let Some(first) = run.first().map(|p| sources[p.source].clone()) else {
        return Ok(None);
    };
    debug!("Coalesced {} lumps in to {:?}", run.len(), namespace);

    sources.try_reserve(2)?;
    for name in [start_marker, end_marker] {
        sources.push(SourceLump {
            wad: first.wad,
            name,
            start: first.start,
            end: first.start,
        });
    }
    let end_source = sources.len() - 1;

    kept.try_reserve_exact(run.len())?;
    kept.push(Planned {
        source: end_source - 1,
        namespace: Namespace::Global,
    });
    kept.append(&mut run);
    kept.push(Planned {
        source: end_source,
        namespace: Namespace::Global,
    });
    Ok(Some(kept))
}

/// True if `name` is the marker, or the marker with its first letter doubled
/// (`FF_START` for `F_START`) when the marker's second character is `_`.
fn is_marker(marker: &LumpName, name: &LumpName) -> bool {
    let marker = marker.raw();
    let name = name.raw();
    if name.eq_ignore_ascii_case(marker) {
        return true;
    }
    marker[1] == b'_'
        && name[0].eq_ignore_ascii_case(&marker[0])
        && name[1..].eq_ignore_ascii_case(&marker[..7])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::WadKind;
    use crate::test_utils::WadBuilder;

    fn names(wad: &WadData) -> Vec<(String, Namespace)> {
        wad.lumps()
            .iter()
            .map(|l| (l.name().to_string(), l.namespace()))
            .collect()
    }

    fn pwad(builder: WadBuilder) -> Wad {
        Wad::from_bytes("test.wad", builder.build(), WadKind::Pwad).unwrap()
    }

    #[test]
    fn marker_aliases() {
        let f_start = LumpName::new("F_START");
        assert!(is_marker(&f_start, &LumpName::new("F_START")));
        assert!(is_marker(&f_start, &LumpName::new("f_start")));
        assert!(is_marker(&f_start, &LumpName::new("FF_START")));
        assert!(!is_marker(&f_start, &LumpName::new("F1_START")));
        assert!(!is_marker(&f_start, &LumpName::new("S_START")));

        let hi_start = LumpName::new("HI_START");
        assert!(is_marker(&hi_start, &LumpName::new("HI_START")));
        assert!(!is_marker(&hi_start, &LumpName::new("HHI_STAR")));
    }

    #[test]
    fn later_wads_override_by_name() {
        let iwad = Wad::from_bytes(
            "doom.wad",
            WadBuilder::iwad()
                .lump("PLAYPAL", vec![1])
                .lump("COLORMAP", vec![2])
                .build(),
            WadKind::Iwad,
        )
        .unwrap();
        let patch = pwad(WadBuilder::pwad().lump("PLAYPAL", vec![9, 9]));
        let wad = WadData::new(vec![iwad, patch]).unwrap();

        assert_eq!(wad.lumps().len(), 3);
        let playpal = wad.lump("PLAYPAL").unwrap();
        assert_eq!(playpal.data(), &[9, 9]);
        assert_eq!(playpal.index(), 2);
        assert_eq!(playpal.wad_handle(), 1);
        assert_eq!(wad.lump("COLORMAP").unwrap().data(), &[2]);
        assert!(wad.lump("playpal").is_none());
        assert!(wad.lump("MISSING").is_none());
        assert!(wad.lump_exists("COLORMAP"));
        assert!(!wad.lump_exists("playpal"));
        assert!(!wad.lump_exists("MISSING"));
    }

    #[test]
    fn indices_match_positions() {
        let wad = WadData::new(vec![pwad(
            WadBuilder::pwad()
                .lump("A", vec![1])
                .marker("S_START")
                .lump("TROOA1", vec![0; 16])
                .marker("S_END")
                .lump("B", vec![2]),
        )])
        .unwrap();
        for (i, lump) in wad.lumps().iter().enumerate() {
            assert_eq!(lump.index(), i);
            assert_eq!(wad.lump_at(i).unwrap().name(), lump.name());
        }
        assert!(wad.lump_at(wad.lumps().len()).is_none());
    }

    #[test]
    fn coalesce_namespaces_across_wads() {
        let iwad = pwad(
            WadBuilder::pwad()
                .lump("PLAYPAL", vec![1])
                .marker("S_START")
                .lump("TROOA1", vec![0; 16])
                .lump("TINY", vec![0; 8])
                .marker("S_END")
                .marker("F_START")
                .lump("FLOOR0_1", vec![0; 64])
                .marker("F_END")
                .lump("E1M1", vec![]),
        );
        let patch = pwad(
            WadBuilder::pwad()
                .marker("FF_START")
                .lump("FLOOR9", vec![0; 64])
                .marker("FF_END")
                .marker("SS_START")
                .lump("POSSA1", vec![0; 16])
                .marker("SS_END"),
        );
        let wad = WadData::new(vec![iwad, patch]).unwrap();

        assert_eq!(
            names(&wad),
            vec![
                ("PLAYPAL".to_string(), Namespace::Global),
                ("TINY".to_string(), Namespace::Global),
                ("E1M1".to_string(), Namespace::Global),
                ("S_START".to_string(), Namespace::Global),
                ("TROOA1".to_string(), Namespace::Sprites),
                ("POSSA1".to_string(), Namespace::Sprites),
                ("S_END".to_string(), Namespace::Global),
                ("F_START".to_string(), Namespace::Global),
                ("FLOOR0_1".to_string(), Namespace::Flats),
                ("FLOOR9".to_string(), Namespace::Flats),
                ("F_END".to_string(), Namespace::Global),
            ]
        );

        let start = wad.lump("S_START").unwrap();
        assert!(start.is_empty());
    }

    #[test]
    fn namespace_lookup_is_exact() {
        let wad = WadData::new(vec![pwad(
            WadBuilder::pwad()
                .lump("FLOOR0_1", vec![1])
                .marker("F_START")
                .lump("FLOOR0_1", vec![2; 64])
                .marker("F_END"),
        )])
        .unwrap();

        assert_eq!(
            wad.lump_ns("FLOOR0_1", Namespace::Flats).unwrap().data(),
            &[2; 64]
        );
        assert_eq!(
            wad.lump_ns("FLOOR0_1", Namespace::Global).unwrap().data(),
            &[1]
        );
        assert!(wad.lump_ns("FLOOR0_1", Namespace::Sprites).is_none());
        // The name index takes the last lump regardless of namespace
        assert_eq!(
            wad.lump("FLOOR0_1").unwrap().namespace(),
            Namespace::Flats
        );
        for lump in wad.lumps() {
            if let Some(found) = wad.lump_ns(&lump.name().to_string(), Namespace::Flats) {
                assert_eq!(found.namespace(), Namespace::Flats);
            }
        }
    }

    #[test]
    fn no_markers_no_change() {
        let wad = WadData::new(vec![pwad(
            WadBuilder::pwad().lump("A", vec![1]).lump("B", vec![2]),
        )])
        .unwrap();
        assert_eq!(
            names(&wad),
            vec![
                ("A".to_string(), Namespace::Global),
                ("B".to_string(), Namespace::Global)
            ]
        );
    }

    #[test]
    fn coalescing_is_idempotent() {
        let wad = pwad(
            WadBuilder::pwad()
                .marker("S_START")
                .lump("TROOA1", vec![0; 16])
                .marker("S_END")
                .lump("MAP01", vec![])
                .marker("F_START")
                .lump("FLAT1", vec![0; 64])
                .marker("F_END")
                .marker("HI_START")
                .lump("HIRES", vec![0; 4])
                .marker("HI_END"),
        );
        let mut sources = Vec::new();
        let mut plan = Vec::new();
        for dir in wad.directories() {
            plan.push(Planned {
                source: sources.len(),
                namespace: dir.namespace,
            });
            sources.push(SourceLump {
                wad: 0,
                name: dir.name(),
                start: dir.offset(),
                end: dir.offset() + dir.size(),
            });
        }

        let once = coalesce_all(&mut sources, plan).unwrap();
        let describe = |sources: &[SourceLump], plan: &[Planned]| -> Vec<(LumpName, Namespace, usize)> {
            plan.iter()
                .map(|p| {
                    let s = &sources[p.source];
                    (s.name, p.namespace, s.end - s.start)
                })
                .collect()
        };
        let first = describe(&sources, &once);
        let twice = coalesce_all(&mut sources, once).unwrap();
        assert_eq!(first, describe(&sources, &twice));

        let markers = first
            .iter()
            .filter(|(n, _, _)| n.as_bytes().ends_with(b"_START") || n.as_bytes().ends_with(b"_END"))
            .count();
        assert_eq!(markers, 6);
    }

    #[test]
    fn demo_lumps_keep_their_namespace() {
        let demo = Wad::from_lump("DEMO1", vec![0; 32]);
        let wad = WadData::new(vec![demo]).unwrap();
        assert_eq!(
            wad.lump_ns("DEMO1", Namespace::Demos).unwrap().len(),
            32
        );
        assert_eq!(wad.lumps_in_namespace(Namespace::Demos).count(), 1);
    }

    #[test]
    fn add_wad_rebuilds() {
        let mut wad = WadData::new(vec![pwad(WadBuilder::pwad().lump("A", vec![1]))]).unwrap();
        wad.add_wad(pwad(WadBuilder::pwad().lump("A", vec![2]))).unwrap();
        assert_eq!(wad.wads().len(), 2);
        assert_eq!(wad.lump("A").unwrap().data(), &[2]);
    }
}
