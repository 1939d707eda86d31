use nanoserde::{DeRon, SerRon};

/// Switches for how strictly a map is loaded. Stored by front ends in RON.
#[derive(Debug, Clone, PartialEq, Eq, DeRon, SerRon)]
pub struct LoadOptions {
    /// Tolerate segs that reference a missing side of their linedef, as vanilla
    /// Doom does. A warning is logged instead of failing.
    pub vanilla_compat: bool,
    /// Ignore any `BLOCKMAP` lump and always build one from the linedefs
    pub force_blockmap_rebuild: bool,
    /// Build a blockmap when the stored one fails validation
    pub rebuild_invalid_blockmap: bool,
    /// Look up sector floor and ceiling names in the flats namespace
    pub resolve_flats: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            vanilla_compat: false,
            force_blockmap_rebuild: false,
            rebuild_invalid_blockmap: false,
            resolve_flats: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LoadOptions;
    use nanoserde::{DeRon, SerRon};

    #[test]
    fn ron_round_trip() {
        let options = LoadOptions {
            vanilla_compat: true,
            ..LoadOptions::default()
        };
        let text = options.serialize_ron();
        let back = LoadOptions::deserialize_ron(&text).unwrap();
        assert_eq!(back, options);
        assert!(back.resolve_flats);
    }
}
