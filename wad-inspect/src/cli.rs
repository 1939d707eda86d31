use argh::FromArgs;
use level::LoadOptions;
use log::LevelFilter;

/// Inspect the lumps and maps of a set of WAD files
#[derive(Debug, Clone, FromArgs)]
pub struct CLIOptions {
    /// verbose level: off, error, warn, info, debug, trace
    #[argh(option)]
    pub verbose: Option<LevelFilter>,
    /// path to the IWAD
    #[argh(option, default = "Default::default()")]
    pub iwad: String,
    /// path to a patch WAD, loaded in the order given
    #[argh(option)]
    pub pwad: Vec<String>,
    /// path to a loose lump file, loaded after the patch WADs
    #[argh(option)]
    pub lump: Vec<String>,
    /// load one map by name, eg: E1M1 or MAP01
    #[argh(option)]
    pub map: Option<String>,
    /// load every map found and report the ones that fail
    #[argh(switch)]
    pub all_maps: bool,
    /// print the merged lump directory
    #[argh(switch)]
    pub list_lumps: bool,
    /// accept segs on missing linedef sides with a warning
    #[argh(switch)]
    pub vanilla_compat: bool,
    /// ignore BLOCKMAP lumps and build the blockmap from the linedefs
    #[argh(switch)]
    pub rebuild_blockmap: bool,
}

impl CLIOptions {
    /// Apply the switches on top of the stored options. A switch can only turn
    /// an option on.
    pub fn apply(&self, options: &mut LoadOptions) {
        if self.vanilla_compat {
            options.vanilla_compat = true;
        }
        if self.rebuild_blockmap {
            options.force_blockmap_rebuild = true;
        }
    }
}
