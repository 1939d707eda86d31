//! User configuration options.

use crate::{BASE_DIR, CLIOptions};
use dirs::config_dir;
use level::LoadOptions;
use log::{info, warn};
use nanoserde::{DeRon, SerRon};
use std::{
    fs::{File, OpenOptions, create_dir_all},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

const LOG_TAG: &str = "UserConfig";
const CONFIG_FILE: &str = "options.ron";

fn get_cfg_file() -> Result<PathBuf, io::Error> {
    let mut dir = config_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Couldn't find the user config dir")
    })?;
    dir.push(BASE_DIR);
    if !dir.exists() {
        create_dir_all(&dir)?;
    }
    dir.push(CONFIG_FILE);
    Ok(dir)
}

#[derive(Debug, Default, Clone, PartialEq, DeRon, SerRon)]
pub struct UserConfig {
    /// The IWAD used when none is given on the command line
    pub iwad: String,
    pub options: LoadOptions,
}

impl UserConfig {
    /// Read the config file, creating it with defaults if it is empty or
    /// can't be parsed
    pub fn load() -> Result<Self, io::Error> {
        let path = get_cfg_file()?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let mut buf = String::new();
        let read_len = file.read_to_string(&mut buf)?;
        if read_len == 0 {
            return UserConfig::create_default(&mut file, &path);
        }
        match UserConfig::deserialize_ron(&buf) {
            Ok(data) => {
                info!(target: LOG_TAG, "Loaded user config file");
                Ok(data)
            }
            Err(err) => {
                warn!(target: LOG_TAG, "Could not deserialise {:?}: {}, recreating config", path, err);
                let mut file = File::create(&path)?;
                UserConfig::create_default(&mut file, &path)
            }
        }
    }

    fn create_default(file: &mut File, path: &Path) -> Result<Self, io::Error> {
        let config = UserConfig::default();
        file.write_all(config.serialize_ron().as_bytes())?;
        info!(target: LOG_TAG, "Saved default user config to {:?}", path);
        Ok(config)
    }

    pub fn write(&self) -> Result<(), io::Error> {
        let mut file = File::create(get_cfg_file()?)?;
        file.write_all(self.serialize_ron().as_bytes())
    }

    /// Sync the CLI options and the stored config with each other
    pub fn sync_cli(&mut self, cli: &mut CLIOptions) {
        info!(target: LOG_TAG, "Checking CLI options");

        if !cli.iwad.is_empty() && cli.iwad != self.iwad {
            cli.iwad.clone_into(&mut self.iwad);
            info!(target: LOG_TAG, "IWAD changed to: {}", &cli.iwad);
        } else {
            self.iwad.clone_into(&mut cli.iwad);
        }
    }

    /// The stored load options with the CLI switches applied. The switches are
    /// not written back.
    pub fn load_options(&self, cli: &CLIOptions) -> LoadOptions {
        let mut options = self.options.clone();
        cli.apply(&mut options);
        options
    }
}
