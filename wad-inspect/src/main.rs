//! Load an IWAD plus any patches, then report on the merged lump directory
//! and the maps in it.

mod cli;
mod config;

use cli::*;
use level::{LoadOptions, MapData, map_names};
use log::{error, info, warn};
use simplelog::TermLogger;
use std::error::Error;
use wad::{Namespace, Wad, WadData, WadKind};

use crate::config::UserConfig;

const BASE_DIR: &str = "wad-inspect/";

fn main() -> Result<(), Box<dyn Error>> {
    let mut options: CLIOptions = argh::from_env();

    TermLogger::init(
        options.verbose.unwrap_or(log::LevelFilter::Info),
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut user_config = UserConfig::load()?;
    user_config.sync_cli(&mut options);
    user_config.write()?;

    if options.iwad.is_empty() {
        return Err("no IWAD given, pass --iwad once to store it".into());
    }

    let wad = load_catalog(&options)?;
    if options.list_lumps {
        list_lumps(&wad);
    }

    let load_options = user_config.load_options(&options);
    let maps = map_names(&wad);
    info!("Found {} maps", maps.len());

    if let Some(map) = &options.map {
        if !wad.lump_exists(&map.to_ascii_uppercase()) {
            return Err(format!("no map named {map}, found: {}", maps.join(" ")).into());
        }
        let data = MapData::load(&wad, map, &load_options)?;
        print_summary(&data);
    } else if options.all_maps {
        let failed = load_all(&wad, &maps, &load_options);
        if failed > 0 {
            return Err(format!("{failed} of {} maps failed to load", maps.len()).into());
        }
    } else if !options.list_lumps {
        println!("{}", maps.join(" "));
    }
    Ok(())
}

/// Archives are loaded in command line order: the IWAD, patches, loose lumps
fn load_catalog(options: &CLIOptions) -> Result<WadData, Box<dyn Error>> {
    let mut wads = Vec::with_capacity(1 + options.pwad.len() + options.lump.len());
    wads.push(Wad::from_path(&options.iwad, WadKind::Iwad)?);
    for pwad in &options.pwad {
        wads.push(Wad::from_path(pwad, WadKind::Pwad)?);
    }
    for lump in &options.lump {
        wads.push(Wad::from_lump_path(lump)?);
    }

    let wad = WadData::new(wads)?;
    info!(
        "Loaded {} lumps from {} archives",
        wad.lumps().len(),
        wad.wads().len()
    );
    Ok(wad)
}

fn list_lumps(wad: &WadData) {
    for lump in wad.lumps() {
        let archive = wad
            .wads()
            .get(lump.wad_handle())
            .map(|w| w.label())
            .unwrap_or_default();
        let namespace = match lump.namespace() {
            Namespace::Global => String::new(),
            ns => format!("{ns:?}"),
        };
        println!(
            "{:>6} {:<8} {:>9} {:<10} {}",
            lump.index(),
            lump.name(),
            lump.len(),
            namespace,
            archive
        );
    }
}

/// Returns the number of maps that failed
fn load_all(wad: &WadData, maps: &[String], options: &LoadOptions) -> usize {
    let mut failed = 0;
    for name in maps {
        match MapData::load(wad, name, options) {
            Ok(data) => print_summary(&data),
            Err(err) if err.kind() == level::ErrorKind::UnimplementedFormat => {
                warn!("{name}: skipped, {err}");
            }
            Err(err) => {
                error!("{name}: {err} ({:?})", err.kind());
                failed += 1;
            }
        }
    }
    failed
}

fn print_summary(map: &MapData) {
    let blockmap = map.blockmap();
    println!(
        "{}: {} nodes, {} things, {} vertexes ({} GL), {} linedefs, {} sidedefs, {} sectors, \
         {} segs, {} subsectors, {} nodes, blockmap {}x{} at ({}, {})",
        map.name(),
        map.nodes_version(),
        map.things().len(),
        map.vertexes().len(),
        map.vertexes().len() - map.gl_vertex_start(),
        map.linedefs().len(),
        map.sidedefs().len(),
        map.sectors().len(),
        map.segments().len(),
        map.subsectors().len(),
        map.nodes().len(),
        blockmap.columns,
        blockmap.rows,
        blockmap.x_origin.to_int(),
        blockmap.y_origin.to_int(),
    );
}
