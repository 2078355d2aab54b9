// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! `arenad`: loads a map's three bytecode guests (server-game, client-game,
//! optionally UI), boots the shared world, and drives the fixed-tick
//! server/client loop over the loopback transport until interrupted.

mod cli;
mod engine;
mod error;
mod guest;
mod logging;
mod messages;

use std::path::{Path, PathBuf};

use anyhow::Context;
use arena_core::{Bounds, EngineConfig, Vec3, DEFAULT_VISIBILITY_DISTANCE};
use arena_net::UserCmd;
use clap::Parser;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::engine::Engine;

/// A box comfortably larger than any reasonable map; real sector bounds
/// come from the loaded map's own entity data in a full filesystem layer,
/// which is out of scope here (see [`guest::load_image`]).
fn default_world_bounds() -> Bounds {
    let extent = DEFAULT_VISIBILITY_DISTANCE;
    Bounds::new(Vec3::new(-extent, -extent, -extent), Vec3::new(extent, extent, extent))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        None => Ok(EngineConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            EngineConfig::from_toml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
        }
    }
}

fn guest_path(map_dir: &Path, file_name: &str) -> PathBuf {
    map_dir.join(file_name)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_level.as_deref());

    let config = load_config(cli.config.as_deref())?;
    let map_dir = cli.map.clone().unwrap_or_else(|| PathBuf::from("."));

    info!(map = %map_dir.display(), "loading guest modules");
    let server_image = guest::load_image(&guest_path(&map_dir, "game.qvm"))?;
    let client_image = guest::load_image(&guest_path(&map_dir, "cgame.qvm"))?;
    let ui_path = guest_path(&map_dir, "ui.qvm");
    let ui_image = match guest::load_image(&ui_path) {
        Ok(image) => Some(image),
        Err(err) => {
            warn!(%err, path = %ui_path.display(), "no UI module loaded, continuing without one");
            None
        }
    };

    let mut engine = Engine::new(config.clone(), server_image, client_image, ui_image);
    engine.bootstrap(default_world_bounds())?;

    let frame_msec = config.net.frame_msec.max(1) as u64;
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(frame_msec));

    info!(frame_msec, "entering fixed-tick loop");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let input = UserCmd::default();
                if let Err(err) = engine.tick(frame_msec as u32, input) {
                    warn!(%err, "tick failed, continuing");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    Ok(())
}
