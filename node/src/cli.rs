// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use clap::Parser;

/// Command-line entry point for the fixed-tick server/client loop.
#[derive(Parser, Debug)]
#[command(name = "arenad", about = "Arena engine node: loads a map and drives the server/client loop")]
pub struct Cli {
    /// Path to a TOML `EngineConfig` file. Missing sections fall back to
    /// built-in defaults; a missing file falls back entirely to defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the server-game, client-game, and UI bytecode images are
    /// loaded from (`game.qvm`, `cgame.qvm`, `ui.qvm`).
    #[arg(long, value_name = "DIR")]
    pub map: Option<PathBuf>,

    /// Overrides the `RUST_LOG`-style filter otherwise read from the
    /// environment; defaults to `info`.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}
