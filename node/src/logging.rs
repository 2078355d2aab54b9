// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber. `RUST_LOG` wins if set;
/// otherwise `cli_level` (from `--log-level`) is used, falling back to
/// `info`.
pub fn init_tracing(cli_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli_level.unwrap_or("info")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
