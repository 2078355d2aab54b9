// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Loads a bytecode guest module from disk into a shareable [`Image`].

use std::path::Path;
use std::sync::Arc;

use arena_vm::Image;

use crate::error::EngineError;

pub fn load_image(path: &Path) -> Result<Arc<Image>, EngineError> {
    let bytes = std::fs::read(path).map_err(|source| EngineError::GuestRead {
        path: path.display().to_string(),
        source,
    })?;
    let image = Image::load(&bytes).map_err(|source| EngineError::GuestImage {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Arc::new(image))
}

/// Guest export numbers (entry points) for each module kind. Invented the
/// same way the server-game import numbers in `arena_syscall` are: the
/// core fixes only the ranges (`server-game 0-10, client-game 0-8, UI
/// 0-9`), not which number names which entry point.
pub mod entry_points {
    pub mod server_game {
        pub const INIT: i32 = 0;
        pub const SHUTDOWN: i32 = 1;
        pub const RUN_FRAME: i32 = 2;
    }

    pub mod client_game {
        pub const INIT: i32 = 0;
        pub const DRAW_ACTIVE_FRAME: i32 = 1;
    }
}
