// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Top-level faults the node binary surfaces before wrapping them behind
/// `anyhow` at the `main` boundary. Every lower crate's own error enum
/// (`ImageError`, `VmError`, `SnapshotError`) is folded in here rather
/// than re-derived, so `.context(...)` at the call site still names the
/// file or map that triggered it.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to read guest module {path}")]
    GuestRead { path: String, #[source] source: std::io::Error },

    #[error("guest module {path} failed to load")]
    GuestImage { path: String, #[source] source: arena_vm::ImageError },

    #[error("game guest call failed")]
    GuestRuntime(#[source] arena_vm::VmError),

    #[error("snapshot build failed")]
    Snapshot(#[from] arena_snapshot::SnapshotError),
}
