// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("client {client} out of range (0..{max})")]
    ClientOutOfRange { client: usize, max: usize },
}
