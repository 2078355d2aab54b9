// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("reliable command overflow: {unacked} unacknowledged commands exceed the ring capacity")]
    ReliableOverflow { unacked: u32 },

    #[error("sequence {sequence} has already been overwritten in the reliable ring")]
    SequenceTooOld { sequence: u32 },
}
