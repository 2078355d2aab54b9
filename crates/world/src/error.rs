// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by the shared world. These never propagate up to the
/// interpreter: callers (the syscall router) convert them to a safe
/// default and log once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("entity number {num} out of range (0..{max})")]
    EntityOutOfRange { num: i32, max: usize },

    #[error("no world sectors built; map was never loaded")]
    SectorsNotBuilt,

    #[error("gentity layout not set; game module never reported its data location")]
    LayoutNotSet,
}
