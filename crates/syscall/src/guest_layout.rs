// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Byte layout of the guest-visible `vmCvar_t` mirror record. Unlike the
//! gentity offsets in `arena-world` (fixed by a real shipped asset), no
//! byte layout for cvars is specified upstream — these offsets are this
//! engine build's own convention, invented to let the guest read a cvar's
//! current value without another round-trip syscall.

pub const CVAR_STRING_CAPACITY: usize = 64;

pub mod vm_cvar_field {
    use super::CVAR_STRING_CAPACITY;

    pub const STRING: i32 = 0;
    pub const VALUE: i32 = CVAR_STRING_CAPACITY as i32;
    pub const INTEGER: i32 = VALUE + 4;
    pub const MODIFICATION_COUNT: i32 = INTEGER + 4;
}

/// Byte layout this engine build writes a `trace_t` result into, for the
/// `TRACE` syscall. Also invented: only the fields a trace returns are
/// fixed elsewhere, not their wire layout.
pub mod trace_result_field {
    pub const FRACTION: i32 = 0;
    pub const END_POS: i32 = 4;
    pub const PLANE_NORMAL: i32 = 16;
    pub const CONTENTS: i32 = 28;
    pub const ENTITY_NUM: i32 = 32;
    pub const ALL_SOLID: i32 = 36;
    pub const START_SOLID: i32 = 40;
}
