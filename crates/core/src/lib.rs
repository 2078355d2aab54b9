// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Shared primitives used across the arena engine core: the fixed-point
//! vector type, axis-aligned bounds, the engine-wide constants fixed by the
//! bytecode asset format, and the layered runtime configuration.

mod bounds;
mod config;
mod constants;
mod vec3;

pub use bounds::Bounds;
pub use config::{EngineConfig, FsConfig, NetConfig, SvConfig, VmConfig};
pub use constants::*;
pub use vec3::Vec3;
