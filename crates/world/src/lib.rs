// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Shared world state: the entity table mirrored from guest memory, the
//! spatial partition built over the loaded map, and AABB sweep traces.

mod entity;
mod error;
mod sector;
mod trace;
mod world;

pub use entity::{ServerEntity, SharedEntity};
pub use error::WorldError;
pub use sector::{SectorNode, SectorTree};
pub use trace::{trace as sweep_trace, NoWorldGeometry, TraceCandidate, TraceResult, WorldCollision};
pub use world::{GentityLayout, World};
