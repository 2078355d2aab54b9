// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Loopback transport, net channels, client movement prediction, and the
//! fixed-rate tick accumulator that drives the server loop.

mod channel;
mod connection;
mod error;
mod pmove;
mod ticker;
mod transport;
mod usercmd;

pub use channel::{CommandRing, NetChannel};
pub use connection::ConnectionState;
pub use error::NetError;
pub use pmove::{pmove, predict, PmoveState, GRAVITY, JUMP_VELOCITY, MAX_GROUND_SPEED};
pub use ticker::TickAccumulator;
pub use transport::{LoopbackQueue, LoopbackTransport};
pub use usercmd::{button, UserCmd, USERCMD_WIRE_SIZE};
