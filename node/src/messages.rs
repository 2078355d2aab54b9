// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The payload types carried over the loopback transport. `arena-net`
//! only supplies the generic FIFO; this binary is where a concrete
//! message shape gets chosen.

use arena_net::UserCmd;
use arena_syscall::ReceivedEntity;

#[derive(Debug, Clone)]
pub enum ClientMessage {
    Connect,
    UserCmd(UserCmd),
    Disconnect,
}

#[derive(Debug, Clone)]
pub enum ServerMessage {
    ConnectAck,
    Snapshot { number: u64, server_time: u32, player_state: Vec<u8>, entities: Vec<ReceivedEntity> },
}
