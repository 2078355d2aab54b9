// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The client-game syscall router. Most of its surface is a contract with
//! external renderer/audio collaborators this core does not implement;
//! what it owns directly is reading back the snapshot the transport layer
//! last delivered and capturing the guest's outgoing `UserCmd`.

use arena_core::ENTITY_STATE_SIZE;
use arena_net::UserCmd;
use arena_vm::{DataMemory, SyscallHost, SYSCALL_ARGS};
use tracing::warn;

use crate::numbers::client as numbers;

/// Forwards renderer-facing syscalls (add entity/light/polygon, render
/// scene) to whatever draws the frame. Out of scope for this core; the
/// default no-op implementation lets the router function headless.
pub trait RendererCollaborator {
    fn add_ref_entity(&mut self, data: &[u8]);
    fn add_light(&mut self, data: &[u8]);
    fn add_polygon(&mut self, data: &[u8]);
    fn render_scene(&mut self, data: &[u8]);
}

/// Forwards sound registration/playback. Out of scope; default is silent.
pub trait AudioCollaborator {
    fn register_sound(&mut self, name: &str) -> i32;
    fn start_sound(&mut self, data: &[u8]);
}

pub struct NoRenderer;

impl RendererCollaborator for NoRenderer {
    fn add_ref_entity(&mut self, _data: &[u8]) {}
    fn add_light(&mut self, _data: &[u8]) {}
    fn add_polygon(&mut self, _data: &[u8]) {}
    fn render_scene(&mut self, _data: &[u8]) {}
}

pub struct NoAudio;

impl AudioCollaborator for NoAudio {
    fn register_sound(&mut self, _name: &str) -> i32 {
        0
    }
    fn start_sound(&mut self, _data: &[u8]) {}
}

/// One entity's state as delivered to the client over the loopback
/// transport, ready to be copied into the guest's snapshot buffer.
#[derive(Debug, Clone)]
pub struct ReceivedEntity {
    pub entity_num: i32,
    pub state: Vec<u8>,
}

/// The most recent snapshot the transport layer handed the client, held
/// here until the client-game guest asks for it by number.
#[derive(Debug, Clone, Default)]
pub struct ReceivedSnapshot {
    pub number: u64,
    pub server_time: u32,
    pub player_state: Vec<u8>,
    pub entities: Vec<ReceivedEntity>,
}

/// Wire layout the client-game `GET_SNAPSHOT` syscall writes entity
/// records in: a 4-byte entity number followed by a full entity state
/// record. Invented the same way the server-side trace/cvar layouts are.
const SNAPSHOT_ENTITY_STRIDE: i32 = 4 + ENTITY_STATE_SIZE as i32;

pub struct ClientGameRouter {
    current: ReceivedSnapshot,
    last_usercmd: UserCmd,
    renderer: Box<dyn RendererCollaborator>,
    audio: Box<dyn AudioCollaborator>,
}

impl Default for ClientGameRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientGameRouter {
    pub fn new() -> Self {
        Self {
            current: ReceivedSnapshot::default(),
            last_usercmd: UserCmd::default(),
            renderer: Box::new(NoRenderer),
            audio: Box::new(NoAudio),
        }
    }

    pub fn with_collaborators(renderer: Box<dyn RendererCollaborator>, audio: Box<dyn AudioCollaborator>) -> Self {
        Self { current: ReceivedSnapshot::default(), last_usercmd: UserCmd::default(), renderer, audio }
    }

    /// Called by the transport-draining side of the client tick once a new
    /// snapshot has arrived over the loopback queue.
    pub fn deliver_snapshot(&mut self, snapshot: ReceivedSnapshot) {
        self.current = snapshot;
    }

    pub fn last_usercmd(&self) -> UserCmd {
        self.last_usercmd
    }

    fn op_get_snapshot(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let requested = args[1] as u64;
        if requested != self.current.number {
            return 0;
        }
        memory.write_from(args[2], &self.current.player_state);
        let bound = args[4].max(0) as usize;
        let n = self.current.entities.len().min(bound);
        for (i, entity) in self.current.entities.iter().take(n).enumerate() {
            let addr = args[3] + SNAPSHOT_ENTITY_STRIDE * i as i32;
            memory.write32(addr, entity.entity_num);
            memory.write_from(addr + 4, &entity.state);
        }
        n as i32
    }

    fn op_set_usercmd_value(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let mut bytes = [0u8; arena_net::USERCMD_WIRE_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = memory.read8(args[1] + i as i32);
        }
        self.last_usercmd = UserCmd::unpack(&bytes);
        0
    }

    fn op_register_sound(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let name = memory.read_c_string(args[1], 256);
        self.audio.register_sound(&name)
    }
}

impl SyscallHost for ClientGameRouter {
    fn syscall(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        match args[0] {
            numbers::PRINT => {
                tracing::info!(target: "console", "{}", memory.read_c_string(args[1], 1024));
                0
            }
            numbers::MILLISECONDS => self.current.server_time as i32,
            numbers::CVAR_VARIABLE_VALUE => 0,
            numbers::GET_GAMESTATE => self.current.number as i32,
            numbers::GET_CURRENT_SNAPSHOT_NUMBER => self.current.number as i32,
            numbers::GET_SNAPSHOT => self.op_get_snapshot(memory, args),
            numbers::SET_USERCMD_VALUE => self.op_set_usercmd_value(memory, args),
            numbers::ADD_REFENTITY => {
                self.renderer.add_ref_entity(&memory.read_bytes(args[1], ENTITY_STATE_SIZE));
                0
            }
            numbers::ADD_LIGHT => {
                self.renderer.add_light(&memory.read_bytes(args[1], 32));
                0
            }
            numbers::ADD_POLYGON => {
                self.renderer.add_polygon(&memory.read_bytes(args[1], 32));
                0
            }
            numbers::RENDER_SCENE => {
                self.renderer.render_scene(&memory.read_bytes(args[1], 32));
                0
            }
            numbers::REGISTER_SOUND => self.op_register_sound(memory, args),
            numbers::START_SOUND => {
                self.audio.start_sound(&memory.read_bytes(args[1], 32));
                0
            }
            n => {
                warn!(syscall = n, "unknown client-game syscall");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_snapshot_request_returns_zero() {
        let mut router = ClientGameRouter::new();
        router.deliver_snapshot(ReceivedSnapshot { number: 7, ..Default::default() });
        let mut mem = DataMemory::new(1024);
        let args = [numbers::GET_SNAPSHOT, 3, 0, 0, 16, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(router.syscall(&mut mem, &args), 0);
    }

    #[test]
    fn current_snapshot_copies_player_state_and_entities() {
        let mut router = ClientGameRouter::new();
        router.deliver_snapshot(ReceivedSnapshot {
            number: 1,
            server_time: 500,
            player_state: vec![9u8; 8],
            entities: vec![ReceivedEntity { entity_num: 4, state: vec![1, 2, 3] }],
        });
        let mut mem = DataMemory::new(4096);
        let args = [numbers::GET_SNAPSHOT, 1, 100, 200, 16, 0, 0, 0, 0, 0, 0, 0, 0];
        let n = router.syscall(&mut mem, &args);
        assert_eq!(n, 1);
        assert_eq!(mem.read_bytes(100, 8), vec![9u8; 8]);
        assert_eq!(mem.read32(200), 4);
    }

    #[test]
    fn set_usercmd_value_round_trips_into_last_usercmd() {
        let mut router = ClientGameRouter::new();
        let cmd = UserCmd { server_time: 42, forward_move: 100, ..Default::default() };
        let mut mem = DataMemory::new(1024);
        mem.write_from(0, &cmd.pack());
        let args = [numbers::SET_USERCMD_VALUE, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        router.syscall(&mut mem, &args);
        assert_eq!(router.last_usercmd(), cmd);
    }
}
