// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The server-game syscall router: the table a loaded game module's
//! `CALL`s into negative targets resolve against. Owns every host-side
//! collaborator the guest reaches through a syscall number — cvars,
//! configstrings, the shared world, and each client's net channel.

use std::collections::{HashMap, HashSet};

use arena_core::{Bounds, Vec3, MAX_CLIENTS, MAX_ENTITIES};
use arena_net::{NetChannel, UserCmd, USERCMD_WIRE_SIZE};
use arena_snapshot::PlayerStateLayout;
use arena_vm::{DataMemory, SyscallHost, SYSCALL_ARGS};
use arena_world::{GentityLayout, NoWorldGeometry, World, WorldCollision};
use tracing::{info, trace, warn};

use crate::cvar::CvarRegistry;
use crate::configstring::ConfigStringTable;
use crate::guest_layout::{trace_result_field, vm_cvar_field, CVAR_STRING_CAPACITY};
use crate::numbers;

const GUEST_STRING_MAX: usize = 1024;

struct ClientLink {
    channel: NetChannel,
    last_usercmd: UserCmd,
}

impl Default for ClientLink {
    fn default() -> Self {
        Self { channel: NetChannel::new(), last_usercmd: UserCmd::default() }
    }
}

/// Routes server-game syscalls to the host services backing them.
pub struct ServerGameRouter {
    cvars: CvarRegistry,
    cvar_handles: HashMap<i32, String>,
    configstrings: ConfigStringTable,
    gentity_layout: Option<GentityLayout>,
    player_layout: Option<PlayerStateLayout>,
    world: World,
    world_collision: Box<dyn WorldCollision>,
    clients: Vec<ClientLink>,
    level_time: u32,
    bot_ai_logged: HashSet<i32>,
    pending_abort: Option<String>,
}

impl Default for ServerGameRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerGameRouter {
    pub fn new() -> Self {
        Self {
            cvars: CvarRegistry::new(),
            cvar_handles: HashMap::new(),
            configstrings: ConfigStringTable::new(),
            gentity_layout: None,
            player_layout: None,
            world: World::new(),
            world_collision: Box::new(NoWorldGeometry),
            clients: (0..MAX_CLIENTS).map(|_| ClientLink::default()).collect(),
            level_time: 0,
            bot_ai_logged: HashSet::new(),
            pending_abort: None,
        }
    }

    pub fn with_world_collision(mut self, collision: Box<dyn WorldCollision>) -> Self {
        self.world_collision = collision;
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn gentity_layout(&self) -> Option<GentityLayout> {
        self.gentity_layout
    }

    pub fn player_layout(&self) -> Option<PlayerStateLayout> {
        self.player_layout
    }

    pub fn client_channel_mut(&mut self, client: usize) -> Option<&mut NetChannel> {
        self.clients.get_mut(client).map(|c| &mut c.channel)
    }

    pub fn set_level_time(&mut self, level_time: u32) {
        self.level_time = level_time;
    }

    /// Feeds the guest-supplied command that arrived for `client` since
    /// the last tick; read back by the guest through `GET_USERCMD`.
    pub fn set_client_usercmd(&mut self, client: usize, cmd: UserCmd) {
        if let Some(link) = self.clients.get_mut(client) {
            link.last_usercmd = cmd;
        }
    }

    fn entity_num_from_addr(&self, addr: i32) -> Option<i32> {
        let layout = self.gentity_layout?;
        if layout.stride == 0 {
            return None;
        }
        let rel = addr - layout.base;
        if rel < 0 || rel % layout.stride != 0 {
            return None;
        }
        let num = rel / layout.stride;
        if (num as usize) < layout.count {
            Some(num)
        } else {
            None
        }
    }

    fn write_vm_cvar(&self, memory: &mut DataMemory, handle_addr: i32, name: &str) {
        let Some(cvar) = self.cvars.get(name) else { return };
        let mut bytes = cvar.value.as_bytes().to_vec();
        bytes.truncate(CVAR_STRING_CAPACITY - 1);
        bytes.push(0);
        memory.write_from(handle_addr + vm_cvar_field::STRING, &bytes);
        memory.write_f32(handle_addr + vm_cvar_field::VALUE, cvar.as_f32());
        memory.write32(handle_addr + vm_cvar_field::INTEGER, cvar.as_i32());
        memory.write32(handle_addr + vm_cvar_field::MODIFICATION_COUNT, cvar.modification_count as i32);
    }

    fn write_bounded_string(&self, memory: &mut DataMemory, addr: i32, bufsize: i32, value: &str) {
        if bufsize <= 0 {
            return;
        }
        let cap = (bufsize as usize).saturating_sub(1);
        let mut bytes = value.as_bytes().to_vec();
        bytes.truncate(cap);
        bytes.push(0);
        memory.write_from(addr, &bytes);
    }

    fn op_print(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let text = memory.read_c_string(args[1], GUEST_STRING_MAX);
        info!(target: "console", "{text}");
        0
    }

    fn op_error(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let text = memory.read_c_string(args[1], GUEST_STRING_MAX);
        warn!(target: "console", "{text}");
        self.pending_abort = Some(text);
        0
    }

    fn op_cvar_register(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let handle_addr = args[1];
        let name = memory.read_c_string(args[2], 256);
        let default_value = memory.read_c_string(args[3], 256);
        self.cvars.register(&name, &default_value, args[4]);
        self.cvar_handles.insert(handle_addr, name.clone());
        self.write_vm_cvar(memory, handle_addr, &name);
        0
    }

    fn op_cvar_update(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let handle_addr = args[1];
        if let Some(name) = self.cvar_handles.get(&handle_addr).cloned() {
            self.write_vm_cvar(memory, handle_addr, &name);
        }
        0
    }

    fn op_cvar_set(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let name = memory.read_c_string(args[1], 256);
        let value = memory.read_c_string(args[2], 256);
        self.cvars.set(&name, &value);
        0
    }

    fn op_cvar_variable_value(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let name = memory.read_c_string(args[1], 256);
        self.cvars.get(&name).map(|c| c.as_i32()).unwrap_or(0)
    }

    fn op_cvar_variable_string(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let name = memory.read_c_string(args[1], 256);
        let value = self.cvars.get(&name).map(|c| c.value.clone()).unwrap_or_default();
        self.write_bounded_string(memory, args[2], args[3], &value);
        0
    }

    fn op_locate_game_data(&mut self, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let count = (args[2] as usize).min(MAX_ENTITIES);
        if count < args[2] as usize {
            warn!(requested = args[2], max = MAX_ENTITIES, "gentity count clamped to MAX_ENTITIES");
        }
        let layout = GentityLayout {
            base: args[1],
            stride: args[3],
            shared_offset: arena_core::ENTITY_SHARED_OFFSET as i32,
            count,
        };
        self.gentity_layout = Some(layout);
        self.world.set_gentity_layout(layout);
        self.player_layout = Some(PlayerStateLayout { base: args[4], stride: args[5] });
        0
    }

    fn op_send_server_command(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let client = args[1] as usize;
        let text = memory.read_c_string(args[2], GUEST_STRING_MAX);
        let Some(link) = self.clients.get_mut(client) else {
            warn!(client, "send_server_command: client out of range");
            return 0;
        };
        if let Err(err) = link.channel.server_commands.enqueue(text) {
            warn!(client, %err, "server command ring overflow, dropping connection's outbound command");
        }
        0
    }

    fn op_set_configstring(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let index = args[1] as usize;
        let value = memory.read_c_string(args[2], GUEST_STRING_MAX);
        self.configstrings.set(index, value);
        0
    }

    fn op_get_configstring(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let index = args[1] as usize;
        let value = self.configstrings.get(index).to_string();
        self.write_bounded_string(memory, args[2], args[3], &value);
        0
    }

    fn op_get_usercmd(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let client = args[1] as usize;
        let Some(link) = self.clients.get(client) else {
            warn!(client, "get_usercmd: client out of range");
            return 0;
        };
        let packed = link.last_usercmd.pack();
        debug_assert_eq!(packed.len(), USERCMD_WIRE_SIZE);
        memory.write_from(args[2], &packed);
        0
    }

    fn op_link_entity(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        match self.entity_num_from_addr(args[1]) {
            Some(entity_num) => {
                if let Err(err) = self.world.link_entity(memory, entity_num) {
                    warn!(%err, "link_entity failed");
                }
            }
            None => warn!(addr = args[1], "link_entity: address does not map to a known gentity"),
        }
        0
    }

    fn op_unlink_entity(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        match self.entity_num_from_addr(args[1]) {
            Some(entity_num) => {
                if let Err(err) = self.world.unlink_entity(memory, entity_num) {
                    warn!(%err, "unlink_entity failed");
                }
            }
            None => warn!(addr = args[1], "unlink_entity: address does not map to a known gentity"),
        }
        0
    }

    fn op_entities_in_box(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let mins = read_vec3(memory, args[1]);
        let maxs = read_vec3(memory, args[2]);
        let hits = self.world.entities_in_box(Bounds::new(mins, maxs));
        let bound = args[4].max(0) as usize;
        let n = hits.len().min(bound);
        for (i, entity_num) in hits.iter().take(n).enumerate() {
            memory.write32(args[3] + 4 * i as i32, *entity_num);
        }
        n as i32
    }

    fn op_trace(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let result_addr = args[1];
        let start = read_vec3(memory, args[2]);
        let end = read_vec3(memory, args[3]);
        let mins = read_vec3(memory, args[4]);
        let maxs = read_vec3(memory, args[5]);
        let pass_entity_num = args[6];
        let content_mask = args[7];

        let result = self.world.trace(self.world_collision.as_ref(), start, end, mins, maxs, pass_entity_num, content_mask);

        memory.write_f32(result_addr + trace_result_field::FRACTION, result.fraction);
        write_vec3(memory, result_addr + trace_result_field::END_POS, result.end_pos);
        write_vec3(memory, result_addr + trace_result_field::PLANE_NORMAL, result.plane_normal);
        memory.write32(result_addr + trace_result_field::CONTENTS, result.contents);
        memory.write32(result_addr + trace_result_field::ENTITY_NUM, result.entity_num);
        memory.write32(result_addr + trace_result_field::ALL_SOLID, result.all_solid as i32);
        memory.write32(result_addr + trace_result_field::START_SOLID, result.start_solid as i32);
        0
    }

    fn op_point_contents(&mut self, memory: &DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        let point = read_vec3(memory, args[1]);
        self.world.point_contents(self.world_collision.as_ref(), point)
    }

    fn log_bot_or_ai_once(&mut self, number: i32) {
        if self.bot_ai_logged.insert(number) {
            trace!(syscall = number, "bot/AI syscall stubbed, returning 0");
        }
    }
}

fn read_vec3(memory: &DataMemory, addr: i32) -> Vec3 {
    Vec3::new(memory.read_f32(addr), memory.read_f32(addr + 4), memory.read_f32(addr + 8))
}

fn write_vec3(memory: &mut DataMemory, addr: i32, v: Vec3) {
    memory.write_f32(addr, v.x);
    memory.write_f32(addr + 4, v.y);
    memory.write_f32(addr + 8, v.z);
}

impl SyscallHost for ServerGameRouter {
    fn syscall(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        match args[0] {
            numbers::PRINT => self.op_print(memory, args),
            numbers::ERROR => self.op_error(memory, args),
            numbers::MILLISECONDS => self.level_time as i32,
            numbers::CVAR_REGISTER => self.op_cvar_register(memory, args),
            numbers::CVAR_UPDATE => self.op_cvar_update(memory, args),
            numbers::CVAR_SET => self.op_cvar_set(memory, args),
            numbers::CVAR_VARIABLE_VALUE => self.op_cvar_variable_value(memory, args),
            numbers::CVAR_VARIABLE_STRING => self.op_cvar_variable_string(memory, args),
            numbers::LOCATE_GAME_DATA => self.op_locate_game_data(args),
            numbers::SEND_SERVER_COMMAND => self.op_send_server_command(memory, args),
            numbers::SET_CONFIGSTRING => self.op_set_configstring(memory, args),
            numbers::GET_CONFIGSTRING => self.op_get_configstring(memory, args),
            numbers::GET_USERCMD => self.op_get_usercmd(memory, args),
            numbers::LINK_ENTITY => self.op_link_entity(memory, args),
            numbers::UNLINK_ENTITY => self.op_unlink_entity(memory, args),
            numbers::ENTITIES_IN_BOX => self.op_entities_in_box(memory, args),
            numbers::TRACE => self.op_trace(memory, args),
            numbers::POINT_CONTENTS => self.op_point_contents(memory, args),
            n if numbers::is_bot_or_ai(n) => {
                self.log_bot_or_ai_once(n);
                0
            }
            n => {
                warn!(syscall = n, "unknown server-game syscall");
                0
            }
        }
    }

    fn take_abort(&mut self) -> Option<String> {
        self.pending_abort.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::Bounds as CoreBounds;

    fn args_with(number: i32, rest: &[i32]) -> [i32; SYSCALL_ARGS] {
        let mut args = [0i32; SYSCALL_ARGS];
        args[0] = number;
        for (i, v) in rest.iter().enumerate() {
            args[i + 1] = *v;
        }
        args
    }

    #[test]
    fn cvar_register_then_update_mirrors_live_value() {
        let mut router = ServerGameRouter::new();
        let mut mem = DataMemory::new(65536);
        mem.write_bytes(100, b"sv_hostname\0");
        mem.write_bytes(200, b"arena\0");

        let args = args_with(numbers::CVAR_REGISTER, &[1000, 100, 200, 0]);
        router.syscall(&mut mem, &args);
        assert_eq!(mem.read_c_string(1000 + vm_cvar_field::STRING, 64), "arena");

        let set_args = args_with(numbers::CVAR_SET, &[100, 200]);
        mem.write_bytes(200, b"renamed\0");
        router.syscall(&mut mem, &set_args);

        let update_args = args_with(numbers::CVAR_UPDATE, &[1000]);
        router.syscall(&mut mem, &update_args);
        assert_eq!(mem.read_c_string(1000 + vm_cvar_field::STRING, 64), "renamed");
    }

    #[test]
    fn unknown_syscall_returns_zero_and_does_not_abort() {
        let mut router = ServerGameRouter::new();
        let mut mem = DataMemory::new(1024);
        let result = router.syscall(&mut mem, &[9999, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(result, 0);
        assert!(router.take_abort().is_none());
    }

    #[test]
    fn error_syscall_queues_an_abort() {
        let mut router = ServerGameRouter::new();
        let mut mem = DataMemory::new(1024);
        mem.write_bytes(0, b"kaboom\0");
        let args = args_with(numbers::ERROR, &[0]);
        router.syscall(&mut mem, &args);
        assert_eq!(router.take_abort(), Some("kaboom".to_string()));
        assert!(router.take_abort().is_none());
    }

    #[test]
    fn link_then_trace_end_to_end() {
        let mut router = ServerGameRouter::new();
        let mut mem = DataMemory::new(1 << 20);

        router.world_mut().build_sectors(CoreBounds::new(Vec3::new(-8192.0, -8192.0, -8192.0), Vec3::new(8192.0, 8192.0, 8192.0)));

        let locate_args = args_with(numbers::LOCATE_GAME_DATA, &[0x1000, 4, 512, 0x20000, 256]);
        router.syscall(&mut mem, &locate_args);

        let gentity_addr = 0x1000;
        write_vec3(&mut mem, gentity_addr + 416 + 20, Vec3::new(-15.0, -15.0, -24.0));
        write_vec3(&mut mem, gentity_addr + 416 + 32, Vec3::new(15.0, 15.0, 32.0));
        mem.write32(gentity_addr + 416 + 44, 0x0200_0000);

        let link_args = args_with(numbers::LINK_ENTITY, &[gentity_addr]);
        router.syscall(&mut mem, &link_args);

        let start_addr = 0x30000;
        let end_addr = 0x30020;
        write_vec3(&mut mem, start_addr, Vec3::new(-100.0, 0.0, 0.0));
        write_vec3(&mut mem, end_addr, Vec3::new(100.0, 0.0, 0.0));
        let mins_addr = 0x30040;
        let maxs_addr = 0x30060;
        write_vec3(&mut mem, mins_addr, Vec3::ZERO);
        write_vec3(&mut mem, maxs_addr, Vec3::ZERO);
        let result_addr = 0x30080;

        let trace_args = args_with(
            numbers::TRACE,
            &[result_addr, start_addr, end_addr, mins_addr, maxs_addr, -1, 0x0200_0000],
        );
        router.syscall(&mut mem, &trace_args);

        let fraction = mem.read_f32(result_addr + trace_result_field::FRACTION);
        assert!((fraction - 0.425).abs() < 0.01, "fraction was {fraction}");
        assert_eq!(mem.read32(result_addr + trace_result_field::ENTITY_NUM), 0);
    }
}
