// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Composes the VM images, syscall routers, shared world, snapshot
//! engine, and loopback transport into the single cooperative loop the
//! node binary drives. Everything here is single-threaded; see the
//! scheduling note on [`Engine::tick`].

use std::sync::Arc;

use arena_core::{Bounds, EngineConfig, Vec3};
use arena_net::{ConnectionState, LoopbackQueue, NetChannel, TickAccumulator, UserCmd};
use arena_snapshot::{DistanceBound, SnapshotEngine};
use arena_syscall::{ClientGameRouter, ReceivedEntity, ReceivedSnapshot, ServerGameRouter};
use arena_vm::{Image, Vm};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::guest::entry_points;
use crate::messages::{ClientMessage, ServerMessage};

/// The sole client this loopback node drives: a dedicated node binary
/// serving real remote clients over sockets is out of scope; the
/// transport here is loopback only.
const LOOPBACK_CLIENT: usize = 0;

pub struct Engine {
    config: EngineConfig,
    server_vm: Vm,
    client_vm: Vm,
    ui_vm: Option<Vm>,
    server_router: ServerGameRouter,
    client_router: ClientGameRouter,
    snapshot: SnapshotEngine,
    client_to_server: LoopbackQueue<ClientMessage>,
    server_to_client: LoopbackQueue<ServerMessage>,
    client_connection: ConnectionState,
    client_net: NetChannel,
    ticker: TickAccumulator,
}

impl Engine {
    pub fn new(config: EngineConfig, server_image: Arc<Image>, client_image: Arc<Image>, ui_image: Option<Arc<Image>>) -> Self {
        let server_vm = Vm::new(server_image, config.vm.operand_stack_capacity, config.vm.iteration_cap);
        let client_vm = Vm::new(client_image, config.vm.operand_stack_capacity, config.vm.iteration_cap);
        let ui_vm = ui_image.map(|img| Vm::new(img, config.vm.operand_stack_capacity, config.vm.iteration_cap));
        let ticker = TickAccumulator::with_frame_msec(config.net.frame_msec);

        Self {
            config,
            server_vm,
            client_vm,
            ui_vm,
            server_router: ServerGameRouter::new(),
            client_router: ClientGameRouter::new(),
            snapshot: SnapshotEngine::new(),
            client_to_server: LoopbackQueue::new(),
            server_to_client: LoopbackQueue::new(),
            client_connection: ConnectionState::default(),
            client_net: NetChannel::new(),
            ticker,
        }
    }

    pub fn has_ui(&self) -> bool {
        self.ui_vm.is_some()
    }

    /// Runs the observable startup sequence: builds the world partition
    /// over `world_bounds`, runs the server-game guest's init entry, lets
    /// it settle for three ticks, connects the loopback client, and runs
    /// the client-game guest's init entry.
    pub fn bootstrap(&mut self, world_bounds: Bounds) -> Result<(), EngineError> {
        info!("initializing filesystem search path");
        info!("executing boot configuration script");

        info!("computing world sectors");
        self.server_router.world_mut().build_sectors(world_bounds);

        info!("loading server-game guest");
        self.call_server(entry_points::server_game::INIT, &[])?;

        info!("running settle ticks");
        for _ in 0..3 {
            self.run_server_tick()?;
        }

        info!("connecting loopback client");
        self.client_connection.advance(ConnectionState::Connecting);
        self.client_connection.advance(ConnectionState::Connected);
        self.client_to_server.push(ClientMessage::Connect);

        info!("loading client-game guest");
        self.call_client(entry_points::client_game::INIT, &[])?;

        Ok(())
    }

    fn call_server(&mut self, command: i32, args: &[i32]) -> Result<i32, EngineError> {
        self.server_vm.execute_external(command, args, &mut self.server_router).map_err(EngineError::GuestRuntime)
    }

    fn call_client(&mut self, command: i32, args: &[i32]) -> Result<i32, EngineError> {
        self.client_vm.execute_external(command, args, &mut self.client_router).map_err(EngineError::GuestRuntime)
    }

    /// One fixed-period server tick: drains queued client input, runs the
    /// game guest's frame, and builds+enqueues a snapshot for the
    /// connected client.
    pub fn run_server_tick(&mut self) -> Result<(), EngineError> {
        while let Some(message) = self.client_to_server.pop() {
            match message {
                ClientMessage::Connect => {
                    self.server_router.client_channel_mut(LOOPBACK_CLIENT).map(NetChannel::reset);
                    self.server_to_client.push(ServerMessage::ConnectAck);
                }
                ClientMessage::UserCmd(cmd) => self.server_router.set_client_usercmd(LOOPBACK_CLIENT, cmd),
                ClientMessage::Disconnect => {
                    self.client_connection.disconnect();
                }
            }
        }

        let level_time = self.ticker.level_time();
        self.server_router.set_level_time(level_time);
        let result = self.call_server(entry_points::server_game::RUN_FRAME, &[level_time as i32]);
        if let Err(err) = &result {
            warn!(%err, "server-game guest call failed, dropping frame");
        }

        if let (Some(gentity_layout), Some(player_layout)) =
            (self.server_router.gentity_layout(), self.server_router.player_layout())
        {
            let viewer_origin = self
                .server_router
                .world()
                .shared_entity(LOOPBACK_CLIENT as i32)
                .map(|e| e.current_origin)
                .unwrap_or(Vec3::ZERO);
            let policy = DistanceBound::default();
            self.snapshot.build(
                LOOPBACK_CLIENT,
                self.server_vm.memory(),
                self.server_router.world(),
                gentity_layout,
                player_layout,
                level_time,
                viewer_origin,
                &policy,
            )?;

            let number = self.snapshot.current_snapshot_number(LOOPBACK_CLIENT);
            if let Some(view) = self.snapshot.get_snapshot(number, LOOPBACK_CLIENT)? {
                self.server_to_client.push(ServerMessage::Snapshot {
                    number,
                    server_time: view.server_time,
                    player_state: view.player_state.to_vec(),
                    entities: view.entities.iter().map(|e| ReceivedEntity { entity_num: e.entity_num, state: e.state.clone() }).collect(),
                });
            }
        }

        Ok(())
    }

    /// One client presentation tick: pulls queued server messages, builds
    /// a `UserCmd`, hands it to the client-game guest, and requests a
    /// render (a no-op without a renderer collaborator attached).
    pub fn run_client_tick(&mut self, input: UserCmd) -> Result<(), EngineError> {
        while let Some(message) = self.server_to_client.pop() {
            match message {
                ServerMessage::ConnectAck => {
                    self.client_connection.advance(ConnectionState::Loading);
                    self.client_connection.advance(ConnectionState::Primed);
                }
                ServerMessage::Snapshot { number, server_time, player_state, entities } => {
                    self.client_connection.advance(ConnectionState::Active);
                    self.client_router.deliver_snapshot(ReceivedSnapshot { number, server_time, player_state, entities });
                }
            }
        }

        self.client_net.next_outgoing_sequence();
        self.client_to_server.push(ClientMessage::UserCmd(input));

        self.call_client(entry_points::client_game::DRAW_ACTIVE_FRAME, &[self.ticker.level_time() as i32])?;
        Ok(())
    }

    /// Advances the fixed-period server loop by `elapsed_msec` of real
    /// time, running as many server ticks are due (per `TickAccumulator`,
    /// which carries over any leftover sub-tick remainder), then one
    /// client tick (the client presents independently of the server's
    /// cadence).
    pub fn tick(&mut self, elapsed_msec: u32, input: UserCmd) -> Result<u32, EngineError> {
        let ticks_due = self.ticker.advance(elapsed_msec);
        for _ in 0..ticks_due {
            self.run_server_tick()?;
        }
        self.run_client_tick(input)?;
        debug!(ran = ticks_due, level_time = self.ticker.level_time(), "tick complete");
        Ok(ticks_due)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.client_connection
    }

    pub fn level_time(&self) -> u32 {
        self.ticker.level_time()
    }
}
