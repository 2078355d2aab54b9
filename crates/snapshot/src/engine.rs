// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Snapshot construction and retrieval: a shared ring of per-entity state
//! records, backing a per-client ring of snapshot descriptors.

use arena_core::{Vec3, MAX_CLIENTS, PACKET_BACKUP, PLAYER_STATE_SIZE};
use arena_vm::DataMemory;
use arena_world::{GentityLayout, World};
use tracing::debug;

use crate::error::SnapshotError;
use crate::visibility::VisibilityPolicy;

/// One entity's state as copied into the shared ring at build time.
#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    pub entity_num: i32,
    pub state: Vec<u8>,
}

/// Where a client's `playerState` record lives in guest memory.
#[derive(Debug, Clone, Copy)]
pub struct PlayerStateLayout {
    pub base: i32,
    pub stride: i32,
}

impl PlayerStateLayout {
    fn addr(&self, client: usize) -> i32 {
        self.base + self.stride * client as i32
    }
}

/// One client's descriptor for a single server frame.
#[derive(Debug, Clone, Default)]
struct ClientDescriptor {
    valid: bool,
    counter: u64,
    server_time: u32,
    player_state: Vec<u8>,
    first_entity: usize,
    num_entities: usize,
}

/// A read view into one retrieved snapshot; entity records may wrap across
/// the end of the shared ring, so they are returned already gathered.
pub struct SnapshotView<'a> {
    pub server_time: u32,
    pub player_state: &'a [u8],
    pub entities: Vec<&'a EntitySnapshot>,
}

/// Per-client ring buffers of captured entity and player states.
pub struct SnapshotEngine {
    shared_ring: Vec<EntitySnapshot>,
    next_slot: usize,
    descriptors: Vec<Vec<ClientDescriptor>>,
    counters: Vec<u64>,
    backup: usize,
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEngine {
    pub fn new() -> Self {
        Self::with_backup(PACKET_BACKUP)
    }

    /// Exposed for tests that want a small ring to exercise wraparound
    /// without building thousands of frames.
    pub fn with_backup(backup: usize) -> Self {
        let ring_len = MAX_CLIENTS * backup * arena_core::MAX_ENTITIES;
        Self {
            shared_ring: (0..ring_len).map(|_| EntitySnapshot { entity_num: -1, state: Vec::new() }).collect(),
            next_slot: 0,
            descriptors: (0..MAX_CLIENTS).map(|_| (0..backup).map(|_| ClientDescriptor::default()).collect()).collect(),
            counters: vec![0; MAX_CLIENTS],
            backup,
        }
    }

    fn client_checked(&self, client: usize) -> Result<(), SnapshotError> {
        if client >= MAX_CLIENTS {
            return Err(SnapshotError::ClientOutOfRange { client, max: MAX_CLIENTS });
        }
        Ok(())
    }

    /// Builds the next snapshot for `client`: copies its player state,
    /// walks every linked, client-visible entity, and records the result
    /// in the client's descriptor ring.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &mut self,
        client: usize,
        memory: &DataMemory,
        world: &World,
        gentity_layout: GentityLayout,
        player_layout: PlayerStateLayout,
        server_time: u32,
        viewer_origin: Vec3,
        policy: &dyn VisibilityPolicy,
    ) -> Result<(), SnapshotError> {
        self.client_checked(client)?;

        let player_state = memory.read_bytes(player_layout.addr(client), PLAYER_STATE_SIZE);
        let first_entity = self.next_slot;
        let mut num_entities = 0usize;

        for i in 0..gentity_layout.count {
            let entity_num = i as i32;
            let Ok(entity) = world.shared_entity(entity_num) else { continue };
            if !entity.linked || entity.no_client() {
                continue;
            }
            if !policy.visible(viewer_origin, entity.current_origin) {
                continue;
            }
            let addr = gentity_layout.base + entity_num * gentity_layout.stride;
            let state = memory.read_bytes(addr, arena_core::ENTITY_STATE_SIZE);
            let slot = self.next_slot % self.shared_ring.len();
            self.shared_ring[slot] = EntitySnapshot { entity_num, state };
            self.next_slot = self.next_slot.wrapping_add(1);
            num_entities += 1;
        }

        let counter = self.counters[client];
        let slot = (counter as usize) % self.backup;
        self.descriptors[client][slot] = ClientDescriptor {
            valid: true,
            counter,
            server_time,
            player_state,
            first_entity,
            num_entities,
        };
        self.counters[client] = counter + 1;

        debug!(client, num_entities, server_time, "built snapshot");
        Ok(())
    }

    /// Returns the descriptor identified by `number` for `client`, or
    /// `Ok(None)` if that slot has since been overwritten by a newer build.
    pub fn get_snapshot(&self, number: u64, client: usize) -> Result<Option<SnapshotView<'_>>, SnapshotError> {
        self.client_checked(client)?;
        let slot = (number as usize) % self.backup;
        let descriptor = &self.descriptors[client][slot];
        if !descriptor.valid || descriptor.counter != number {
            return Ok(None);
        }

        let entities = (0..descriptor.num_entities)
            .map(|i| &self.shared_ring[(descriptor.first_entity + i) % self.shared_ring.len()])
            .collect();

        Ok(Some(SnapshotView {
            server_time: descriptor.server_time,
            player_state: &descriptor.player_state,
            entities,
        }))
    }

    /// The counter value the next call to [`SnapshotEngine::build`] will
    /// assign for `client`; also the current snapshot number.
    pub fn current_snapshot_number(&self, client: usize) -> u64 {
        self.counters.get(client).copied().unwrap_or(0).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::Bounds;
    use arena_vm::DataMemory;
    use arena_world::{GentityLayout, World};

    const GENTITY: GentityLayout = GentityLayout { base: 0x1000, stride: 512, shared_offset: 416, count: 2 };
    const PLAYER: PlayerStateLayout = PlayerStateLayout { base: 0x20000, stride: 256 };

    fn linked_world() -> (World, DataMemory) {
        let mut world = World::new();
        world.build_sectors(Bounds::new(Vec3::new(-8192.0, -8192.0, -8192.0), Vec3::new(8192.0, 8192.0, 8192.0)));
        world.set_gentity_layout(GENTITY);
        let mut mem = DataMemory::new(262144);
        world.link_entity(&mut mem, 0).unwrap();
        (world, mem)
    }

    #[test]
    fn build_then_fetch_round_trips() {
        let (world, mem) = linked_world();
        let mut engine = SnapshotEngine::new();
        let policy = crate::visibility::DistanceBound::default();

        engine.build(0, &mem, &world, GENTITY, PLAYER, 1000, Vec3::ZERO, &policy).unwrap();

        let snap = engine.get_snapshot(0, 0).unwrap().expect("snapshot should be valid");
        assert_eq!(snap.server_time, 1000);
        assert_eq!(snap.entities.len(), 1);
        assert_eq!(snap.entities[0].entity_num, 0);
    }

    #[test]
    fn stale_descriptor_returns_none() {
        let (world, mem) = linked_world();
        let mut engine = SnapshotEngine::with_backup(4);
        let policy = crate::visibility::DistanceBound::default();

        for _ in 0..6 {
            engine.build(0, &mem, &world, GENTITY, PLAYER, 0, Vec3::ZERO, &policy).unwrap();
        }

        assert!(engine.get_snapshot(0, 0).unwrap().is_none());
        assert!(engine.get_snapshot(5, 0).unwrap().is_some());
    }

    #[test]
    fn unknown_client_is_rejected() {
        let engine = SnapshotEngine::new();
        assert!(engine.get_snapshot(0, MAX_CLIENTS).is_err());
    }
}
