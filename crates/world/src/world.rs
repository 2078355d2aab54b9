// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The shared world: the host-side entity table, the spatial partition
//! built over it, and the guest-memory mirroring that keeps both in sync
//! with the gentity array a loaded game module owns.

use arena_core::{Bounds, Vec3, MAX_ENTITIES};
use arena_vm::DataMemory;
use tracing::trace as log_trace;

use crate::entity::{ServerEntity, SharedEntity};
use crate::error::WorldError;
use crate::sector::SectorTree;
use crate::trace::{trace as sweep_trace, NoWorldGeometry, TraceCandidate, TraceResult, WorldCollision};

/// Byte layout of one `entityShared` record, relative to the start of the
/// record. The record itself sits at `GentityLayout::shared_offset` inside
/// one gentity.
mod shared_field {
    pub const LINKED: i32 = 0;
    pub const LINK_COUNT: i32 = 4;
    pub const SV_FLAGS: i32 = 8;
    pub const SINGLE_CLIENT: i32 = 12;
    pub const BMODEL: i32 = 16;
    pub const MINS: i32 = 20;
    pub const MAXS: i32 = 32;
    pub const CONTENTS: i32 = 44;
    pub const ABS_MIN: i32 = 48;
    pub const ABS_MAX: i32 = 60;
    pub const CURRENT_ORIGIN: i32 = 72;
    pub const CURRENT_ANGLES: i32 = 84;
    pub const OWNER_NUM: i32 = 96;
}

/// Where the game module's gentity array lives in guest memory, as reported
/// by its "locate game data" call. `stride` is the size in bytes of one
/// gentity; `shared_offset` is the fixed offset of the `entityShared` record
/// within it.
#[derive(Debug, Clone, Copy)]
pub struct GentityLayout {
    pub base: i32,
    pub stride: i32,
    pub shared_offset: i32,
    pub count: usize,
}

impl GentityLayout {
    fn record_addr(&self, entity_num: i32) -> i32 {
        self.base + entity_num * self.stride + self.shared_offset
    }
}

/// The shared world owned by the server: the full entity table mirrored
/// from guest memory, the sector tree built over the loaded map's bounds,
/// and a pluggable world-geometry collaborator for traces.
pub struct World {
    entities: Vec<SharedEntity>,
    server_entities: Vec<ServerEntity>,
    sectors: Option<SectorTree>,
    world_bounds: Bounds,
    layout: Option<GentityLayout>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: (0..MAX_ENTITIES).map(|_| SharedEntity::default()).collect(),
            server_entities: (0..MAX_ENTITIES).map(|_| ServerEntity::default()).collect(),
            sectors: None,
            world_bounds: Bounds::default(),
            layout: None,
        }
    }

    /// Builds the sector tree over `bounds`, discarding any previous one.
    /// Called once per map load.
    pub fn build_sectors(&mut self, bounds: Bounds) {
        self.world_bounds = bounds;
        self.sectors = Some(SectorTree::build(bounds));
        for server_entity in &mut self.server_entities {
            *server_entity = ServerEntity::default();
        }
    }

    pub fn set_gentity_layout(&mut self, layout: GentityLayout) {
        self.layout = Some(layout);
    }

    fn entity_checked(&self, entity_num: i32) -> Result<usize, WorldError> {
        if entity_num < 0 || entity_num as usize >= MAX_ENTITIES {
            return Err(WorldError::EntityOutOfRange { num: entity_num, max: MAX_ENTITIES });
        }
        Ok(entity_num as usize)
    }

    /// Refreshes the host's `SharedEntity` for `entity_num` from guest
    /// memory, recomputes `absmin/absmax`, places it in the sector tree,
    /// and writes the linkage fields (`linked`, `linkCount`, `absmin`,
    /// `absmax`) back into the guest record.
    pub fn link_entity(&mut self, memory: &mut DataMemory, entity_num: i32) -> Result<(), WorldError> {
        let idx = self.entity_checked(entity_num)?;
        if self.sectors.is_none() {
            return Err(WorldError::SectorsNotBuilt);
        }
        let layout = self.layout.ok_or(WorldError::LayoutNotSet)?;
        let addr = layout.record_addr(entity_num);

        let mut shared = SharedEntity {
            sv_flags: memory.read32(addr + shared_field::SV_FLAGS),
            single_client: memory.read32(addr + shared_field::SINGLE_CLIENT),
            bmodel: memory.read32(addr + shared_field::BMODEL) != 0,
            mins: read_vec3(memory, addr + shared_field::MINS),
            maxs: read_vec3(memory, addr + shared_field::MAXS),
            contents: memory.read32(addr + shared_field::CONTENTS),
            current_origin: read_vec3(memory, addr + shared_field::CURRENT_ORIGIN),
            current_angles: read_vec3(memory, addr + shared_field::CURRENT_ANGLES),
            owner_num: memory.read32(addr + shared_field::OWNER_NUM),
            linked: true,
            link_count: self.entities[idx].link_count + 1,
            abs_min: Vec3::ZERO,
            abs_max: Vec3::ZERO,
        };
        shared.compute_absolute_bounds();

        memory.write32(addr + shared_field::LINKED, 1);
        memory.write32(addr + shared_field::LINK_COUNT, shared.link_count);
        write_vec3(memory, addr + shared_field::ABS_MIN, shared.abs_min);
        write_vec3(memory, addr + shared_field::ABS_MAX, shared.abs_max);

        self.entities[idx] = shared;
        self.place_in_sector(idx);
        Ok(())
    }

    /// Marks `entity_num` unlinked, removes it from the sector it occupied,
    /// and writes `linked = 0` back to the guest record.
    pub fn unlink_entity(&mut self, memory: &mut DataMemory, entity_num: i32) -> Result<(), WorldError> {
        let idx = self.entity_checked(entity_num)?;
        if let Some(layout) = self.layout {
            memory.write32(layout.record_addr(entity_num) + shared_field::LINKED, 0);
        }
        self.entities[idx].linked = false;
        self.remove_from_sector(idx);
        Ok(())
    }

    /// Splices entity `idx` out of whatever sector chain it currently
    /// occupies, scanning from the sector's head since the chain is
    /// singly linked and carries no back-pointer. Sectors hold few enough
    /// entities that this scan is cheap; a no-op if the entity isn't
    /// linked into any sector yet.
    fn remove_from_sector(&mut self, idx: usize) {
        let Some(sector_index) = self.server_entities[idx].sector else { return };
        let Some(sectors) = &self.sectors else { return };
        let head = sectors.node(sector_index).first_entity;
        let next = self.server_entities[idx].next_in_sector;

        if head == Some(idx) {
            self.sectors.as_mut().unwrap().node_mut(sector_index).first_entity = next;
        } else {
            let mut cursor = head;
            while let Some(scan_idx) = cursor {
                if self.server_entities[scan_idx].next_in_sector == Some(idx) {
                    self.server_entities[scan_idx].next_in_sector = next;
                    break;
                }
                cursor = self.server_entities[scan_idx].next_in_sector;
            }
        }

        self.server_entities[idx].sector = None;
        self.server_entities[idx].next_in_sector = None;
    }

    /// Unlinks entity `idx` from any sector it currently occupies, then
    /// descends the tree by its current `absmin/absmax` center and
    /// prepends it to the leaf sector it falls into.
    fn place_in_sector(&mut self, idx: usize) {
        self.remove_from_sector(idx);
        let Some(sectors) = &self.sectors else { return };
        let center = (self.entities[idx].abs_min + self.entities[idx].abs_max) * 0.5;
        let mut node_index = sectors.root;
        loop {
            let node = sectors.node(node_index);
            if node.is_leaf() {
                break;
            }
            let coord = match node.axis {
                0 => center.x,
                1 => center.y,
                _ => center.z,
            };
            let next = if coord < node.dist { node.children[1] } else { node.children[0] };
            match next {
                Some(n) => node_index = n,
                None => break,
            }
        }
        self.server_entities[idx].next_in_sector = self.sectors.as_ref().unwrap().node(node_index).first_entity;
        self.sectors.as_mut().unwrap().node_mut(node_index).first_entity = Some(idx);
        self.server_entities[idx].sector = Some(node_index);
    }

    /// Descends the sector tree, visiting only the leaves whose split
    /// range can overlap `query`, and collects the entity indices filed
    /// into each of those leaves by walking `first_entity`/`next_in_sector`.
    fn sector_query(&self, query: Bounds) -> Vec<usize> {
        let Some(sectors) = &self.sectors else { return Vec::new() };
        let mut out = Vec::new();
        self.walk_sector(sectors, sectors.root, query, &mut out);
        out
    }

    fn walk_sector(&self, sectors: &SectorTree, node_index: usize, query: Bounds, out: &mut Vec<usize>) {
        let node = sectors.node(node_index);
        if node.is_leaf() {
            let mut cursor = node.first_entity;
            while let Some(idx) = cursor {
                out.push(idx);
                cursor = self.server_entities[idx].next_in_sector;
            }
            return;
        }

        let (lo, hi) = match node.axis {
            0 => (query.mins.x, query.maxs.x),
            1 => (query.mins.y, query.maxs.y),
            _ => (query.mins.z, query.maxs.z),
        };
        if lo > node.dist {
            if let Some(front) = node.children[0] {
                self.walk_sector(sectors, front, query, out);
            }
        } else if hi < node.dist {
            if let Some(back) = node.children[1] {
                self.walk_sector(sectors, back, query, out);
            }
        } else {
            if let Some(front) = node.children[0] {
                self.walk_sector(sectors, front, query, out);
            }
            if let Some(back) = node.children[1] {
                self.walk_sector(sectors, back, query, out);
            }
        }
    }

    /// Every linked entity number whose `absmin/absmax` intersects `bounds`,
    /// found by descending the sector tree rather than scanning the whole
    /// entity table.
    pub fn entities_in_box(&self, bounds: Bounds) -> Vec<i32> {
        self.sector_query(bounds)
            .into_iter()
            .filter(|&idx| self.entities[idx].linked)
            .filter(|&idx| Bounds::new(self.entities[idx].abs_min, self.entities[idx].abs_max).intersects(&bounds))
            .map(|idx| idx as i32)
            .collect()
    }

    fn candidates(&self, pass_entity_num: i32, query: Bounds) -> Vec<TraceCandidate> {
        self.sector_query(query)
            .into_iter()
            .filter(|&idx| self.entities[idx].linked && idx as i32 != pass_entity_num)
            .map(|idx| {
                let e = &self.entities[idx];
                TraceCandidate {
                    entity_num: idx as i32,
                    owner_num: e.owner_num,
                    abs_min: e.abs_min,
                    abs_max: e.abs_max,
                    contents: e.contents,
                }
            })
            .collect()
    }

    /// Sweeps a box from `start` to `end` against world geometry (via
    /// `world`) and every linked entity not excluded by `pass_entity_num`,
    /// filtered by `content_mask`. The entity candidate set is gathered by
    /// querying the sector tree over the swept volume's bounding box.
    pub fn trace(
        &self,
        world: &dyn WorldCollision,
        start: Vec3,
        end: Vec3,
        mins: Vec3,
        maxs: Vec3,
        pass_entity_num: i32,
        content_mask: i32,
    ) -> TraceResult {
        let query = Bounds::new(start.min(end) + mins, start.max(end) + maxs);
        let candidates = self.candidates(pass_entity_num, query);
        log_trace!(count = candidates.len(), "tracing against sector-queried entities");
        sweep_trace(world, start, end, mins, maxs, pass_entity_num, content_mask, &candidates)
    }

    /// Convenience overload of [`World::trace`] against an empty world (no
    /// loaded BSP geometry), used by callers that only care about entity
    /// collision.
    pub fn trace_entities_only(&self, start: Vec3, end: Vec3, mins: Vec3, maxs: Vec3, pass_entity_num: i32, content_mask: i32) -> TraceResult {
        self.trace(&NoWorldGeometry, start, end, mins, maxs, pass_entity_num, content_mask)
    }

    pub fn point_contents(&self, world: &dyn WorldCollision, point: Vec3) -> i32 {
        let mut contents = world.point_contents(point);
        for entity in &self.entities {
            if entity.linked && point.within(entity.abs_min, entity.abs_max) {
                contents |= entity.contents;
            }
        }
        contents
    }

    pub fn shared_entity(&self, entity_num: i32) -> Result<&SharedEntity, WorldError> {
        let idx = self.entity_checked(entity_num)?;
        Ok(&self.entities[idx])
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

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: GentityLayout = GentityLayout { base: 0x1000, stride: 512, shared_offset: 416, count: 4 };

    fn memory_with_entity(entity_num: i32, mins: Vec3, maxs: Vec3, origin: Vec3, contents: i32) -> DataMemory {
        let mut mem = DataMemory::new(arena_vm::next_power_of_two(0x1000 + 512 * 4).max(65536));
        let addr = LAYOUT.record_addr(entity_num);
        write_vec3(&mut mem, addr + shared_field::MINS, mins);
        write_vec3(&mut mem, addr + shared_field::MAXS, maxs);
        write_vec3(&mut mem, addr + shared_field::CURRENT_ORIGIN, origin);
        mem.write32(addr + shared_field::CONTENTS, contents);
        mem.write32(addr + shared_field::OWNER_NUM, -1);
        mem
    }

    #[test]
    fn link_entity_writes_back_absolute_bounds() {
        let mut world = World::new();
        world.build_sectors(Bounds::new(Vec3::new(-8192.0, -8192.0, -8192.0), Vec3::new(8192.0, 8192.0, 8192.0)));
        world.set_gentity_layout(LAYOUT);
        let mut mem = memory_with_entity(1, Vec3::new(-15.0, -15.0, -24.0), Vec3::new(15.0, 15.0, 32.0), Vec3::ZERO, 0x0200_0000);

        world.link_entity(&mut mem, 1).unwrap();

        let addr = LAYOUT.record_addr(1);
        assert_eq!(mem.read32(addr + shared_field::LINKED), 1);
        assert_eq!(mem.read32(addr + shared_field::LINK_COUNT), 1);
        let abs_min = read_vec3(&mem, addr + shared_field::ABS_MIN);
        assert_eq!(abs_min, Vec3::new(-16.0, -16.0, -25.0));
    }

    #[test]
    fn unlink_entity_clears_linked_flag() {
        let mut world = World::new();
        world.build_sectors(Bounds::new(Vec3::new(-8192.0, -8192.0, -8192.0), Vec3::new(8192.0, 8192.0, 8192.0)));
        world.set_gentity_layout(LAYOUT);
        let mut mem = memory_with_entity(1, Vec3::new(-15.0, -15.0, -24.0), Vec3::new(15.0, 15.0, 32.0), Vec3::ZERO, 0x0200_0000);
        world.link_entity(&mut mem, 1).unwrap();

        world.unlink_entity(&mut mem, 1).unwrap();

        let addr = LAYOUT.record_addr(1);
        assert_eq!(mem.read32(addr + shared_field::LINKED), 0);
        assert!(world.entities_in_box(Bounds::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0))).is_empty());
    }

    #[test]
    fn entities_in_box_finds_linked_overlap() {
        let mut world = World::new();
        world.build_sectors(Bounds::new(Vec3::new(-8192.0, -8192.0, -8192.0), Vec3::new(8192.0, 8192.0, 8192.0)));
        world.set_gentity_layout(LAYOUT);
        let mut mem = memory_with_entity(2, Vec3::new(-15.0, -15.0, -24.0), Vec3::new(15.0, 15.0, 32.0), Vec3::ZERO, 0x0200_0000);
        world.link_entity(&mut mem, 2).unwrap();

        let hits = world.entities_in_box(Bounds::new(Vec3::new(-20.0, -20.0, -20.0), Vec3::new(20.0, 20.0, 20.0)));
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn trace_hits_linked_entity_end_to_end() {
        let mut world = World::new();
        world.build_sectors(Bounds::new(Vec3::new(-8192.0, -8192.0, -8192.0), Vec3::new(8192.0, 8192.0, 8192.0)));
        world.set_gentity_layout(LAYOUT);
        let mut mem = memory_with_entity(3, Vec3::new(-15.0, -15.0, -24.0), Vec3::new(15.0, 15.0, 32.0), Vec3::ZERO, 0x0200_0000);
        world.link_entity(&mut mem, 3).unwrap();

        let result = world.trace_entities_only(
            Vec3::new(-100.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            -1,
            0x0200_0000,
        );
        assert_eq!(result.entity_num, 3);
        assert!((result.fraction - 0.425).abs() < 0.01, "fraction was {}", result.fraction);
    }
}
