// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The host's mirror of one gentity's `entityShared` bookkeeping record,
//! and the server-only fields that never cross the host/guest boundary.

use arena_core::Vec3;

/// Host-visible bookkeeping for one entity, refreshed from guest memory on
/// every link and written back at the fixed offsets the guest reads
/// directly.
#[derive(Debug, Clone, Default)]
pub struct SharedEntity {
    pub linked: bool,
    pub link_count: i32,
    pub sv_flags: i32,
    pub single_client: i32,
    pub bmodel: bool,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub contents: i32,
    pub abs_min: Vec3,
    pub abs_max: Vec3,
    pub current_origin: Vec3,
    pub current_angles: Vec3,
    pub owner_num: i32,
}

impl SharedEntity {
    /// `svFlags` bit that marks an entity invisible to snapshot building.
    pub const SVF_NOCLIENT: i32 = 1 << 0;

    pub fn no_client(&self) -> bool {
        self.sv_flags & Self::SVF_NOCLIENT != 0
    }

    /// Computes `absmin/absmax`: brush models are already world-space,
    /// everything else is relative to `currentOrigin`. Both are padded by
    /// one unit in each direction.
    pub fn compute_absolute_bounds(&mut self) {
        if self.bmodel {
            self.abs_min = self.mins.expand(-1.0);
            self.abs_max = self.maxs.expand(1.0);
        } else {
            self.abs_min = (self.current_origin + self.mins).expand(-1.0);
            self.abs_max = (self.current_origin + self.maxs).expand(1.0);
        }
    }
}

/// Server-only bookkeeping that has no guest-memory counterpart: which
/// sector an entity currently belongs to, and the intrusive linked-list
/// pointer used to walk that sector's chain.
#[derive(Debug, Clone, Default)]
pub struct ServerEntity {
    pub sector: Option<usize>,
    pub next_in_sector: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_bmodel_bounds_are_relative_to_origin() {
        let mut e = SharedEntity {
            current_origin: Vec3::new(10.0, 0.0, 0.0),
            mins: Vec3::new(-15.0, -15.0, -24.0),
            maxs: Vec3::new(15.0, 15.0, 32.0),
            ..Default::default()
        };
        e.compute_absolute_bounds();
        assert_eq!(e.abs_min, Vec3::new(-6.0, -16.0, -25.0));
        assert_eq!(e.abs_max, Vec3::new(26.0, 16.0, 33.0));
    }

    #[test]
    fn bmodel_bounds_are_already_world_space() {
        let mut e = SharedEntity {
            bmodel: true,
            mins: Vec3::new(0.0, 0.0, 0.0),
            maxs: Vec3::new(64.0, 64.0, 64.0),
            ..Default::default()
        };
        e.compute_absolute_bounds();
        assert_eq!(e.abs_min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(e.abs_max, Vec3::new(65.0, 65.0, 65.0));
    }
}
