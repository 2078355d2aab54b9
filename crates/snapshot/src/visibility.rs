// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! What counts as "visible" when deciding which entities enter a client's
//! snapshot. The authoritative engine answers this from BSP cluster
//! visibility; this core ships only a distance-bound approximation and
//! leaves a seam for a real implementation to plug in later.

use arena_core::{Vec3, DEFAULT_VISIBILITY_DISTANCE};

/// Decides whether an entity at `entity_origin` should be included in a
/// snapshot built from `viewer_origin`.
pub trait VisibilityPolicy {
    fn visible(&self, viewer_origin: Vec3, entity_origin: Vec3) -> bool;
}

/// The default policy: everything within a fixed radius is visible. Stands
/// in for potentially-visible-set computation until a BSP cluster reader
/// is available to supply one.
#[derive(Debug, Clone, Copy)]
pub struct DistanceBound {
    pub distance: f32,
}

impl Default for DistanceBound {
    fn default() -> Self {
        Self { distance: DEFAULT_VISIBILITY_DISTANCE }
    }
}

impl VisibilityPolicy for DistanceBound {
    fn visible(&self, viewer_origin: Vec3, entity_origin: Vec3) -> bool {
        (entity_origin - viewer_origin).length() <= self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_inside_radius_are_visible() {
        let policy = DistanceBound { distance: 100.0 };
        assert!(policy.visible(Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)));
        assert!(!policy.visible(Vec3::ZERO, Vec3::new(150.0, 0.0, 0.0)));
    }
}
