// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! AABB-swept traces: a moving box from `start` to `end`, checked against
//! the external collision-model collaborator and every overlapping entity,
//! combined into a single nearest-hit result.

use arena_core::{Bounds, Vec3};

/// The outcome of sweeping a box through the world. `entity_num` is `-1`
/// for a hit against world geometry, or a valid entity index otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    pub fraction: f32,
    pub end_pos: Vec3,
    pub plane_normal: Vec3,
    pub contents: i32,
    pub entity_num: i32,
    pub all_solid: bool,
    pub start_solid: bool,
}

impl TraceResult {
    pub fn no_hit(end: Vec3) -> TraceResult {
        TraceResult {
            fraction: 1.0,
            end_pos: end,
            plane_normal: Vec3::ZERO,
            contents: 0,
            entity_num: -1,
            all_solid: false,
            start_solid: false,
        }
    }
}

/// The external BSP collision model this core depends on but does not
/// implement. Tests and a bare engine with no loaded map use
/// [`NoWorldGeometry`], which never blocks a trace.
pub trait WorldCollision {
    fn trace_world(&self, start: Vec3, end: Vec3, mins: Vec3, maxs: Vec3, content_mask: i32) -> TraceResult;
    fn point_contents(&self, point: Vec3) -> i32;
}

/// A stand-in collision model with no brushes: every trace reaches `end`.
pub struct NoWorldGeometry;

impl WorldCollision for NoWorldGeometry {
    fn trace_world(&self, _start: Vec3, end: Vec3, _mins: Vec3, _maxs: Vec3, _content_mask: i32) -> TraceResult {
        TraceResult::no_hit(end)
    }

    fn point_contents(&self, _point: Vec3) -> i32 {
        0
    }
}

/// One candidate entity to sweep against, already reduced to what the
/// trace needs (absolute bounds, contents, owner, and its own number).
#[derive(Debug, Clone, Copy)]
pub struct TraceCandidate {
    pub entity_num: i32,
    pub owner_num: i32,
    pub abs_min: Vec3,
    pub abs_max: Vec3,
    pub contents: i32,
}

/// Minkowski-expands `entity` by the moving box's half-extents and
/// performs a slab ray/AABB intersection, returning the entry fraction if
/// the ray enters the expanded box within `[0, current_best]`.
fn sweep_against_entity(
    start: Vec3,
    delta: Vec3,
    mins: Vec3,
    maxs: Vec3,
    entity: &TraceCandidate,
) -> Option<(f32, Vec3)> {
    let expanded = Bounds::new(entity.abs_min - maxs, entity.abs_max - mins);

    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;
    let mut normal_axis = 0usize;
    let mut normal_sign = -1.0f32;

    let axes = [
        (start.x, delta.x, expanded.mins.x, expanded.maxs.x),
        (start.y, delta.y, expanded.mins.y, expanded.maxs.y),
        (start.z, delta.z, expanded.mins.z, expanded.maxs.z),
    ];

    for (axis, (s, d, lo, hi)) in axes.iter().enumerate() {
        if d.abs() < f32::EPSILON {
            if *s < *lo || *s > *hi {
                return None;
            }
            continue;
        }
        let mut t0 = (lo - s) / d;
        let mut t1 = (hi - s) / d;
        let mut sign = -1.0f32;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            sign = 1.0;
        }
        if t0 > t_enter {
            t_enter = t0;
            normal_axis = axis;
            normal_sign = sign;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter > t_exit || t_enter < 0.0 || t_enter > 1.0 {
        return None;
    }

    let mut normal = Vec3::ZERO;
    match normal_axis {
        0 => normal.x = normal_sign,
        1 => normal.y = normal_sign,
        _ => normal.z = normal_sign,
    }
    Some((t_enter, normal))
}

/// Sweeps a box with extents `[mins, maxs]` from `start` to `end`, first
/// against world geometry, then against every candidate entity not equal
/// to or owned by `pass_entity_num`, whose contents intersect
/// `content_mask`. The minimum-fraction hit wins.
pub fn trace(
    world: &dyn WorldCollision,
    start: Vec3,
    end: Vec3,
    mins: Vec3,
    maxs: Vec3,
    pass_entity_num: i32,
    content_mask: i32,
    candidates: &[TraceCandidate],
) -> TraceResult {
    let mut best = world.trace_world(start, end, mins, maxs, content_mask);
    let delta = end - start;

    for candidate in candidates {
        if candidate.entity_num == pass_entity_num || candidate.owner_num == pass_entity_num {
            continue;
        }
        if candidate.contents & content_mask == 0 {
            continue;
        }
        if let Some((fraction, normal)) = sweep_against_entity(start, delta, mins, maxs, candidate) {
            if fraction < best.fraction {
                best = TraceResult {
                    fraction,
                    end_pos: start + delta * fraction,
                    plane_normal: normal,
                    contents: candidate.contents,
                    entity_num: candidate.entity_num,
                    all_solid: false,
                    start_solid: false,
                };
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_trace_hits_expanded_entity_box() {
        let candidate = TraceCandidate {
            entity_num: 3,
            owner_num: -1,
            abs_min: Vec3::new(-16.0, -16.0, -25.0),
            abs_max: Vec3::new(16.0, 16.0, 33.0),
            contents: 0x0200_0000,
        };
        let start = Vec3::new(-100.0, 0.0, 0.0);
        let end = Vec3::new(100.0, 0.0, 0.0);
        let result = trace(
            &NoWorldGeometry,
            start,
            end,
            Vec3::ZERO,
            Vec3::ZERO,
            -1,
            0x0200_0000,
            &[candidate],
        );
        assert_eq!(result.entity_num, 3);
        assert!((result.fraction - 0.42).abs() < 0.02, "fraction was {}", result.fraction);
    }

    #[test]
    fn pass_entity_is_ignored() {
        let candidate = TraceCandidate {
            entity_num: 3,
            owner_num: -1,
            abs_min: Vec3::new(-16.0, -16.0, -25.0),
            abs_max: Vec3::new(16.0, 16.0, 33.0),
            contents: 0x0200_0000,
        };
        let result = trace(
            &NoWorldGeometry,
            Vec3::new(-100.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            3,
            0x0200_0000,
            &[candidate],
        );
        assert_eq!(result.entity_num, -1);
        assert_eq!(result.fraction, 1.0);
    }

    #[test]
    fn content_mask_filters_non_matching_entities() {
        let candidate = TraceCandidate {
            entity_num: 3,
            owner_num: -1,
            abs_min: Vec3::new(-16.0, -16.0, -25.0),
            abs_max: Vec3::new(16.0, 16.0, 33.0),
            contents: 0x0000_0001,
        };
        let result = trace(
            &NoWorldGeometry,
            Vec3::new(-100.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            -1,
            0x0200_0000,
            &[candidate],
        );
        assert_eq!(result.entity_num, -1);
    }
}
