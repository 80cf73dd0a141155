//! Positional collision resolution between proxies and against the player.
//!
//! ## Model
//!
//! - **Obstacles**: floor and wall proxies never move. A proxy overlapping
//!   one is pushed fully out along the line between the two centers; landing
//!   on a floor also kills downward velocity.
//! - **Pairs**: two overlapping movable proxies each move half the
//!   penetration apart and swap velocities. This is a cheap stand-in for an
//!   elastic collision of equal masses, not a real impulse response. When a
//!   proxy resting on its minimum height cannot take its half, the partner
//!   takes it, so the pair always ends at least `r_a + r_b` apart.
//! - **Player**: the capsule's top point shoves proxies away by half the
//!   penetration and, for gravity-enabled props, kicks them with half the
//!   player's speed.
//!
//! Pairs are visited in list order, so three-way overlaps settle over
//! several substeps rather than in one pass.
//!
//! ```text
//!   before           after
//!   (A)(B)   ──►   (A)  (B)      each moved pen/2, velocities swapped
//! ```

use super::detection::sphere_overlap;
use crate::proxy::{Proxy, ProxyKind};
use crate::types::{Capsule, Vec3};

/// Borrow two distinct proxies mutably.
fn pair_mut(proxies: &mut [Proxy], i: usize, j: usize) -> (&mut Proxy, &mut Proxy) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = proxies.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = proxies.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Collision resolver for proxies.
pub struct ProxyResolver;

impl ProxyResolver {
    /// Push proxy `index` out of every floor and wall it overlaps.
    ///
    /// Returns the number of obstacles that were touching it.
    pub fn resolve_obstacles(proxies: &mut [Proxy], index: usize) -> usize {
        if proxies[index].is_immovable() {
            return 0;
        }

        let mut touched = 0;
        for other in 0..proxies.len() {
            if other == index || !proxies[other].is_immovable() {
                continue;
            }

            let (other_pos, other_radius, other_kind) =
                (proxies[other].pos, proxies[other].radius(), proxies[other].kind);
            let this = &mut proxies[index];

            if let Some(overlap) = sphere_overlap(this.pos, this.radius(), other_pos, other_radius) {
                touched += 1;
                this.pos += overlap.direction * overlap.penetration;

                if other_kind == ProxyKind::Floor && this.vel.y < 0.0 {
                    this.vel.y = 0.0;
                }
            }
        }

        proxies[index].clamp_to_min_height();
        touched
    }

    /// Separate proxy `index` from every proxy it overlaps.
    ///
    /// Movable partners share the correction and exchange velocities. An
    /// immovable partner stays put and lends its own velocity, so the proxy
    /// stops dead against it.
    pub fn resolve_pairs(proxies: &mut [Proxy], index: usize) -> usize {
        if proxies[index].is_immovable() {
            return 0;
        }

        let mut touched = 0;
        for other in 0..proxies.len() {
            if other == index {
                continue;
            }

            let (this, that) = pair_mut(proxies, index, other);
            let Some(overlap) = sphere_overlap(this.pos, this.radius(), that.pos, that.radius()) else {
                continue;
            };
            touched += 1;

            let push = overlap.direction * (overlap.penetration * 0.5);
            this.pos += push;

            if that.is_immovable() {
                this.vel = that.vel;
                this.clamp_to_min_height();
                continue;
            }

            that.pos -= push;
            std::mem::swap(&mut this.vel, &mut that.vel);

            // Whatever share of the push the min-height clamp takes back is
            // handed on to the partner along the same line.
            let lift = that.raise_to_min_height();
            this.pos += overlap.direction * lift;
            let lift = this.raise_to_min_height();
            that.pos -= overlap.direction * lift;
        }

        touched
    }

    /// Shove proxy `index` away from the player's capsule top point.
    ///
    /// Returns `true` when the player was touching it.
    pub fn resolve_player(
        proxies: &mut [Proxy],
        index: usize,
        capsule: &Capsule,
        player_vel: Vec3,
    ) -> bool {
        let this = &mut proxies[index];
        let Some(overlap) = sphere_overlap(this.pos, this.radius(), capsule.end, capsule.radius) else {
            return false;
        };

        if this.is_immovable() {
            return true;
        }

        this.pos += overlap.direction * (overlap.penetration * 0.5);
        if this.props.use_gravity {
            this.push(overlap.direction, player_vel.magnitude() * 0.5);
        }
        this.clamp_to_min_height();

        // The shove must not tunnel the proxy into a wall or the floor
        Self::resolve_obstacles(proxies, index);
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
