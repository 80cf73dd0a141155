//! Fixed-substep integrators for proxies and the player.
//!
//! Both integrators are semi-implicit Euler: velocity is updated from the
//! accelerations first, then position is advanced with the new velocity.
//!
//! ```text
//! 1. v += a(x, v) * dt
//! 2. x += v * dt
//! 3. clamp x.y to the floor height, zeroing v.y
//! 4. v *= friction            (per substep, not per second)
//! 5. clamp x.x, x.z into the proxy's bounds, if it has any
//! ```
//!
//! Friction is applied per call, so the caller must split a frame into a
//! fixed number of substeps for the decay to be frame-rate independent.

use crate::proxy::Proxy;
use crate::types::{constants, Vec3};

/// Computes the acceleration acting on a proxy.
pub trait ForceModel {
    fn acceleration(&self, proxy: &Proxy) -> Vec3;
}

/// Constant downward pull for proxies with gravity enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    /// Magnitude of the acceleration (m/s²)
    pub strength: f64,
}

impl Gravity {
    pub fn new(strength: f64) -> Self {
        Self { strength }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(constants::GRAVITY)
    }
}

impl ForceModel for Gravity {
    fn acceleration(&self, proxy: &Proxy) -> Vec3 {
        if proxy.props.use_gravity {
            Vec3::new(0.0, -self.strength, 0.0)
        } else {
            Vec3::ZERO
        }
    }
}

/// Semi-implicit Euler integrator for proxies.
pub struct SemiImplicitEuler;

impl SemiImplicitEuler {
    /// Advance one proxy by a single substep.
    ///
    /// Returns `true` when the floor clamp fired.
    pub fn step<F: ForceModel>(proxy: &mut Proxy, forces: &F, dt: f64) -> bool {
        let acceleration = forces.acceleration(proxy);
        proxy.vel += acceleration * dt;
        proxy.pos += proxy.vel * dt;

        let clamped = proxy.clamp_to_min_height();

        proxy.vel = proxy.vel * proxy.props.friction;
        proxy.clamp_to_bounds();
        clamped
    }
}

/// Damping parameters for the player's velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerDamping {
    /// Exponential decay rate on the ground (1/s)
    pub rate: f64,
    /// Multiplier on the damping while airborne
    pub air_factor: f64,
}

impl Default for PlayerDamping {
    fn default() -> Self {
        Self {
            rate: 4.0,
            air_factor: 0.1,
        }
    }
}

/// Apply gravity (when airborne) and exponential damping to the player's
/// velocity for one substep.
pub fn damp_player_velocity(
    vel: Vec3,
    on_floor: bool,
    gravity: f64,
    damping: &PlayerDamping,
    dt: f64,
) -> Vec3 {
    let mut vel = vel;
    let mut factor = (-damping.rate * dt).exp() - 1.0;

    if !on_floor {
        vel.y -= gravity * dt;
        factor *= damping.air_factor;
    }

    vel + vel * factor
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ProxyKind, ProxyProperties};
    use crate::types::Aabb;
    use approx::assert_relative_eq;

    fn run<F: ForceModel>(proxy: &mut Proxy, forces: &F, dt: f64, substeps: usize) {
        for _ in 0..substeps {
            SemiImplicitEuler::step(proxy, forces, dt);
        }
    }

    fn falling_proxy(height: f64) -> Proxy {
        Proxy::new(
            "ball",
            ProxyKind::Prop,
            Vec3::new(0.0, height, 0.0),
            ProxyProperties {
                radius: 0.5,
                use_gravity: true,
                friction: 1.0,
                min_height: 0.5,
                bounds: None,
            },
        )
    }

    #[test]
    fn test_gravity_accumulates_linearly() {
        let mut proxy = falling_proxy(100.0);
        let gravity = Gravity::default();
        let dt = 1.0 / 300.0;

        run(&mut proxy, &gravity, dt, 30);

        assert_relative_eq!(proxy.vel.y, -constants::GRAVITY * dt * 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_gravity_keeps_vertical_velocity() {
        let mut proxy = falling_proxy(3.0);
        proxy.props.use_gravity = false;

        run(&mut proxy, &Gravity::default(), 0.01, 10);

        assert_eq!(proxy.vel, Vec3::ZERO);
        assert_eq!(proxy.pos.y, 3.0);
    }

    #[test]
    fn test_floor_clamp_zeroes_vertical_velocity() {
        let mut proxy = falling_proxy(0.51);
        proxy.vel = Vec3::new(0.0, -10.0, 0.0);

        let clamped = SemiImplicitEuler::step(&mut proxy, &Gravity::default(), 0.01);

        assert!(clamped);
        assert_eq!(proxy.pos.y, 0.5);
        assert_eq!(proxy.vel.y, 0.0);
    }

    #[test]
    fn test_friction_applies_even_at_rest_height() {
        let mut proxy = falling_proxy(0.5);
        proxy.props.friction = 0.5;
        proxy.vel = Vec3::new(4.0, 0.0, 0.0);

        SemiImplicitEuler::step(&mut proxy, &Gravity::default(), 0.01);

        assert_relative_eq!(proxy.vel.x, 2.0, epsilon = 1e-12);
        assert_eq!(proxy.vel.y, 0.0);
    }

    #[test]
    fn test_bounds_hold_sliding_prop_inside_store() {
        let mut proxy = falling_proxy(0.5);
        proxy.props.bounds = Some(Aabb::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 5.0, 10.0)));
        proxy.pos = Vec3::new(9.9, 0.5, 0.1);
        proxy.vel = Vec3::new(50.0, 0.0, -50.0);

        SemiImplicitEuler::step(&mut proxy, &Gravity::default(), 0.01);

        assert_eq!(proxy.pos.x, 10.0);
        assert_eq!(proxy.pos.z, 0.0);
        assert_eq!(proxy.pos.y, 0.5);
        // The clamp moves the proxy but leaves its velocity alone
        assert_relative_eq!(proxy.vel.x, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_landing_settles_exactly_at_min_height() {
        let mut proxy = falling_proxy(5.0);
        let gravity = Gravity::default();
        let dt = 1.0 / 300.0;

        let mut landed = false;
        for _ in 0..2000 {
            let clamped = SemiImplicitEuler::step(&mut proxy, &gravity, dt);
            assert!(proxy.pos.y >= proxy.props.min_height);
            if clamped {
                landed = true;
                assert_eq!(proxy.pos.y, 0.5);
                assert_eq!(proxy.vel.y, 0.0);
                break;
            }
        }
        assert!(landed, "proxy should reach the floor");
    }

    #[test]
    fn test_player_damping_on_floor() {
        let damping = PlayerDamping::default();
        let dt = 0.01;
        let vel = damp_player_velocity(Vec3::new(10.0, 0.0, 0.0), true, 30.0, &damping, dt);

        assert_relative_eq!(vel.x, 10.0 * (-4.0 * dt).exp(), epsilon = 1e-12);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn test_player_airborne_gravity_and_light_damping() {
        let damping = PlayerDamping::default();
        let dt = 0.01;
        let vel = damp_player_velocity(Vec3::new(10.0, 0.0, 0.0), false, 30.0, &damping, dt);

        let factor = 1.0 + ((-4.0 * dt).exp() - 1.0) * 0.1;
        assert_relative_eq!(vel.x, 10.0 * factor, epsilon = 1e-12);
        assert_relative_eq!(vel.y, -0.3 * factor, epsilon = 1e-12);
        assert!(vel.x > 10.0 * (-4.0 * dt).exp());
    }
}
