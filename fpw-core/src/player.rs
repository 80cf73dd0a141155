//! First-person capsule controller.
//!
//! Per substep the player:
//! 1. accelerates from held keys and the thumbstick along the view's
//!    horizontal forward/side vectors,
//! 2. damps and integrates velocity (gravity only while airborne),
//! 3. moves the capsule and resolves it against the static world.

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use crate::collision::WorldCollider;
use crate::config::PlayerConfig;
use crate::integrator::{damp_player_velocity, PlayerDamping};
use crate::types::{constants, Capsule, Contact, Vec3};

/// View rotation. Zero yaw looks down -Z.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Look {
    pub yaw: f64,
    pub pitch: f64,
}

impl Look {
    /// Horizontal unit vector the view faces.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Horizontal unit vector to the right of the view.
    pub fn side(&self) -> Vec3 {
        self.forward().cross(&Vec3::UP)
    }
}

/// Movement intent accumulated from input events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    /// Thumbstick deflection, each axis in [-1, 1]; `y < 0` is forward
    pub stick_x: f64,
    pub stick_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub capsule: Capsule,
    pub vel: Vec3,
    pub on_floor: bool,
    pub look: Look,
    spawn: Capsule,
}

impl Player {
    pub fn new(spawn: Capsule) -> Self {
        Self {
            capsule: spawn,
            vel: Vec3::ZERO,
            on_floor: false,
            look: Look::default(),
            spawn,
        }
    }

    /// Camera position.
    pub fn eye(&self) -> Vec3 {
        self.capsule.end
    }

    pub fn speed(&self) -> f64 {
        self.vel.magnitude()
    }

    /// Rotate the view from pointer-locked mouse motion.
    pub fn apply_look(&mut self, dx: f64, dy: f64, sensitivity: f64) {
        self.look.yaw -= dx * sensitivity;
        self.look.pitch = (self.look.pitch - dy * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Accelerate from the current movement intent.
    pub fn controls(&mut self, input: &MoveInput, config: &PlayerConfig, dt: f64) {
        let forward = self.look.forward();
        let side = self.look.side();

        // Some air control, but much less than on the ground
        let key_delta = dt * if self.on_floor { config.ground_accel } else { config.air_accel };

        if input.forward {
            self.vel += forward * key_delta;
        }
        if input.back {
            self.vel -= forward * key_delta;
        }
        if input.left {
            self.vel -= side * key_delta;
        }
        if input.right {
            self.vel += side * key_delta;
        }

        let stick_delta = dt
            * if self.on_floor {
                config.stick_ground_accel
            } else {
                config.stick_air_accel
            };

        if input.stick_x.abs() > config.stick_dead_zone {
            self.vel += side * (stick_delta * input.stick_x);
        }
        if input.stick_y.abs() > config.stick_dead_zone {
            self.vel += forward * (-stick_delta * input.stick_y);
        }

        if self.on_floor && input.jump {
            self.vel.y = config.jump_speed;
        }
    }

    /// Damp, integrate and collide for one substep.
    pub fn update(
        &mut self,
        world: &dyn WorldCollider,
        gravity: f64,
        damping: &PlayerDamping,
        dt: f64,
    ) -> Option<Contact> {
        self.vel = damp_player_velocity(self.vel, self.on_floor, gravity, damping, dt);
        self.capsule.translate(self.vel * dt);
        self.collide(world)
    }

    /// Query the world and react to the contact, if any.
    pub fn collide(&mut self, world: &dyn WorldCollider) -> Option<Contact> {
        let contact = world.capsule_intersect(&self.capsule);
        self.apply_contact(contact);
        contact
    }

    /// Update floor state and velocity from a world contact and push the
    /// capsule out of the geometry.
    ///
    /// On walkable ground only the velocity heading into the surface is
    /// removed, so a jump started this substep survives. Against walls and
    /// ceilings the whole normal component goes.
    pub fn apply_contact(&mut self, contact: Option<Contact>) {
        self.on_floor = false;

        let Some(contact) = contact else {
            return;
        };

        let normal = contact.normal;
        let along_normal = normal.dot(&self.vel);
        self.on_floor = normal.y > 0.0;

        if !self.on_floor || along_normal < 0.0 {
            self.vel -= normal * along_normal;
        }

        if contact.depth >= constants::CONTACT_EPSILON {
            self.capsule.translate(normal * contact.depth);
        }
    }

    /// Put the player back at the spawn pose.
    pub fn respawn(&mut self) {
        self.capsule = self.spawn;
        self.look = Look::default();
    }

    /// Respawn when the eye has fallen to `threshold` or below.
    pub fn respawn_if_out_of_bounds(&mut self, threshold: f64) -> bool {
        if self.eye().y > threshold {
            return false;
        }
        debug!(height = self.eye().y, "player fell out of bounds");
        self.respawn();
        true
    }

    /// Restore the freshly spawned state, velocity included.
    pub fn reset(&mut self) {
        *self = Self::new(self.spawn);
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Capsule::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
