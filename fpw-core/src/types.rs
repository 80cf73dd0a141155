//! Core geometric types shared by the player, the proxies and the world colliders.
//!
//! Units follow the scenes the library was written for: meters, seconds, and
//! a Y-up world with the camera looking down -Z at zero yaw.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Vec3 - 3D Vector
// =============================================================================

/// A 3D vector used for positions, velocities and contact normals.
///
/// Coordinate system:
/// - X: horizontal, positive to the right of the spawn view
/// - Y: vertical (positive upward)
/// - Z: horizontal, positive toward the viewer at spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared magnitude (avoids sqrt for comparisons)
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Magnitude (length) of the vector
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Distance between two points
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).magnitude()
    }

    /// Squared distance between two points
    pub fn distance_squared(&self, other: &Self) -> f64 {
        (*self - *other).magnitude_squared()
    }

    /// Unit vector in the same direction; zero stays zero.
    pub fn normalized(&self) -> Self {
        self.normalized_or(Self::ZERO)
    }

    /// Unit vector in the same direction, or `fallback` for a zero vector.
    pub fn normalized_or(&self, fallback: Self) -> Self {
        let mag = self.magnitude();
        if mag < constants::EPSILON {
            fallback
        } else {
            *self / mag
        }
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Linear interpolation between two vectors
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }

    /// Component-wise minimum
    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum
    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

macro_rules! vec3_binop {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait for Vec3 {
            type Output = Vec3;
            fn $method(self, rhs: Vec3) -> Vec3 {
                Vec3::new(self.x $op rhs.x, self.y $op rhs.y, self.z $op rhs.z)
            }
        }

        impl $assign_trait for Vec3 {
            fn $assign_method(&mut self, rhs: Vec3) {
                *self = *self $op rhs;
            }
        }
    };
}

vec3_binop!(Add, add, AddAssign, add_assign, +);
vec3_binop!(Sub, sub, SubAssign, sub_assign, -);

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, k: f64) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;
    fn div(self, k: f64) -> Vec3 {
        Vec3::new(self.x / k, self.y / k, self.z / k)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self * -1.0
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Capsule
// =============================================================================

/// A line segment swept by a sphere; the player's body.
///
/// `start` is the bottom sphere center, `end` the top one. The camera sits
/// at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f64,
}

impl Capsule {
    pub const fn new(start: Vec3, end: Vec3, radius: f64) -> Self {
        Self { start, end, radius }
    }

    /// Move both segment end points by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        self.start += offset;
        self.end += offset;
    }

    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// Axis-aligned bounds of the swept volume.
    pub fn bounds(&self) -> Aabb {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        Aabb {
            min: self.start.min(&self.end) - r,
            max: self.start.max(&self.end) + r,
        }
    }
}

impl Default for Capsule {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.35, 0.0), Vec3::new(0.0, 1.0, 0.0), 0.35)
    }
}

// =============================================================================
// Bounds and contacts
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any `include` call will replace.
    pub const fn empty() -> Self {
        Self {
            min: Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(&p);
        self.max = self.max.max(&p);
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Clamp `p` into the box on X and Z, leaving Y alone.
    pub fn clamp_horizontal(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y,
            p.z.clamp(self.min.z, self.max.z),
        )
    }
}

/// Result of a capsule query against the static world.
///
/// Translating the capsule by `normal * depth` separates it from the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub normal: Vec3,
    pub depth: f64,
}

// =============================================================================
// Physical Constants
// =============================================================================

/// Constants shared across the simulation.
pub mod constants {
    /// Gravitational acceleration used by the scenes (m/s²)
    pub const GRAVITY: f64 = 30.0;

    /// Physics substeps per rendered frame
    pub const STEPS_PER_FRAME: u32 = 5;

    /// Largest frame delta fed into the substep loop (seconds)
    pub const MAX_FRAME_DELTA: f64 = 0.05;

    /// Minimum contact depth that moves the player capsule
    pub const CONTACT_EPSILON: f64 = 1e-10;

    /// Small value for floating-point comparisons
    pub const EPSILON: f64 = 1e-10;
}

// =============================================================================
// Tests
// =============================================================================
