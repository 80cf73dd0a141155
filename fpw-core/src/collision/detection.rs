//! Overlap tests and the static-world query seam.
//!
//! Proxies are spheres, so proxy-vs-proxy and proxy-vs-player tests are plain
//! center distance checks. The player capsule is tested against a static
//! triangle first through the triangle's plane, then against its three edges.

use crate::types::{constants, Capsule, Contact, Vec3};

/// Static level geometry that can be queried for capsule penetration.
///
/// Implementations are built once at level load and never change after.
pub trait WorldCollider: Send + Sync {
    /// Contact that pushes `capsule` out of the world, if it penetrates.
    fn capsule_intersect(&self, capsule: &Capsule) -> Option<Contact>;
}

/// A world with no geometry; used before any level has loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyWorld;

impl WorldCollider for EmptyWorld {
    fn capsule_intersect(&self, _capsule: &Capsule) -> Option<Contact> {
        None
    }
}

/// Overlap between two spheres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereOverlap {
    /// Unit vector from the second sphere's center toward the first one
    pub direction: Vec3,
    /// How far the spheres interpenetrate (positive)
    pub penetration: f64,
}

/// Test two spheres for overlap.
///
/// Coincident centers separate along +Y so the pair never stays stuck.
pub fn sphere_overlap(a: Vec3, radius_a: f64, b: Vec3, radius_b: f64) -> Option<SphereOverlap> {
    let offset = a - b;
    let dist = offset.magnitude();
    let min_dist = radius_a + radius_b;

    if dist >= min_dist {
        return None;
    }

    Some(SphereOverlap {
        direction: offset.normalized_or(Vec3::UP),
        penetration: min_dist - dist,
    })
}

// =============================================================================
// Triangles
// =============================================================================

/// A static world triangle, counter-clockwise when seen from its front face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unit front-face normal; zero for degenerate triangles.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(&(self.c - self.a)).normalized()
    }

    /// Whether `p`, assumed to lie in the triangle's plane, is inside it.
    pub fn contains_point(&self, p: Vec3) -> bool {
        let v0 = self.c - self.a;
        let v1 = self.b - self.a;
        let v2 = p - self.a;

        let dot00 = v0.dot(&v0);
        let dot01 = v0.dot(&v1);
        let dot02 = v0.dot(&v2);
        let dot11 = v1.dot(&v1);
        let dot12 = v1.dot(&v2);

        let denom = dot00 * dot11 - dot01 * dot01;
        if denom.abs() < constants::EPSILON {
            return false;
        }

        let u = (dot11 * dot02 - dot01 * dot12) / denom;
        let v = (dot00 * dot12 - dot01 * dot02) / denom;
        u >= 0.0 && v >= 0.0 && u + v <= 1.0
    }

    pub fn edges(&self) -> [(Vec3, Vec3); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }
}

/// Closest points between segments `p1-q1` and `p2-q2`.
pub fn closest_points_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);

    let (s, t) = if a <= constants::EPSILON && e <= constants::EPSILON {
        (0.0, 0.0)
    } else if a <= constants::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= constants::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > constants::EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

/// Penetration of a capsule into a single triangle.
pub fn triangle_capsule_intersect(capsule: &Capsule, triangle: &Triangle) -> Option<Contact> {
    let normal = triangle.normal();
    if normal == Vec3::ZERO {
        return None;
    }

    let plane_offset = normal.dot(&triangle.a);
    let d1 = normal.dot(&capsule.start) - plane_offset - capsule.radius;
    let d2 = normal.dot(&capsule.end) - plane_offset - capsule.radius;

    if (d1 > 0.0 && d2 > 0.0) || (d1 < -capsule.radius && d2 < -capsule.radius) {
        return None;
    }

    let total = d1.abs() + d2.abs();
    let delta = if total > constants::EPSILON {
        (d1 / total).abs()
    } else {
        0.0
    };
    let along_segment = capsule.start.lerp(&capsule.end, delta);
    let on_plane = along_segment - normal * (normal.dot(&along_segment) - plane_offset);

    if triangle.contains_point(on_plane) {
        return Some(Contact {
            normal,
            depth: d1.min(d2).abs(),
        });
    }

    let radius_sq = capsule.radius * capsule.radius;
    for (edge_start, edge_end) in triangle.edges() {
        let (on_capsule, on_edge) =
            closest_points_between_segments(capsule.start, capsule.end, edge_start, edge_end);
        let dist_sq = on_capsule.distance_squared(&on_edge);
        if dist_sq < radius_sq {
            return Some(Contact {
                normal: (on_capsule - on_edge).normalized_or(normal),
                depth: capsule.radius - dist_sq.sqrt(),
            });
        }
    }

    None
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(-10.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, -10.0),
        )
    }

    #[test]
    fn test_sphere_overlap_separated() {
        assert!(sphere_overlap(Vec3::ZERO, 0.5, Vec3::new(2.0, 0.0, 0.0), 0.5).is_none());
    }

    #[test]
    fn test_sphere_overlap_direction_and_depth() {
        let overlap = sphere_overlap(Vec3::new(0.4, 0.0, 0.0), 0.35, Vec3::ZERO, 0.35)
            .expect("spheres overlap");

        assert_relative_eq!(overlap.penetration, 0.3, epsilon = 1e-12);
        assert_relative_eq!(overlap.direction.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_overlap_coincident_centers() {
        let overlap = sphere_overlap(Vec3::ZERO, 0.25, Vec3::ZERO, 0.25).expect("overlap");
        assert_eq!(overlap.direction, Vec3::UP);
        assert_relative_eq!(overlap.penetration, 0.5);
    }

    #[test]
    fn test_triangle_normal_faces_up() {
        let n = floor_triangle().normal();
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_capsule_resting_into_floor() {
        let capsule = Capsule::new(Vec3::new(0.0, 0.25, 0.0), Vec3::new(0.0, 0.9, 0.0), 0.35);

        let contact = triangle_capsule_intersect(&capsule, &floor_triangle()).expect("contact");

        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(contact.depth, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_capsule_above_floor_has_no_contact() {
        let capsule = Capsule::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 1.15, 0.0), 0.35);
        assert!(triangle_capsule_intersect(&capsule, &floor_triangle()).is_none());
    }

    #[test]
    fn test_capsule_touching_edge() {
        // Small triangle whose +X edge is brushed by a vertical capsule
        let triangle = Triangle::new(
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, -1.0),
        );
        let capsule = Capsule::new(Vec3::new(1.2, -0.5, 0.0), Vec3::new(1.2, 0.5, 0.0), 0.35);

        let contact = triangle_capsule_intersect(&capsule, &triangle).expect("edge contact");

        assert_relative_eq!(contact.normal.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(contact.depth, 0.15, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_triangle_is_ignored() {
        let line = Triangle::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let capsule = Capsule::default();
        assert!(triangle_capsule_intersect(&capsule, &line).is_none());
    }

    #[test]
    fn test_closest_points_crossing_segments() {
        let (p, q) = closest_points_between_segments(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, -1.0),
            Vec3::new(0.0, 1.0, 1.0),
        );
        assert_relative_eq!(p.distance(&Vec3::ZERO), 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.distance(&Vec3::new(0.0, 1.0, 0.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_world_never_hits() {
        assert!(EmptyWorld.capsule_intersect(&Capsule::default()).is_none());
    }
}
