//! Octree over static level triangles.
//!
//! Built once when a level finishes loading. A capsule query gathers the
//! triangles stored in every leaf whose box overlaps the capsule's bounds and
//! resolves them one after another against a working copy of the capsule,
//! so later triangles see the corrections of earlier ones. The returned
//! contact is the total correction.

use tracing::debug;

use super::detection::{triangle_capsule_intersect, Triangle, WorldCollider};
use crate::types::{Aabb, Capsule, Contact, Vec3};

/// Triangles a node holds before it splits.
const TRIANGLES_PER_LEAF: usize = 8;

/// Maximum subdivision depth.
const MAX_DEPTH: usize = 8;

#[derive(Debug, Clone)]
struct OctreeNode {
    bounds: Aabb,
    /// Indices into `Octree::nodes`; empty for leaves
    children: Vec<usize>,
    /// Indices into `Octree::triangles`; only filled on leaves
    triangles: Vec<usize>,
}

/// Static spatial index answering capsule-vs-world queries.
#[derive(Debug, Clone)]
pub struct Octree {
    triangles: Vec<Triangle>,
    nodes: Vec<OctreeNode>,
}

fn triangle_bounds(triangle: &Triangle) -> Aabb {
    let mut bounds = Aabb::empty();
    bounds.include(triangle.a);
    bounds.include(triangle.b);
    bounds.include(triangle.c);
    bounds
}

impl Octree {
    /// Build the tree from a triangle soup.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut bounds = Aabb::empty();
        for triangle in &triangles {
            let tb = triangle_bounds(triangle);
            bounds.include(tb.min);
            bounds.include(tb.max);
        }

        if triangles.is_empty() {
            bounds = Aabb::new(Vec3::ZERO, Vec3::ZERO);
        }

        // Pad so triangles lying exactly on the outer faces stay inside
        let pad = Vec3::new(0.01, 0.01, 0.01);
        bounds = Aabb::new(bounds.min - pad, bounds.max + pad);

        let mut tree = Self {
            triangles,
            nodes: vec![OctreeNode {
                bounds,
                children: Vec::new(),
                triangles: Vec::new(),
            }],
        };

        let all: Vec<usize> = (0..tree.triangles.len()).collect();
        tree.split(0, all, 0);

        debug!(
            triangles = tree.triangle_count(),
            nodes = tree.node_count(),
            "built world octree"
        );
        tree
    }

    fn split(&mut self, node: usize, members: Vec<usize>, depth: usize) {
        if members.len() <= TRIANGLES_PER_LEAF || depth >= MAX_DEPTH {
            self.nodes[node].triangles = members;
            return;
        }

        let bounds = self.nodes[node].bounds;
        let half = bounds.size() * 0.5;

        let mut children = Vec::with_capacity(8);
        for octant in 0..8 {
            let offset = Vec3::new(
                if octant & 1 == 0 { 0.0 } else { half.x },
                if octant & 2 == 0 { 0.0 } else { half.y },
                if octant & 4 == 0 { 0.0 } else { half.z },
            );
            let min = bounds.min + offset;
            let child_bounds = Aabb::new(min, min + half);

            let child_members: Vec<usize> = members
                .iter()
                .copied()
                .filter(|&i| triangle_bounds(&self.triangles[i]).overlaps(&child_bounds))
                .collect();

            if child_members.is_empty() {
                continue;
            }

            let child = self.nodes.len();
            self.nodes.push(OctreeNode {
                bounds: child_bounds,
                children: Vec::new(),
                triangles: Vec::new(),
            });
            children.push((child, child_members));
        }

        // A split that does not separate anything would recurse forever
        if children.iter().all(|(_, m)| m.len() == members.len()) {
            self.nodes.truncate(self.nodes.len() - children.len());
            self.nodes[node].triangles = members;
            return;
        }

        self.nodes[node].children = children.iter().map(|(c, _)| *c).collect();
        for (child, child_members) in children {
            self.split(child, child_members, depth + 1);
        }
    }

    /// Indices of triangles stored in leaves overlapping `query`.
    fn candidates(&self, query: &Aabb) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds.overlaps(query) {
                continue;
            }
            if node.children.is_empty() {
                found.extend_from_slice(&node.triangles);
            } else {
                stack.extend_from_slice(&node.children);
            }
        }

        found.sort_unstable();
        found.dedup();
        found
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl WorldCollider for Octree {
    fn capsule_intersect(&self, capsule: &Capsule) -> Option<Contact> {
        let mut working = *capsule;
        let mut last_normal = None;

        for index in self.candidates(&capsule.bounds()) {
            if let Some(contact) = triangle_capsule_intersect(&working, &self.triangles[index]) {
                last_normal = Some(contact.normal);
                working.translate(contact.normal * contact.depth);
            }
        }

        let last_normal = last_normal?;
        let correction = working.center() - capsule.center();
        Some(Contact {
            // Resting contacts carry no correction but still need a normal
            normal: correction.normalized_or(last_normal),
            depth: correction.magnitude(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two triangles forming a square floor at y = 0.
    fn floor_quad(half: f64) -> Vec<Triangle> {
        let a = Vec3::new(-half, 0.0, half);
        let b = Vec3::new(half, 0.0, half);
        let c = Vec3::new(half, 0.0, -half);
        let d = Vec3::new(-half, 0.0, -half);
        vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }

    /// A grid of small floor tiles so the tree has to subdivide.
    fn tiled_floor(tiles: i32) -> Vec<Triangle> {
        let mut triangles = Vec::new();
        for i in -tiles..tiles {
            for j in -tiles..tiles {
                let (x, z) = (i as f64, j as f64);
                let a = Vec3::new(x, 0.0, z + 1.0);
                let b = Vec3::new(x + 1.0, 0.0, z + 1.0);
                let c = Vec3::new(x + 1.0, 0.0, z);
                let d = Vec3::new(x, 0.0, z);
                triangles.push(Triangle::new(a, b, c));
                triangles.push(Triangle::new(a, c, d));
            }
        }
        triangles
    }

    #[test]
    fn test_capsule_sunk_into_floor_is_pushed_up() {
        let tree = Octree::from_triangles(floor_quad(10.0));
        let capsule = Capsule::new(Vec3::new(0.3, 0.15, 0.2), Vec3::new(0.3, 0.8, 0.2), 0.35);

        let contact = tree.capsule_intersect(&capsule).expect("contact");

        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(contact.depth, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_capsule_in_air_has_no_contact() {
        let tree = Octree::from_triangles(floor_quad(10.0));
        let capsule = Capsule::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 2.65, 0.0), 0.35);

        assert!(tree.capsule_intersect(&capsule).is_none());
    }

    #[test]
    fn test_resting_capsule_reports_floor_normal() {
        let tree = Octree::from_triangles(floor_quad(10.0));
        let capsule = Capsule::new(Vec3::new(1.0, 0.35, 3.0), Vec3::new(1.0, 1.0, 3.0), 0.35);

        let contact = tree.capsule_intersect(&capsule).expect("resting contact");

        assert_eq!(contact.normal, Vec3::UP);
        assert_relative_eq!(contact.depth, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tree_subdivides_large_meshes() {
        let tree = Octree::from_triangles(tiled_floor(8));

        assert_eq!(tree.triangle_count(), 512);
        assert!(tree.node_count() > 1);
    }

    #[test]
    fn test_subdivided_tree_matches_flat_result() {
        let tree = Octree::from_triangles(tiled_floor(8));
        // Near the incenter of one tile triangle, clear of every edge
        let capsule = Capsule::new(Vec3::new(2.71, 0.25, -3.29), Vec3::new(2.71, 0.9, -3.29), 0.35);

        let contact = tree.capsule_intersect(&capsule).expect("contact");

        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(contact.depth, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_wall_contact_pushes_sideways() {
        // Wall in the plane x = 1 facing -X
        let wall = vec![
            Triangle::new(
                Vec3::new(1.0, 0.0, -5.0),
                Vec3::new(1.0, 0.0, 5.0),
                Vec3::new(1.0, 5.0, 5.0),
            ),
            Triangle::new(
                Vec3::new(1.0, 0.0, -5.0),
                Vec3::new(1.0, 5.0, 5.0),
                Vec3::new(1.0, 5.0, -5.0),
            ),
        ];
        let tree = Octree::from_triangles(wall);
        let capsule = Capsule::new(Vec3::new(0.75, 1.0, 0.0), Vec3::new(0.75, 1.65, 0.0), 0.35);

        let contact = tree.capsule_intersect(&capsule).expect("contact");

        assert_relative_eq!(contact.normal.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(contact.depth, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_tree() {
        let tree = Octree::from_triangles(Vec::new());
        assert!(tree.capsule_intersect(&Capsule::default()).is_none());
    }
}
