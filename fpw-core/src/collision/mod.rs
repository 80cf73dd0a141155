//! Collision detection and resolution.
//!
//! This module handles:
//! - **Detection**: sphere overlaps and capsule-vs-triangle penetration
//! - **World colliders**: the static [`Octree`] over level triangles and the
//!   [`VoxelTerrain`] heightfield, both behind [`WorldCollider`]
//! - **Resolution**: positional correction between proxies and the player
//!
//! ## Capsule vs world
//!
//! ```text
//!      ( )  end (camera)
//!      | |
//!      | |
//!      ( )  start
//! ═════╳═════ world triangle
//!      ↑ normal * depth pushes the capsule back out
//! ```
//!
//! The world is queried once per substep; there is no sweep, so the
//! substeps have to stay short for fast movement not to tunnel.

pub mod detection;
pub mod octree;
pub mod resolution;
pub mod voxel;

pub use detection::*;
pub use octree::Octree;
pub use resolution::*;
pub use voxel::{TerrainError, VoxelTerrain};
