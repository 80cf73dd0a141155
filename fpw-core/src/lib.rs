//! # FPW Core
//!
//! Headless physics for first-person walking scenes.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (Vec3, capsule, bounding boxes, constants)
//! - `proxy`: Spherical stand-ins for scene objects
//! - `integrator`: Semi-implicit Euler for proxies, damping for the player
//! - `collision`: Capsule-vs-world colliders and proxy resolution
//! - `player`: First-person capsule controller
//! - `classify`: Object tags and the name-based fallback classifier
//! - `events`: Input/asset event queue and host notices
//! - `minigame`: Instrument minigame and the escape condition
//! - `rhythm`: Note track for the keyboard instrument game
//! - `noise`: Seeded Perlin noise for voxel terrain
//! - `config`: YAML scene configuration loader
//! - `simulation`: Main orchestrator
//!
//! ```ignore
//! use fpw_core::prelude::*;
//!
//! let mut sim = Simulation::new(ConfigLoader::new("scenes").load_scene("store")?)?;
//! sim.push_event(SimEvent::AssetsLoaded(bundle));
//! sim.push_input(InputEvent::KeyDown(Key::Forward));
//!
//! let report = sim.tick(1.0 / 60.0);
//! println!("on floor: {}", report.on_floor);
//! ```
//!
//! The core only emits `tracing` events; installing a subscriber is up to
//! the host.

pub mod classify;
pub mod collision;
pub mod config;
pub mod events;
pub mod integrator;
pub mod minigame;
pub mod noise;
pub mod player;
pub mod proxy;
pub mod rhythm;
pub mod simulation;
pub mod types;

/// The types most hosts need.
pub mod prelude {
    pub use crate::classify::{Instrument, ObjectTag};
    pub use crate::collision::{EmptyWorld, Octree, Triangle, VoxelTerrain, WorldCollider};
    pub use crate::config::{ConfigError, ConfigLoader, MinigameMode, SimConfig};
    pub use crate::events::{AssetBundle, InputEvent, Key, Notice, Prompt, SceneNode, SimEvent};
    pub use crate::minigame::MinigameState;
    pub use crate::proxy::{Proxy, ProxyId, ProxyKind, ProxyProperties};
    pub use crate::rhythm::{NoteKey, NoteState, RhythmTrack};
    pub use crate::simulation::{FrameReport, Simulation};
    pub use crate::types::{Capsule, Vec3};
}
