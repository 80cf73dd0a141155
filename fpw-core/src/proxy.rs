//! Spherical physics stand-ins for visible scene objects.

use serde::{Deserialize, Serialize};

use crate::classify::Instrument;
use crate::types::{Aabb, Vec3};

/// Index of a proxy inside its simulation; stable for the session.
pub type ProxyId = usize;

/// How a proxy takes part in collision resolution.
///
/// Floors and walls dispense displacement but never receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    Prop,
    Floor,
    Wall,
}

impl ProxyKind {
    pub fn is_immovable(self) -> bool {
        matches!(self, ProxyKind::Floor | ProxyKind::Wall)
    }
}

/// Tunable physical properties of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProxyProperties {
    /// Collision sphere radius (m)
    pub radius: f64,
    pub use_gravity: bool,
    /// Velocity multiplier applied once per substep
    pub friction: f64,
    /// Lowest height the proxy center may reach (m)
    pub min_height: f64,
    /// Horizontal box the proxy center is kept inside; only X and Z are used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Aabb>,
}

impl ProxyProperties {
    pub fn floor() -> Self {
        Self {
            radius: 100.0,
            use_gravity: false,
            friction: 1.0,
            min_height: 0.5,
            bounds: None,
        }
    }

    pub fn wall() -> Self {
        Self {
            radius: 1.0,
            use_gravity: false,
            friction: 1.0,
            min_height: 0.5,
            bounds: None,
        }
    }

    pub fn furniture() -> Self {
        Self {
            radius: 0.8,
            ..Self::default()
        }
    }

    pub fn cube() -> Self {
        Self {
            radius: 0.35,
            use_gravity: true,
            ..Self::default()
        }
    }

    pub fn sphere() -> Self {
        Self {
            radius: 0.25,
            use_gravity: true,
            ..Self::default()
        }
    }
}

impl Default for ProxyProperties {
    fn default() -> Self {
        Self {
            radius: 0.5,
            use_gravity: false,
            friction: 0.9,
            min_height: 0.5,
            bounds: None,
        }
    }
}

/// A moving (or immovable) collision sphere tracked by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    pub name: String,
    pub kind: ProxyKind,
    pub pos: Vec3,
    pub vel: Vec3,
    pub props: ProxyProperties,
    /// Cleared once an instrument's minigame has been completed.
    pub interactive: bool,
    pub instrument: Option<Instrument>,
}

impl Proxy {
    pub fn new(name: impl Into<String>, kind: ProxyKind, pos: Vec3, props: ProxyProperties) -> Self {
        Self {
            name: name.into(),
            kind,
            pos,
            vel: Vec3::ZERO,
            props,
            interactive: true,
            instrument: None,
        }
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = Some(instrument);
        self
    }

    pub fn radius(&self) -> f64 {
        self.props.radius
    }

    pub fn is_immovable(&self) -> bool {
        self.kind.is_immovable()
    }

    /// Add `direction * strength` to the velocity.
    pub fn push(&mut self, direction: Vec3, strength: f64) {
        self.vel += direction * strength;
    }

    /// Raise the proxy to its minimum height, zeroing vertical velocity if it
    /// had sunk below. Returns how far it was raised.
    pub fn raise_to_min_height(&mut self) -> f64 {
        let lift = self.props.min_height - self.pos.y;
        if lift > 0.0 {
            self.pos.y = self.props.min_height;
            self.vel.y = 0.0;
            lift
        } else {
            0.0
        }
    }

    /// Like [`Proxy::raise_to_min_height`], reporting only whether the clamp fired.
    pub fn clamp_to_min_height(&mut self) -> bool {
        self.raise_to_min_height() > 0.0
    }

    /// Keep the center inside the horizontal bounds, if any.
    pub fn clamp_to_bounds(&mut self) {
        if let Some(bounds) = self.props.bounds {
            self.pos = bounds.clamp_horizontal(self.pos);
        }
    }

    /// Whether the player can currently start this proxy's minigame.
    pub fn is_playable(&self) -> bool {
        self.interactive && self.instrument.is_some()
    }
}
