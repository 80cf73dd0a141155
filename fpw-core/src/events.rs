//! Inbound events and outbound notices.
//!
//! Hosts push [`SimEvent`]s whenever data arrives (an asset finished
//! loading, a key went down, a controller was sampled). The simulation
//! drains the queue once at the start of each frame, so the timing of
//! arrival never interleaves with a physics substep.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::classify::{Instrument, ObjectTag};
use crate::collision::Triangle;
use crate::proxy::ProxyId;
use crate::rhythm::NoteKey;
use crate::types::Vec3;

/// Logical keys the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Interact,
    Restart,
    /// A rhythm game key
    Note(NoteKey),
    /// Leave the running minigame
    Cancel,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` to a key.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" => Some(Key::Forward),
            "KeyS" => Some(Key::Back),
            "KeyA" => Some(Key::Left),
            "KeyD" => Some(Key::Right),
            "Space" => Some(Key::Jump),
            "KeyE" => Some(Key::Interact),
            "KeyR" => Some(Key::Restart),
            "KeyP" => Some(Key::Note(NoteKey::P)),
            "KeyO" => Some(Key::Note(NoteKey::O)),
            "KeyI" => Some(Key::Note(NoteKey::I)),
            "KeyU" => Some(Key::Note(NoteKey::U)),
            "Escape" => Some(Key::Cancel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Pointer-locked mouse motion in pixels
    MouseMove { dx: f64, dy: f64 },
    /// Left thumbstick deflection; `y` is negative when pushed forward
    Thumbstick { x: f64, y: f64 },
    /// Sampled level of the controller's interact button
    InteractButton { pressed: bool },
}

/// A named object delivered by the asset loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub position: Vec3,
    /// Authored tag; untagged nodes are classified by name
    #[serde(default)]
    pub tag: Option<ObjectTag>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            tag: None,
        }
    }

    pub fn tagged(name: impl Into<String>, position: Vec3, tag: ObjectTag) -> Self {
        Self {
            name: name.into(),
            position,
            tag: Some(tag),
        }
    }
}

/// Everything a finished level load hands to the simulation.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    pub nodes: Vec<SceneNode>,
    /// Static geometry for the world octree
    pub triangles: Vec<Triangle>,
}

#[derive(Debug, Clone)]
pub enum SimEvent {
    AssetsLoaded(AssetBundle),
    Input(InputEvent),
}

/// FIFO of events waiting for the next frame.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.pending.push_back(event);
    }

    pub fn push_input(&mut self, input: InputEvent) {
        self.push(SimEvent::Input(input));
    }

    /// Take every pending event in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Turns a sampled button level into press edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonLatch {
    held: bool,
}

impl ButtonLatch {
    /// Feed a sample; returns `true` only on the sample where the button
    /// goes from released to pressed.
    pub fn sample(&mut self, pressed: bool) -> bool {
        let edge = pressed && !self.held;
        self.held = pressed;
        edge
    }

    pub fn reset(&mut self) {
        self.held = false;
    }
}

/// Something the host should show or play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    LevelLoaded { proxies: usize, triangles: usize },
    Respawned,
    MinigameStarted { instrument: Instrument, goal: u32 },
    MinigameProgress { instrument: Instrument, count: u32, goal: u32 },
    /// A rhythm note was judged, by a key press or by reaching the zone
    NoteJudged { instrument: Instrument, key: NoteKey, hit: bool, score: u32 },
    /// The rhythm track ended below the pass score
    MinigameFailed { instrument: Instrument, score: u32, needed: u32 },
    MinigameCancelled { instrument: Instrument },
    InstrumentCompleted { instrument: Instrument, proxy: ProxyId },
    DoorOpened,
    Restarted,
}

/// Prompt text the host should display this frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prompt {
    /// An instrument is within reach
    PressToPlay { instrument: Instrument },
    /// A minigame is running
    Progress { instrument: Instrument, count: u32, goal: u32 },
    /// A rhythm track is running; `next` is the key the next note wants
    Rhythm { instrument: Instrument, next: Option<NoteKey>, score: u32, notes: usize },
    Escaped,
}
