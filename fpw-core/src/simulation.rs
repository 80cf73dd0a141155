//! The simulation context: world, player, proxies and game state.
//!
//! ## Frame tick
//!
//! ```text
//! tick(frame_delta)
//!   ├─ drain events (assets, input)          once per frame
//!   ├─ restart / cancel / interact requests, note keys
//!   ├─ dt = min(frame_delta, max) / steps
//!   ├─ repeat `steps` times:
//!   │    ├─ player controls, damping, world collision
//!   │    ├─ out-of-bounds respawn
//!   │    └─ each movable proxy: integrate, obstacles, pairs, player
//!   ├─ minigame clock, completion / door
//!   └─ nearest instrument scan → FrameReport
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::classify::{classify_name, Instrument, ObjectTag};
use crate::collision::{EmptyWorld, Octree, ProxyResolver, WorldCollider};
use crate::config::{ConfigError, SimConfig};
use crate::events::{
    AssetBundle, ButtonLatch, EventQueue, InputEvent, Key, Notice, Prompt, SceneNode, SimEvent,
};
use crate::integrator::{Gravity, PlayerDamping, SemiImplicitEuler};
use crate::minigame::Minigame;
use crate::player::{MoveInput, Player};
use crate::proxy::{Proxy, ProxyId, ProxyKind};
use crate::rhythm::NoteKey;
use crate::types::Vec3;

/// Outcome of one frame tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub on_floor: bool,
    /// Closest playable instrument within reach of the eye
    pub nearest_interactive: Option<ProxyId>,
    pub prompt: Option<Prompt>,
    pub notices: Vec<Notice>,
}

pub struct Simulation {
    config: SimConfig,
    world: Box<dyn WorldCollider>,
    player: Player,
    input: MoveInput,
    proxies: Vec<Proxy>,
    queue: EventQueue,
    interact_key: ButtonLatch,
    interact_button: ButtonLatch,
    interact_requested: bool,
    restart_requested: bool,
    cancel_requested: bool,
    note_keys: [ButtonLatch; 4],
    /// Note key presses since the last tick, in arrival order
    note_presses: Vec<NoteKey>,
    minigame: Minigame,
    rng: ChaCha8Rng,
    /// Nodes of the last loaded level, replayed on restart
    level: Vec<SceneNode>,
    door_present: bool,
    nearest: Option<ProxyId>,
}

impl Simulation {
    /// Validate `config` and build an empty simulation around it.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: SimConfig) -> Self {
        Self {
            world: Box::new(EmptyWorld),
            player: Player::new(config.player.spawn),
            input: MoveInput::default(),
            proxies: Vec::new(),
            queue: EventQueue::new(),
            interact_key: ButtonLatch::default(),
            interact_button: ButtonLatch::default(),
            interact_requested: false,
            restart_requested: false,
            cancel_requested: false,
            note_keys: [ButtonLatch::default(); 4],
            note_presses: Vec::new(),
            minigame: Minigame::new(config.minigame.clone()),
            rng: ChaCha8Rng::seed_from_u64(config.spawn.seed),
            level: Vec::new(),
            door_present: false,
            nearest: None,
            config,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    pub fn proxy(&self, id: ProxyId) -> Option<&Proxy> {
        self.proxies.get(id)
    }

    pub fn minigame(&self) -> &Minigame {
        &self.minigame
    }

    pub fn nearest_interactive(&self) -> Option<ProxyId> {
        self.nearest
    }

    pub fn door_present(&self) -> bool {
        self.door_present
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Replace the static world the player collides with.
    pub fn set_world(&mut self, world: Box<dyn WorldCollider>) {
        self.world = world;
    }

    /// Queue an event for the next tick.
    pub fn push_event(&mut self, event: SimEvent) {
        self.queue.push(event);
    }

    pub fn push_input(&mut self, input: InputEvent) {
        self.queue.push_input(input);
    }

    /// Add a proxy directly, outside of any level load.
    pub fn add_proxy(&mut self, proxy: Proxy) -> ProxyId {
        self.proxies.push(proxy);
        self.proxies.len() - 1
    }

    /// Build the world and proxies from a loaded level.
    ///
    /// Level triangles replace the current world with an octree; a bundle
    /// without triangles keeps whatever world was set before.
    pub fn load_assets(&mut self, bundle: AssetBundle) -> Notice {
        let triangles = bundle.triangles.len();
        if triangles > 0 {
            self.world = Box::new(Octree::from_triangles(bundle.triangles));
        }

        self.level = bundle.nodes;
        self.populate();

        info!(
            proxies = self.proxies.len(),
            triangles,
            door = self.door_present,
            "level loaded"
        );
        Notice::LevelLoaded {
            proxies: self.proxies.len(),
            triangles,
        }
    }

    /// Recreate proxies from the level nodes and scatter random props.
    fn populate(&mut self) {
        self.proxies.clear();
        self.door_present = false;
        self.rng = ChaCha8Rng::seed_from_u64(self.config.spawn.seed);

        let presets = &self.config.presets;
        for node in &self.level {
            let tag = node.tag.unwrap_or_else(|| classify_name(&node.name));
            if tag == ObjectTag::Door {
                self.door_present = true;
                debug!(name = %node.name, "door registered");
            }
            if !tag.has_proxy() {
                debug!(name = %node.name, ?tag, "no physics proxy");
                continue;
            }

            // Instruments are furniture that can be played
            let (kind, props) = match tag {
                ObjectTag::Floor => (ProxyKind::Floor, presets.floor),
                ObjectTag::Wall => (ProxyKind::Wall, presets.wall),
                _ => (ProxyKind::Prop, presets.furniture),
            };
            let mut proxy = Proxy::new(&node.name, kind, node.position, props);
            if let ObjectTag::Instrument(instrument) = tag {
                proxy = proxy.with_instrument(instrument);
            }
            self.proxies.push(proxy);
        }

        self.spawn_props();

        let instruments = self.proxies.iter().filter(|p| p.instrument.is_some()).count();
        self.minigame.reset(instruments);
        self.nearest = None;
    }

    fn spawn_props(&mut self) {
        let spawn = &self.config.spawn;
        let extent = spawn.max - spawn.min;

        for n in 0..spawn.count {
            let pos = Vec3::new(
                spawn.min.x + extent.x * self.rng.random::<f64>(),
                spawn.min.y + extent.y * self.rng.random::<f64>(),
                spawn.min.z + extent.z * self.rng.random::<f64>(),
            );
            let proxy = if self.rng.random::<f64>() < spawn.cube_chance {
                Proxy::new(format!("cube_{n}"), ProxyKind::Prop, pos, self.config.presets.cube)
            } else {
                Proxy::new(format!("sphere_{n}"), ProxyKind::Prop, pos, self.config.presets.sphere)
            };
            self.proxies.push(proxy);
        }
    }

    /// Return to the state right after the level loaded.
    pub fn reset(&mut self) {
        self.player.reset();
        self.input = MoveInput::default();
        self.interact_key.reset();
        self.interact_button.reset();
        self.interact_requested = false;
        self.restart_requested = false;
        self.cancel_requested = false;
        self.note_keys.iter_mut().for_each(ButtonLatch::reset);
        self.note_presses.clear();
        self.populate();
        info!("simulation reset");
    }

    // =========================================================================
    // Frame tick
    // =========================================================================

    /// Advance the simulation by one rendered frame.
    pub fn tick(&mut self, frame_delta: f64) -> FrameReport {
        let mut notices = Vec::new();

        let events: Vec<SimEvent> = self.queue.drain().collect();
        for event in events {
            match event {
                SimEvent::AssetsLoaded(bundle) => notices.push(self.load_assets(bundle)),
                SimEvent::Input(input) => self.handle_input(input),
            }
        }

        if std::mem::take(&mut self.restart_requested) && self.minigame.has_escaped() {
            self.reset();
            notices.push(Notice::Restarted);
        }

        if std::mem::take(&mut self.cancel_requested) {
            notices.extend(self.minigame.cancel());
        }

        if std::mem::take(&mut self.interact_requested) {
            self.nearest = self.find_nearest_interactive();
            let target = self.nearest.and_then(|id| self.instrument_of(id).map(|i| (id, i)));
            notices.extend(self.minigame.interact(target, &mut self.rng));
        }

        for key in std::mem::take(&mut self.note_presses) {
            notices.extend(self.minigame.press_note(key));
        }

        let dt = self.config.substep_dt(frame_delta);
        for _ in 0..self.config.steps_per_frame {
            if self.substep(dt) {
                notices.push(Notice::Respawned);
            }
        }

        let elapsed = self.config.frame_dt(frame_delta);
        if let Some(id) = self.minigame.update(elapsed, self.door_present, &mut notices) {
            if let Some(proxy) = self.proxies.get_mut(id) {
                proxy.interactive = false;
            }
        }

        self.nearest = self.find_nearest_interactive();
        let nearest_instrument = self.nearest.and_then(|id| self.instrument_of(id));

        FrameReport {
            on_floor: self.player.on_floor,
            nearest_interactive: self.nearest,
            prompt: self.minigame.prompt(nearest_instrument),
            notices,
        }
    }

    /// One fixed substep. Returns `true` if the player was respawned.
    fn substep(&mut self, dt: f64) -> bool {
        let gravity = self.config.gravity;
        let player_config = &self.config.player;
        let damping = PlayerDamping {
            rate: player_config.damping_rate,
            air_factor: player_config.air_damping_factor,
        };

        self.player.controls(&self.input, player_config, dt);
        self.player.update(self.world.as_ref(), gravity, &damping, dt);
        let respawned = self.player.respawn_if_out_of_bounds(player_config.out_of_bounds_height);

        let forces = Gravity::new(gravity);
        for index in 0..self.proxies.len() {
            if self.proxies[index].is_immovable() {
                continue;
            }
            SemiImplicitEuler::step(&mut self.proxies[index], &forces, dt);
            ProxyResolver::resolve_obstacles(&mut self.proxies, index);
            ProxyResolver::resolve_pairs(&mut self.proxies, index);
            ProxyResolver::resolve_player(&mut self.proxies, index, &self.player.capsule, self.player.vel);
        }

        respawned
    }

    fn handle_input(&mut self, input: InputEvent) {
        match input {
            InputEvent::KeyDown(key) => self.set_key(key, true),
            InputEvent::KeyUp(key) => self.set_key(key, false),
            InputEvent::MouseMove { dx, dy } => {
                self.player.apply_look(dx, dy, self.config.player.look_sensitivity);
            }
            InputEvent::Thumbstick { x, y } => {
                self.input.stick_x = x;
                self.input.stick_y = y;
            }
            InputEvent::InteractButton { pressed } => {
                if self.interact_button.sample(pressed) {
                    self.interact_requested = true;
                }
            }
        }
    }

    fn set_key(&mut self, key: Key, down: bool) {
        match key {
            Key::Forward => self.input.forward = down,
            Key::Back => self.input.back = down,
            Key::Left => self.input.left = down,
            Key::Right => self.input.right = down,
            Key::Jump => self.input.jump = down,
            // Auto-repeated key downs count as one press
            Key::Interact => {
                if self.interact_key.sample(down) {
                    self.interact_requested = true;
                }
            }
            Key::Restart => {
                if down {
                    self.restart_requested = true;
                }
            }
            Key::Note(note) => {
                if self.note_keys[note.index()].sample(down) {
                    self.note_presses.push(note);
                }
            }
            Key::Cancel => {
                if down {
                    self.cancel_requested = true;
                }
            }
        }
    }

    fn instrument_of(&self, id: ProxyId) -> Option<Instrument> {
        self.proxies.get(id).and_then(|p| p.instrument)
    }

    /// Closest playable instrument within interact distance of the eye.
    fn find_nearest_interactive(&self) -> Option<ProxyId> {
        let eye = self.player.eye();
        let reach = self.config.player.interact_distance;

        self.proxies
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_playable())
            .map(|(id, p)| (id, p.pos.distance(&eye)))
            .filter(|&(_, d)| d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_config(SimConfig::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
