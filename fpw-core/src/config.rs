//! Scene configuration and its YAML loader.
//!
//! Every tunable the scenes hard-code lives in [`SimConfig`]; the defaults
//! reproduce the store scene. Scene files only need the keys they change.
//!
//! ## Directory Structure
//!
//! ```text
//! scenes/
//! ├── store.yaml
//! ├── store_vr.yaml
//! └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proxy::ProxyProperties;
use crate::types::{constants, Capsule, Vec3};

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("scene not found: {0}")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// First-person controller tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Capsule the player spawns in and is teleported back to
    pub spawn: Capsule,
    /// Ground velocity decay rate (1/s)
    pub damping_rate: f64,
    /// Damping multiplier while airborne
    pub air_damping_factor: f64,
    /// Keyboard acceleration on the ground / in the air (m/s²)
    pub ground_accel: f64,
    pub air_accel: f64,
    /// Thumbstick acceleration on the ground / in the air (m/s²)
    pub stick_ground_accel: f64,
    pub stick_air_accel: f64,
    /// Thumbstick deflection below which input is ignored
    pub stick_dead_zone: f64,
    pub jump_speed: f64,
    /// Radians of look rotation per pixel of mouse motion
    pub look_sensitivity: f64,
    /// Eye height at or below which the player is respawned
    pub out_of_bounds_height: f64,
    /// How close the eye must be to an instrument to interact with it
    pub interact_distance: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn: Capsule::default(),
            damping_rate: 4.0,
            air_damping_factor: 0.1,
            ground_accel: 25.0,
            air_accel: 8.0,
            stick_ground_accel: 10.0,
            stick_air_accel: 4.0,
            stick_dead_zone: 0.1,
            jump_speed: 15.0,
            look_sensitivity: 1.0 / 500.0,
            out_of_bounds_height: -25.0,
            interact_distance: 2.5,
        }
    }
}

/// Physical properties assigned to each kind of scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyPresets {
    pub floor: ProxyProperties,
    pub wall: ProxyProperties,
    pub furniture: ProxyProperties,
    pub cube: ProxyProperties,
    pub sphere: ProxyProperties,
}

impl Default for ProxyPresets {
    fn default() -> Self {
        Self {
            floor: ProxyProperties::floor(),
            wall: ProxyProperties::wall(),
            furniture: ProxyProperties::furniture(),
            cube: ProxyProperties::cube(),
            sphere: ProxyProperties::sphere(),
        }
    }
}

/// Procedural props scattered when a level loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub count: usize,
    /// Spawn volume corners
    pub min: Vec3,
    pub max: Vec3,
    /// Probability that a spawned prop is a cube rather than a sphere
    pub cube_chance: f64,
    pub seed: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            count: 30,
            min: Vec3::new(-10.0, 2.0, 0.0),
            max: Vec3::new(10.0, 5.0, 10.0),
            cube_chance: 0.5,
            seed: 0,
        }
    }
}

/// Which instrument game a scene plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigameMode {
    /// Press interact `goal` times
    #[default]
    Presses,
    /// Hit a scrolling sequence of note keys
    Rhythm,
}

/// Note track of the rhythm game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    pub notes: usize,
    /// Hits needed to finish the instrument
    pub pass_score: u32,
    /// Seconds until the first note reaches the hit zone
    pub lead_in: f64,
    /// Seconds between consecutive notes
    pub note_interval: f64,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            notes: 20,
            pass_score: 11,
            lead_in: 2.0,
            note_interval: 0.55,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinigameConfig {
    pub mode: MinigameMode,
    /// Interact presses needed to finish an instrument
    pub goal: u32,
    pub rhythm: RhythmConfig,
}

impl Default for MinigameConfig {
    fn default() -> Self {
        Self {
            mode: MinigameMode::default(),
            goal: 5,
            rhythm: RhythmConfig::default(),
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    /// Gravity magnitude (m/s²)
    pub gravity: f64,
    pub steps_per_frame: u32,
    /// Frame deltas above this are truncated (s)
    pub max_frame_delta: f64,
    pub player: PlayerConfig,
    pub presets: ProxyPresets,
    pub spawn: SpawnConfig,
    pub minigame: MinigameConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            gravity: constants::GRAVITY,
            steps_per_frame: constants::STEPS_PER_FRAME,
            max_frame_delta: constants::MAX_FRAME_DELTA,
            player: PlayerConfig::default(),
            presets: ProxyPresets::default(),
            spawn: SpawnConfig::default(),
            minigame: MinigameConfig::default(),
        }
    }
}

fn check(ok: bool, reason: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid(reason()))
    }
}

fn check_preset(label: &str, props: &ProxyProperties) -> Result<(), ConfigError> {
    check(props.radius > 0.0 && props.radius.is_finite(), || {
        format!("{label} radius must be positive, got {}", props.radius)
    })?;
    check((0.0..=1.0).contains(&props.friction), || {
        format!("{label} friction must be within [0, 1], got {}", props.friction)
    })?;
    check(props.min_height.is_finite(), || format!("{label} min_height must be finite"))?;
    match props.bounds {
        Some(b) => check(b.min.x <= b.max.x && b.min.z <= b.max.z, || {
            format!("{label} bounds min corner must not exceed max corner")
        }),
        None => Ok(()),
    }
}

impl SimConfig {
    /// Parse a configuration from YAML text and validate it.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values the substep loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(self.gravity.is_finite() && self.gravity >= 0.0, || {
            format!("gravity must be a non-negative number, got {}", self.gravity)
        })?;
        check(self.steps_per_frame > 0, || "steps_per_frame must be at least 1".to_string())?;
        check(self.max_frame_delta > 0.0, || {
            format!("max_frame_delta must be positive, got {}", self.max_frame_delta)
        })?;

        let player = &self.player;
        check(player.spawn.radius > 0.0, || {
            format!("player capsule radius must be positive, got {}", player.spawn.radius)
        })?;
        check(player.damping_rate >= 0.0, || "player damping_rate must be non-negative".to_string())?;
        check(player.stick_dead_zone >= 0.0 && player.stick_dead_zone < 1.0, || {
            format!("stick_dead_zone must be within [0, 1), got {}", player.stick_dead_zone)
        })?;
        check(player.interact_distance >= 0.0, || "interact_distance must be non-negative".to_string())?;

        check_preset("floor", &self.presets.floor)?;
        check_preset("wall", &self.presets.wall)?;
        check_preset("furniture", &self.presets.furniture)?;
        check_preset("cube", &self.presets.cube)?;
        check_preset("sphere", &self.presets.sphere)?;

        let spawn = &self.spawn;
        check(
            spawn.min.x <= spawn.max.x && spawn.min.y <= spawn.max.y && spawn.min.z <= spawn.max.z,
            || "spawn min corner must not exceed max corner".to_string(),
        )?;
        check((0.0..=1.0).contains(&spawn.cube_chance), || {
            format!("cube_chance must be within [0, 1], got {}", spawn.cube_chance)
        })?;

        check(self.minigame.goal > 0, || "minigame goal must be at least 1".to_string())?;
        let rhythm = &self.minigame.rhythm;
        check(rhythm.notes > 0, || "rhythm track needs at least one note".to_string())?;
        check(rhythm.pass_score as usize <= rhythm.notes, || {
            format!("pass_score {} exceeds the {} notes", rhythm.pass_score, rhythm.notes)
        })?;
        check(rhythm.lead_in >= 0.0 && rhythm.note_interval > 0.0, || {
            "rhythm lead_in must be non-negative and note_interval positive".to_string()
        })
    }

    /// Frame delta the simulation actually advances by: truncated to
    /// `[0, max_frame_delta]`, and 0 for NaN or infinite input.
    pub fn frame_dt(&self, frame_delta: f64) -> f64 {
        if frame_delta.is_finite() {
            frame_delta.clamp(0.0, self.max_frame_delta)
        } else {
            0.0
        }
    }

    /// Duration of one substep for a frame that took `frame_delta` seconds.
    pub fn substep_dt(&self, frame_delta: f64) -> f64 {
        self.frame_dt(frame_delta) / self.steps_per_frame as f64
    }
}

/// Scene configuration loader with configurable base directory.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a new loader reading `<name>.yaml` files from `base_path`.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load and validate a scene by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = ConfigLoader::new("scenes");
    /// let store = loader.load_scene("store")?;
    /// ```
    pub fn load_scene(&self, name: &str) -> Result<SimConfig, ConfigError> {
        let path = self.base_path.join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        SimConfig::from_yaml(&contents)
    }

    /// List all available scenes.
    pub fn list_scenes(&self) -> Result<Vec<String>, ConfigError> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".yaml") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================
