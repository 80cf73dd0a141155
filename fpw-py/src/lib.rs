//! Python bindings for the fpw-core walker physics.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from fpw_physics import Simulation, init_logging
//!
//! init_logging("fpw_core=debug")
//! sim = Simulation("store", "scenes")
//! sim.load_level([("Floor", (0.0, -100.0, 0.0)), ("Guitar", (1.0, 0.8, -1.5))], [])
//!
//! sim.key_down("KeyW")
//! for _ in range(60):
//!     report = sim.tick(1 / 60)
//! print(sim.player_position(), report["prompt"])
//! ```

use std::collections::HashMap;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use fpw_core::classify::ObjectTag;
use fpw_core::collision::{Triangle, VoxelTerrain};
use fpw_core::config::{ConfigError, ConfigLoader, SimConfig};
use fpw_core::events::{AssetBundle, InputEvent, Key, Notice, Prompt, SceneNode, SimEvent};
use fpw_core::rhythm::NoteState;
use fpw_core::simulation::Simulation as CoreSimulation;
use fpw_core::types::Vec3 as CoreVec3;

type Point = (f64, f64, f64);

fn config_err(err: ConfigError) -> PyErr {
    match err {
        ConfigError::Io(_) | ConfigError::NotFound(_) => PyIOError::new_err(err.to_string()),
        ConfigError::Parse(_) | ConfigError::Invalid(_) => PyValueError::new_err(err.to_string()),
    }
}

fn point(p: Point) -> CoreVec3 {
    CoreVec3::new(p.0, p.1, p.2)
}

fn parse_tag(tag: &str) -> PyResult<ObjectTag> {
    tag.parse::<ObjectTag>()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

fn notice_dict<'py>(py: Python<'py>, notice: &Notice) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    match notice {
        Notice::LevelLoaded { proxies, triangles } => {
            dict.set_item("type", "level_loaded")?;
            dict.set_item("proxies", proxies)?;
            dict.set_item("triangles", triangles)?;
        }
        Notice::Respawned => dict.set_item("type", "respawned")?,
        Notice::MinigameStarted { instrument, goal } => {
            dict.set_item("type", "minigame_started")?;
            dict.set_item("instrument", instrument.as_str())?;
            dict.set_item("goal", goal)?;
        }
        Notice::MinigameProgress {
            instrument,
            count,
            goal,
        } => {
            dict.set_item("type", "minigame_progress")?;
            dict.set_item("instrument", instrument.as_str())?;
            dict.set_item("count", count)?;
            dict.set_item("goal", goal)?;
        }
        Notice::NoteJudged {
            instrument,
            key,
            hit,
            score,
        } => {
            dict.set_item("type", "note_judged")?;
            dict.set_item("instrument", instrument.as_str())?;
            dict.set_item("key", key.as_char().to_string())?;
            dict.set_item("hit", hit)?;
            dict.set_item("score", score)?;
        }
        Notice::MinigameFailed {
            instrument,
            score,
            needed,
        } => {
            dict.set_item("type", "minigame_failed")?;
            dict.set_item("instrument", instrument.as_str())?;
            dict.set_item("score", score)?;
            dict.set_item("needed", needed)?;
        }
        Notice::MinigameCancelled { instrument } => {
            dict.set_item("type", "minigame_cancelled")?;
            dict.set_item("instrument", instrument.as_str())?;
        }
        Notice::InstrumentCompleted { instrument, proxy } => {
            dict.set_item("type", "instrument_completed")?;
            dict.set_item("instrument", instrument.as_str())?;
            dict.set_item("proxy", proxy)?;
        }
        Notice::DoorOpened => dict.set_item("type", "door_opened")?,
        Notice::Restarted => dict.set_item("type", "restarted")?,
    }
    Ok(dict)
}

/// Prompt text as the store scene words it.
fn prompt_text(prompt: &Prompt) -> String {
    match prompt {
        Prompt::PressToPlay { instrument } => format!("Press E to play the {instrument}"),
        Prompt::Progress {
            instrument,
            count,
            goal,
        } => format!("{instrument}: {count}/{goal}"),
        Prompt::Rhythm {
            instrument,
            next: Some(key),
            score,
            notes,
        } => format!("{instrument}: press {key} ({score}/{notes})"),
        Prompt::Rhythm {
            instrument,
            next: None,
            score,
            notes,
        } => format!("{instrument}: score {score}/{notes}"),
        Prompt::Escaped => "You escaped! Press R to restart".to_string(),
    }
}

/// 3D vector for positions and velocities.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn to_tuple(&self) -> Point {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// First-person walker simulation.
///
/// Input calls only queue events; they take effect on the next `tick`.
#[pyclass]
pub struct Simulation {
    inner: CoreSimulation,
}

#[pymethods]
impl Simulation {
    /// Create a simulation from a named scene, or with defaults when no
    /// scene is given.
    #[new]
    #[pyo3(signature = (scene=None, scenes_dir="scenes"))]
    fn new(scene: Option<&str>, scenes_dir: &str) -> PyResult<Self> {
        let config = match scene {
            Some(name) => ConfigLoader::new(scenes_dir).load_scene(name).map_err(config_err)?,
            None => SimConfig::default(),
        };
        Ok(Self {
            inner: CoreSimulation::new(config).map_err(config_err)?,
        })
    }

    /// Create a simulation from YAML text.
    #[staticmethod]
    fn from_yaml(text: &str) -> PyResult<Self> {
        let config = SimConfig::from_yaml(text).map_err(config_err)?;
        Ok(Self {
            inner: CoreSimulation::new(config).map_err(config_err)?,
        })
    }

    /// Names of the scene files in `scenes_dir`.
    #[staticmethod]
    #[pyo3(signature = (scenes_dir="scenes"))]
    fn list_scenes(scenes_dir: &str) -> PyResult<Vec<String>> {
        ConfigLoader::new(scenes_dir).list_scenes().map_err(config_err)
    }

    /// Queue a level load.
    ///
    /// `nodes` are `(name, (x, y, z))` pairs, `triangles` are three corner
    /// tuples each, and `tags` optionally maps node names to a tag such as
    /// `"wall"` or `"piano"`.
    #[pyo3(signature = (nodes, triangles, tags=None))]
    fn load_level(
        &mut self,
        nodes: Vec<(String, Point)>,
        triangles: Vec<[Point; 3]>,
        tags: Option<HashMap<String, String>>,
    ) -> PyResult<()> {
        let tags = tags.unwrap_or_default();
        let mut bundle = AssetBundle::default();

        for (name, pos) in nodes {
            let node = match tags.get(&name) {
                Some(tag) => SceneNode::tagged(name.clone(), point(pos), parse_tag(tag)?),
                None => SceneNode::new(name, point(pos)),
            };
            bundle.nodes.push(node);
        }
        bundle.triangles = triangles
            .into_iter()
            .map(|[a, b, c]| Triangle::new(point(a), point(b), point(c)))
            .collect();

        self.inner.push_event(SimEvent::AssetsLoaded(bundle));
        Ok(())
    }

    /// Use a voxel heightfield as the world.
    fn set_voxel_terrain(
        &mut self,
        origin: Point,
        width: usize,
        depth: usize,
        block_size: f64,
        heights: Vec<i32>,
    ) -> PyResult<()> {
        let terrain = VoxelTerrain::new(point(origin), width, depth, block_size, heights)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        self.inner.set_world(Box::new(terrain));
        Ok(())
    }

    /// Use procedurally generated voxel hills as the world.
    #[pyo3(signature = (origin, width=128, depth=128, block_size=1.0, seed=0))]
    fn generate_voxel_terrain(
        &mut self,
        origin: Point,
        width: usize,
        depth: usize,
        block_size: f64,
        seed: u64,
    ) -> PyResult<()> {
        let terrain = VoxelTerrain::generate(point(origin), width, depth, block_size, seed)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        self.inner.set_world(Box::new(terrain));
        Ok(())
    }

    /// Press a key by DOM code (`"KeyW"`, `"Space"`, ...).
    ///
    /// Returns `False` for keys the controller ignores.
    fn key_down(&mut self, code: &str) -> bool {
        self.key(code, true)
    }

    fn key_up(&mut self, code: &str) -> bool {
        self.key(code, false)
    }

    fn mouse_move(&mut self, dx: f64, dy: f64) {
        self.inner.push_input(InputEvent::MouseMove { dx, dy });
    }

    fn thumbstick(&mut self, x: f64, y: f64) {
        self.inner.push_input(InputEvent::Thumbstick { x, y });
    }

    /// Sampled level of the controller's interact button.
    fn interact_button(&mut self, pressed: bool) {
        self.inner.push_input(InputEvent::InteractButton { pressed });
    }

    /// Advance one rendered frame and report what happened.
    fn tick(&mut self, py: Python<'_>, frame_delta: f64) -> PyResult<PyObject> {
        let report = self.inner.tick(frame_delta);

        let notices = PyList::empty(py);
        for notice in &report.notices {
            notices.append(notice_dict(py, notice)?)?;
        }

        let dict = PyDict::new(py);
        dict.set_item("on_floor", report.on_floor)?;
        dict.set_item("nearest_interactive", report.nearest_interactive)?;
        dict.set_item("prompt", report.prompt.as_ref().map(prompt_text))?;
        dict.set_item("notices", notices)?;
        Ok(dict.into_any().unbind())
    }

    /// Return to the state right after the level loaded.
    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Camera position.
    fn player_position(&self) -> Vec3 {
        self.inner.player().eye().into()
    }

    fn player_velocity(&self) -> Vec3 {
        self.inner.player().vel.into()
    }

    /// View rotation as `(yaw, pitch)` in radians.
    fn player_look(&self) -> (f64, f64) {
        let look = self.inner.player().look;
        (look.yaw, look.pitch)
    }

    #[getter]
    fn on_floor(&self) -> bool {
        self.inner.player().on_floor
    }

    #[getter]
    fn escaped(&self) -> bool {
        self.inner.minigame().has_escaped()
    }

    fn proxy_count(&self) -> usize {
        self.inner.proxies().len()
    }

    /// Running rhythm track as `(clock, [(key, due, state), ...])`, or `None`.
    fn rhythm_track(&self) -> Option<(f64, Vec<(String, f64, &'static str)>)> {
        let track = self.inner.minigame().track()?;
        let notes = track
            .notes()
            .iter()
            .map(|n| {
                let state = match n.state {
                    NoteState::Pending => "pending",
                    NoteState::Hit => "hit",
                    NoteState::Missed => "missed",
                };
                (n.key.as_char().to_string(), n.due, state)
            })
            .collect();
        Some((track.clock(), notes))
    }

    /// `(name, position, interactive)` for every proxy, for rendering.
    fn proxies(&self) -> Vec<(String, Point, bool)> {
        self.inner
            .proxies()
            .iter()
            .map(|p| (p.name.clone(), (p.pos.x, p.pos.y, p.pos.z), p.interactive))
            .collect()
    }

    /// Get current state as dict for easy inspection.
    fn state_dict(&self, py: Python<'_>) -> PyResult<PyObject> {
        let player = self.inner.player();
        let eye = player.eye();

        let dict = PyDict::new(py);
        dict.set_item("scene", &self.inner.config().name)?;
        dict.set_item("player_x", eye.x)?;
        dict.set_item("player_y", eye.y)?;
        dict.set_item("player_z", eye.z)?;
        dict.set_item("player_speed", player.speed())?;
        dict.set_item("on_floor", player.on_floor)?;
        dict.set_item("proxies", self.inner.proxies().len())?;
        dict.set_item("instruments_completed", self.inner.minigame().completed_count())?;
        dict.set_item("escaped", self.inner.minigame().has_escaped())?;
        Ok(dict.into_any().unbind())
    }
}

impl Simulation {
    fn key(&mut self, code: &str, down: bool) -> bool {
        let Some(key) = Key::from_code(code) else {
            return false;
        };
        let event = if down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        };
        self.inner.push_input(event);
        true
    }
}

/// Install a `tracing` subscriber printing core logs to stderr.
///
/// `filter` uses `EnvFilter` syntax; without one `RUST_LOG` is read,
/// falling back to `info`. Returns `False` if a subscriber was already set.
#[pyfunction]
#[pyo3(signature = (filter=None))]
fn init_logging(filter: Option<&str>) -> bool {
    let filter = match filter {
        Some(directives) => tracing_subscriber::EnvFilter::new(directives),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Python module definition.
#[pymodule]
fn fpw_physics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<Simulation>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    Ok(())
}
