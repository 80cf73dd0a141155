//! Scene object tagging.
//!
//! Loaded scene nodes normally carry an explicit [`ObjectTag`]. Assets
//! authored before tags existed fall back to [`classify_name`], which matches
//! case-insensitive name substrings in a fixed precedence order so a name
//! matching several categories always lands in the same one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Playable instruments in the store scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Guitar,
    Drum,
    Piano,
}

impl Instrument {
    pub const ALL: [Instrument; 3] = [Instrument::Guitar, Instrument::Drum, Instrument::Piano];

    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Guitar => "guitar",
            Instrument::Drum => "drum",
            Instrument::Piano => "piano",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a scene object in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectTag {
    Floor,
    Wall,
    Door,
    Lamp,
    /// Movable furniture (tables, wardrobes, chairs, hats)
    Furniture,
    Instrument(Instrument),
    /// Static geometry with no proxy
    Scenery,
}

impl ObjectTag {
    /// Whether objects with this tag get a physics proxy.
    pub fn has_proxy(self) -> bool {
        matches!(
            self,
            ObjectTag::Floor | ObjectTag::Wall | ObjectTag::Furniture | ObjectTag::Instrument(_)
        )
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown object tag: {0}")]
pub struct UnknownTag(pub String);

/// Parse a tag by its serialized name (`"wall"`, `"furniture"`, ...). An
/// instrument name such as `"piano"` stands for that instrument's tag.
impl FromStr for ObjectTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Some(instrument) = Instrument::ALL.into_iter().find(|i| i.as_str() == lower) {
            return Ok(ObjectTag::Instrument(instrument));
        }
        serde_yaml::from_value(serde_yaml::Value::String(lower)).map_err(|_| UnknownTag(s.to_string()))
    }
}

const FURNITURE_KEYWORDS: [&str; 4] = ["table", "guardaropa", "chair", "hat"];

/// Classify an untagged object by its name.
///
/// Precedence: floor, wall, door, instrument, furniture, lamp. Anything else
/// is scenery.
pub fn classify_name(name: &str) -> ObjectTag {
    let lower = name.to_lowercase();

    if lower.contains("floor") {
        return ObjectTag::Floor;
    }
    if lower.contains("wall") {
        return ObjectTag::Wall;
    }
    if lower.contains("door") {
        return ObjectTag::Door;
    }
    if let Some(instrument) = Instrument::ALL
        .into_iter()
        .find(|i| lower.contains(i.as_str()))
    {
        return ObjectTag::Instrument(instrument);
    }
    if FURNITURE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return ObjectTag::Furniture;
    }
    if lower.contains("lamp") {
        return ObjectTag::Lamp;
    }
    ObjectTag::Scenery
}
