//! Note track for the keyboard variant of the instrument game.
//!
//! A track is a fixed sequence of note keys scrolling toward a hit zone.
//! Note `i` reaches the zone `lead_in + i * note_interval` seconds after the
//! game starts.
//!
//! ```text
//!   pending ──(right key pressed)──► hit      score += 1
//!      │
//!      ├─────(wrong key pressed)───► missed
//!      └─────(reaches the zone)────► missed
//! ```
//!
//! A key press always judges the first pending note, however far it still
//! is from the zone. The track is finished once no note is pending.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RhythmConfig;

/// Keys a note can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKey {
    P,
    O,
    I,
    U,
}

impl NoteKey {
    pub const ALL: [NoteKey; 4] = [NoteKey::P, NoteKey::O, NoteKey::I, NoteKey::U];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_char(self) -> char {
        match self {
            NoteKey::P => 'p',
            NoteKey::O => 'o',
            NoteKey::I => 'i',
            NoteKey::U => 'u',
        }
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteState {
    Pending,
    Hit,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub key: NoteKey,
    /// Track time at which the note enters the hit zone (s)
    pub due: f64,
    pub state: NoteState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RhythmTrack {
    notes: Vec<Note>,
    clock: f64,
    score: u32,
    pass_score: u32,
}

impl RhythmTrack {
    /// Draw a random key sequence.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, config: &RhythmConfig) -> Self {
        let keys = (0..config.notes)
            .map(|_| NoteKey::ALL[rng.random_range(0..NoteKey::ALL.len())])
            .collect::<Vec<_>>();
        Self::from_keys(&keys, config)
    }

    pub fn from_keys(keys: &[NoteKey], config: &RhythmConfig) -> Self {
        let notes = keys
            .iter()
            .enumerate()
            .map(|(i, &key)| Note {
                key,
                due: config.lead_in + i as f64 * config.note_interval,
                state: NoteState::Pending,
            })
            .collect();
        Self {
            notes,
            clock: 0.0,
            score: 0,
            pass_score: config.pass_score,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn pass_score(&self) -> u32 {
        self.pass_score
    }

    pub fn next_pending(&self) -> Option<&Note> {
        self.notes.iter().find(|n| n.state == NoteState::Pending)
    }

    /// Judge the first pending note against `key`.
    ///
    /// Returns whether it was a hit, or `None` when nothing is pending.
    pub fn press(&mut self, key: NoteKey) -> Option<bool> {
        let note = self.notes.iter_mut().find(|n| n.state == NoteState::Pending)?;
        let hit = note.key == key;
        if hit {
            note.state = NoteState::Hit;
            self.score += 1;
        } else {
            note.state = NoteState::Missed;
        }
        Some(hit)
    }

    /// Run the clock forward. Returns the keys of notes that reached the
    /// zone unpressed during this step.
    pub fn advance(&mut self, dt: f64) -> Vec<NoteKey> {
        self.clock += dt;
        let clock = self.clock;

        self.notes
            .iter_mut()
            .filter(|n| n.state == NoteState::Pending && n.due <= clock)
            .map(|n| {
                n.state = NoteState::Missed;
                n.key
            })
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.next_pending().is_none()
    }

    pub fn passed(&self) -> bool {
        self.score >= self.pass_score
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn short_track() -> RhythmTrack {
        let config = RhythmConfig {
            notes: 3,
            pass_score: 2,
            lead_in: 1.0,
            note_interval: 0.5,
        };
        RhythmTrack::from_keys(&[NoteKey::P, NoteKey::U, NoteKey::O], &config)
    }

    #[test]
    fn test_generated_track_follows_config() {
        let config = RhythmConfig::default();
        let track = RhythmTrack::generate(&mut ChaCha8Rng::seed_from_u64(1), &config);

        assert_eq!(track.notes().len(), 20);
        assert_eq!(track.pass_score(), 11);
        assert_eq!(track.notes()[0].due, 2.0);
        assert!((track.notes()[19].due - (2.0 + 19.0 * 0.55)).abs() < 1e-12);
        assert!(track.notes().iter().all(|n| n.state == NoteState::Pending));

        let again = RhythmTrack::generate(&mut ChaCha8Rng::seed_from_u64(1), &config);
        assert_eq!(track, again);
    }

    #[test]
    fn test_press_judges_first_pending_note() {
        let mut track = short_track();

        assert_eq!(track.press(NoteKey::P), Some(true));
        assert_eq!(track.press(NoteKey::P), Some(false));
        assert_eq!(track.next_pending().map(|n| n.key), Some(NoteKey::O));
        assert_eq!(track.score(), 1);
    }

    #[test]
    fn test_unpressed_notes_expire_in_the_zone() {
        let mut track = short_track();

        assert!(track.advance(0.9).is_empty());
        assert_eq!(track.advance(0.2), vec![NoteKey::P]);
        assert_eq!(track.advance(1.0), vec![NoteKey::U, NoteKey::O]);

        assert!(track.is_finished());
        assert_eq!(track.score(), 0);
        assert!(!track.passed());
    }

    #[test]
    fn test_press_after_finish_is_ignored() {
        let mut track = short_track();
        for key in [NoteKey::P, NoteKey::U, NoteKey::O] {
            track.press(key);
        }

        assert!(track.is_finished());
        assert!(track.passed());
        assert_eq!(track.press(NoteKey::I), None);
        assert_eq!(track.score(), 3);
    }
}
