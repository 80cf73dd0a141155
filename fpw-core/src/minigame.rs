//! Instrument minigame and the escape condition.
//!
//! ```text
//!            interact near instrument
//!   Idle ─────────────────────────────► Playing { count: 0 }     (presses)
//!    ▲  ▲                              └► Rhythm { track }        (rhythm)
//!    │  │                                    │
//!    │  └── cancel / track failed ◄──────────┤
//!    └───── goal or pass score reached ◄─────┘
//!           (instrument deactivated)
//!
//!   all instruments completed + door present ──► escaped
//! ```
//!
//! Completion is checked once per frame by [`Minigame::update`], not on the
//! press that reached the goal.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::classify::Instrument;
use crate::config::{MinigameConfig, MinigameMode};
use crate::events::{Notice, Prompt};
use crate::proxy::ProxyId;
use crate::rhythm::{NoteKey, RhythmTrack};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum MinigameState {
    #[default]
    Idle,
    Playing {
        instrument: Instrument,
        proxy: ProxyId,
        count: u32,
    },
    Rhythm {
        instrument: Instrument,
        proxy: ProxyId,
        track: RhythmTrack,
    },
}

impl MinigameState {
    fn instrument(&self) -> Option<Instrument> {
        match self {
            MinigameState::Idle => None,
            MinigameState::Playing { instrument, .. } | MinigameState::Rhythm { instrument, .. } => {
                Some(*instrument)
            }
        }
    }
}

enum Finish {
    Passed { instrument: Instrument, proxy: ProxyId },
    Failed { instrument: Instrument, score: u32 },
}

#[derive(Debug, Clone)]
pub struct Minigame {
    config: MinigameConfig,
    state: MinigameState,
    /// Instrument proxies present in the level
    required: usize,
    completed: BTreeSet<ProxyId>,
    escaped: bool,
    door_warned: bool,
}

impl Minigame {
    pub fn new(config: MinigameConfig) -> Self {
        Self {
            config,
            state: MinigameState::Idle,
            required: 0,
            completed: BTreeSet::new(),
            escaped: false,
            door_warned: false,
        }
    }

    /// Forget all progress for a level holding `required` instruments.
    pub fn reset(&mut self, required: usize) {
        self.state = MinigameState::Idle;
        self.required = required;
        self.completed.clear();
        self.escaped = false;
        self.door_warned = false;
    }

    pub fn state(&self) -> &MinigameState {
        &self.state
    }

    pub fn mode(&self) -> MinigameMode {
        self.config.mode
    }

    /// Presses needed in press mode, hits needed in rhythm mode.
    pub fn goal(&self) -> u32 {
        match self.config.mode {
            MinigameMode::Presses => self.config.goal,
            MinigameMode::Rhythm => self.config.rhythm.pass_score,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state != MinigameState::Idle
    }

    pub fn track(&self) -> Option<&RhythmTrack> {
        match &self.state {
            MinigameState::Rhythm { track, .. } => Some(track),
            _ => None,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn has_escaped(&self) -> bool {
        self.escaped
    }

    /// Handle one interact press. `nearest` is the playable instrument in
    /// reach, if any; `rng` draws the notes of a rhythm track.
    pub fn interact<R: Rng + ?Sized>(
        &mut self,
        nearest: Option<(ProxyId, Instrument)>,
        rng: &mut R,
    ) -> Option<Notice> {
        if self.escaped {
            return None;
        }

        match &mut self.state {
            MinigameState::Playing {
                instrument, count, ..
            } => {
                *count = (*count + 1).min(self.config.goal);
                return Some(Notice::MinigameProgress {
                    instrument: *instrument,
                    count: *count,
                    goal: self.config.goal,
                });
            }
            // Rhythm tracks only listen to note keys
            MinigameState::Rhythm { .. } => return None,
            MinigameState::Idle => {}
        }

        let (proxy, instrument) = nearest?;
        if self.completed.contains(&proxy) {
            return None;
        }
        info!(%instrument, proxy, mode = ?self.config.mode, "minigame started");
        self.state = match self.config.mode {
            MinigameMode::Presses => MinigameState::Playing {
                instrument,
                proxy,
                count: 0,
            },
            MinigameMode::Rhythm => MinigameState::Rhythm {
                instrument,
                proxy,
                track: RhythmTrack::generate(rng, &self.config.rhythm),
            },
        };
        Some(Notice::MinigameStarted {
            instrument,
            goal: self.goal(),
        })
    }

    /// Judge a note key against the running rhythm track.
    pub fn press_note(&mut self, key: NoteKey) -> Option<Notice> {
        let MinigameState::Rhythm {
            instrument, track, ..
        } = &mut self.state
        else {
            return None;
        };
        let hit = track.press(key)?;
        Some(Notice::NoteJudged {
            instrument: *instrument,
            key,
            hit,
            score: track.score(),
        })
    }

    /// Abandon the running game without completing the instrument.
    pub fn cancel(&mut self) -> Option<Notice> {
        let instrument = self.state.instrument()?;
        debug!(%instrument, "minigame cancelled");
        self.state = MinigameState::Idle;
        Some(Notice::MinigameCancelled { instrument })
    }

    /// Advance a running rhythm track by `elapsed` seconds, finish the
    /// running game if it is over and open the door once every instrument is
    /// done.
    ///
    /// Returns the proxy of an instrument completed this frame so the caller
    /// can deactivate it.
    pub fn update(&mut self, elapsed: f64, door_present: bool, notices: &mut Vec<Notice>) -> Option<ProxyId> {
        let goal = self.config.goal;
        let finish = match &mut self.state {
            MinigameState::Idle => None,
            MinigameState::Playing {
                instrument,
                proxy,
                count,
            } => (*count >= goal).then_some(Finish::Passed {
                instrument: *instrument,
                proxy: *proxy,
            }),
            MinigameState::Rhythm {
                instrument,
                proxy,
                track,
            } => {
                for key in track.advance(elapsed) {
                    notices.push(Notice::NoteJudged {
                        instrument: *instrument,
                        key,
                        hit: false,
                        score: track.score(),
                    });
                }
                if !track.is_finished() {
                    None
                } else if track.passed() {
                    Some(Finish::Passed {
                        instrument: *instrument,
                        proxy: *proxy,
                    })
                } else {
                    Some(Finish::Failed {
                        instrument: *instrument,
                        score: track.score(),
                    })
                }
            }
        };

        let mut finished = None;
        match finish {
            Some(Finish::Passed { instrument, proxy }) => {
                info!(%instrument, proxy, "instrument completed");
                self.completed.insert(proxy);
                self.state = MinigameState::Idle;
                notices.push(Notice::InstrumentCompleted { instrument, proxy });
                finished = Some(proxy);
            }
            Some(Finish::Failed { instrument, score }) => {
                let needed = self.config.rhythm.pass_score;
                info!(%instrument, score, needed, "rhythm track failed");
                self.state = MinigameState::Idle;
                notices.push(Notice::MinigameFailed {
                    instrument,
                    score,
                    needed,
                });
            }
            None => {}
        }

        if !self.escaped && self.required > 0 && self.completed.len() >= self.required {
            if door_present {
                info!("all instruments completed, door opened");
                self.escaped = true;
                notices.push(Notice::DoorOpened);
            } else if !self.door_warned {
                warn!("all instruments completed but the level has no door");
                self.door_warned = true;
            }
        }

        finished
    }

    /// What the host should display given the instrument in reach.
    pub fn prompt(&self, nearest: Option<Instrument>) -> Option<Prompt> {
        if self.escaped {
            return Some(Prompt::Escaped);
        }
        match &self.state {
            MinigameState::Playing {
                instrument, count, ..
            } => Some(Prompt::Progress {
                instrument: *instrument,
                count: *count,
                goal: self.config.goal,
            }),
            MinigameState::Rhythm {
                instrument, track, ..
            } => Some(Prompt::Rhythm {
                instrument: *instrument,
                next: track.next_pending().map(|n| n.key),
                score: track.score(),
                notes: track.notes().len(),
            }),
            MinigameState::Idle => nearest.map(|instrument| Prompt::PressToPlay { instrument }),
        }
    }
}

impl Default for Minigame {
    fn default() -> Self {
        Self::new(MinigameConfig::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
