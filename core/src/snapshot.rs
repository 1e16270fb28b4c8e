//! Read-only copies of the session state handed to presentation layers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Archetype, CutsceneStage, EntityMode, LevelGoal, Meter, Overlay, Phase};

/// Immutable copy of the session state used for rendering.
///
/// Snapshots are detached from the live session; mutating one has no effect on
/// the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Active phase of the state machine.
    pub phase: Phase,
    /// Index of the current level.
    pub level_index: usize,
    /// Number of levels in the campaign.
    pub level_count: usize,
    /// Rule set of the current level.
    pub archetype: Archetype,
    /// Title of the current level.
    pub level_title: String,
    /// Completion criterion of the current level.
    pub goal: LevelGoal,
    /// Whether the player's eyes are closed.
    pub eyes_closed: bool,
    /// Ocular moisture; 100 is fully hydrated.
    pub moisture: Meter,
    /// Level hazard meter.
    pub danger: Meter,
    /// Level task meter.
    pub progress: Meter,
    /// Panic meter used by reflection levels.
    pub panic: Meter,
    /// Behaviour of the entity.
    pub entity_mode: EntityMode,
    /// Simulated time spent in the current level.
    pub level_elapsed: Duration,
    /// Key that clears the active upload lock, if any.
    pub lock: Option<char>,
    /// Remaining forced-eyes-open time, if a panic penalty is active.
    pub penalty_remaining: Option<Duration>,
    /// Full-screen effect currently shown.
    pub overlay: Option<Overlay>,
    /// Screen-shake intensity in pixels.
    pub shake: f32,
    /// Active finale stage, if the cutscene is playing.
    pub cutscene_stage: Option<CutsceneStage>,
    /// Causes of death recorded since the last reset.
    pub failure_log: Vec<String>,
}

impl SessionSnapshot {
    /// Complement of the moisture meter.
    #[must_use]
    pub fn dryness(&self) -> Meter {
        self.moisture.inverse()
    }

    /// Fraction of the current level goal that has been completed.
    #[must_use]
    pub fn completion(&self) -> f32 {
        match self.goal {
            LevelGoal::Survive(duration) => {
                if duration.is_zero() {
                    1.0
                } else {
                    (self.level_elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
                }
            }
            LevelGoal::Progress => self.progress.fraction(),
        }
    }
}
