#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic level simulator advancing the per-archetype rules one fixed step at a time.
//!
//! The simulator owns the player's eye state and every meter of the level that
//! is currently playing. Each call to [`LevelSimulator::step`] applies the
//! shared moisture rule, then the archetype rule set, and reports the outcome
//! as a [`StepSignal`]. Death always takes precedence over advancing.

mod approach;
mod corruption;
mod origin;
mod reflection;
mod tuning;
mod upload;
mod void;

use std::time::Duration;

use mnemosyne_core::{
    Archetype, EntityMode, Event, FailureCause, LevelDefinition, LevelGoal, Meter, StepSignal,
    FIXED_STEP,
};
use rand::Rng;

pub use tuning::{
    ApproachTuning, CorruptionTuning, MoistureTuning, OriginTuning, ReflectionTuning, Tuning,
    UploadTuning, VoidTuning,
};

use approach::Approach;
use corruption::Corruption;
use origin::Origin;
use reflection::Reflection;
use upload::Upload;
use void::Void;

/// Gauges evolved by the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Meters {
    /// Ocular moisture; the session ends when it runs dry.
    pub moisture: Meter,
    /// Level hazard.
    pub danger: Meter,
    /// Level task completion.
    pub progress: Meter,
    /// Panic, only used by reflection levels.
    pub panic: Meter,
}

impl Meters {
    /// Values every level starts with.
    #[must_use]
    pub const fn fresh() -> Self {
        Self {
            moisture: Meter::full(),
            danger: Meter::empty(),
            progress: Meter::empty(),
            panic: Meter::empty(),
        }
    }
}

impl Default for Meters {
    fn default() -> Self {
        Self::fresh()
    }
}

/// Outcome of a character key routed to the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyOutcome {
    /// No lock was active or the level does not react to keys.
    Ignored,
    /// The correct key cleared the lock.
    Repaired,
    /// A wrong key was pressed and progress was deducted.
    Rejected,
}

/// Read-only view of the level state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelReadout {
    /// Index of the level within the campaign.
    pub index: usize,
    /// Rule set being simulated.
    pub archetype: Archetype,
    /// Completion criterion.
    pub goal: LevelGoal,
    /// Whether the player's eyes are closed.
    pub eyes_closed: bool,
    /// Current meter values.
    pub meters: Meters,
    /// Behaviour of the entity.
    pub entity_mode: EntityMode,
    /// Simulated time spent in the level.
    pub elapsed: Duration,
    /// Key demanded by an active upload lock.
    pub lock: Option<char>,
    /// Remaining forced-eyes-open time.
    pub penalty_remaining: Option<Duration>,
}

impl LevelReadout {
    /// Archetype-specific modifier for the tension tone.
    ///
    /// Set while the reflection watches, the archive entity is hostile, the
    /// upload link is locked, the basement entity can see the player, or the
    /// core entity is closing in.
    #[must_use]
    pub fn alert(&self) -> bool {
        match self.archetype {
            Archetype::Upload => self.lock.is_some(),
            Archetype::Void => !self.eyes_closed,
            Archetype::Origin => self.eyes_closed,
            Archetype::Approach | Archetype::Reflection | Archetype::Corruption => {
                self.entity_mode.is_hostile()
            }
        }
    }
}

/// Mutable level state shared by every rule set.
#[derive(Clone, Debug)]
pub(crate) struct LevelState {
    pub(crate) index: usize,
    pub(crate) archetype: Archetype,
    pub(crate) goal: LevelGoal,
    pub(crate) eyes_closed: bool,
    pub(crate) meters: Meters,
    pub(crate) entity_mode: EntityMode,
    pub(crate) elapsed: Duration,
}

impl LevelState {
    fn enter(index: usize, definition: &LevelDefinition) -> Self {
        let entity_mode = match definition.archetype {
            Archetype::Corruption => EntityMode::Safe,
            _ => EntityMode::Idle,
        };
        Self {
            index,
            archetype: definition.archetype,
            goal: definition.goal,
            eyes_closed: false,
            meters: Meters::fresh(),
            entity_mode,
            elapsed: Duration::ZERO,
        }
    }

    fn goal_met(&self) -> bool {
        match self.goal {
            LevelGoal::Survive(duration) => self.elapsed >= duration,
            LevelGoal::Progress => self.meters.progress.is_full(),
        }
    }
}

#[derive(Clone, Debug)]
enum Rules {
    Approach(Approach),
    Upload(Upload),
    Reflection(Reflection),
    Void(Void),
    Corruption(Corruption),
    Origin(Origin),
}

impl Rules {
    fn for_archetype(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Approach => Self::Approach(Approach),
            Archetype::Upload => Self::Upload(Upload::default()),
            Archetype::Reflection => Self::Reflection(Reflection::default()),
            Archetype::Void => Self::Void(Void),
            Archetype::Corruption => Self::Corruption(Corruption),
            Archetype::Origin => Self::Origin(Origin),
        }
    }
}

/// Simulates the level that is currently playing.
#[derive(Clone, Debug)]
pub struct LevelSimulator {
    tuning: Tuning,
    state: LevelState,
    rules: Rules,
}

impl LevelSimulator {
    /// Creates a simulator positioned at the start of the provided level.
    #[must_use]
    pub fn new(tuning: Tuning, index: usize, definition: &LevelDefinition) -> Self {
        Self {
            tuning,
            state: LevelState::enter(index, definition),
            rules: Rules::for_archetype(definition.archetype),
        }
    }

    /// Resets every meter and transient flag for the provided level.
    pub fn enter(&mut self, index: usize, definition: &LevelDefinition) {
        self.state = LevelState::enter(index, definition);
        self.rules = Rules::for_archetype(definition.archetype);
        log::debug!(
            "entering level {index} ({})",
            definition.archetype.label()
        );
    }

    /// Tuning the simulator was built with.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Captures the observable level state.
    #[must_use]
    pub fn readout(&self) -> LevelReadout {
        let lock = match &self.rules {
            Rules::Upload(upload) => upload.lock(),
            _ => None,
        };
        LevelReadout {
            index: self.state.index,
            archetype: self.state.archetype,
            goal: self.state.goal,
            eyes_closed: self.state.eyes_closed,
            meters: self.state.meters,
            entity_mode: self.state.entity_mode,
            elapsed: self.state.elapsed,
            lock,
            penalty_remaining: self.penalty_remaining(),
        }
    }

    /// Remaining forced-eyes-open time, if a panic penalty is active.
    #[must_use]
    pub fn penalty_remaining(&self) -> Option<Duration> {
        match &self.rules {
            Rules::Reflection(reflection) => reflection.penalty(),
            _ => None,
        }
    }

    /// Applies an eye edge, returning whether the eye state changed.
    ///
    /// Closing is refused while a panic penalty holds the eyes open.
    pub fn set_eyes_closed(&mut self, closed: bool) -> bool {
        if closed && self.penalty_remaining().is_some() {
            return false;
        }
        if self.state.eyes_closed == closed {
            return false;
        }
        self.state.eyes_closed = closed;
        true
    }

    /// Routes a character key to the level rules.
    pub fn handle_key(&mut self, key: char, out: &mut Vec<Event>) -> KeyOutcome {
        match &mut self.rules {
            Rules::Upload(upload) => {
                upload.handle_key(key, &mut self.state, &self.tuning.upload, out)
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Forces an upload lock on `key`, returning `false` when none could be engaged.
    pub fn engage_lock(&mut self, key: char, out: &mut Vec<Event>) -> bool {
        match &mut self.rules {
            Rules::Upload(upload) => upload.engage(key.to_ascii_uppercase(), out),
            _ => false,
        }
    }

    /// Advances the level by one fixed step.
    pub fn step<R>(&mut self, rng: &mut R, out: &mut Vec<Event>) -> StepSignal
    where
        R: Rng,
    {
        self.state.elapsed += FIXED_STEP;

        let moisture = &self.tuning.moisture;
        if self.state.eyes_closed {
            self.state.meters.moisture.raise(moisture.recovery);
        } else {
            let decay = moisture.decay_for_level(self.state.index);
            self.state.meters.moisture.lower(decay);
        }
        if self.state.meters.moisture.is_empty() {
            return StepSignal::GameOver(FailureCause::Dryness);
        }

        let death = match &mut self.rules {
            Rules::Approach(rules) => rules.step(&mut self.state, &self.tuning.approach, rng),
            Rules::Upload(rules) => rules.step(&mut self.state, &self.tuning.upload, rng, out),
            Rules::Reflection(rules) => {
                rules.step(&mut self.state, &self.tuning.reflection, rng, out)
            }
            Rules::Void(rules) => rules.step(&mut self.state, &self.tuning.void),
            Rules::Corruption(rules) => {
                rules.step(&mut self.state, &self.tuning.corruption, rng, out)
            }
            Rules::Origin(rules) => rules.step(&mut self.state, &self.tuning.origin),
        };

        if let Some(cause) = death {
            return StepSignal::GameOver(cause);
        }
        if self.state.goal_met() {
            return StepSignal::Advance;
        }
        StepSignal::Continue
    }
}

/// Rolls a per-step chance, tolerating out-of-range tuning values.
pub(crate) fn roll<R>(rng: &mut R, probability: f64) -> bool
where
    R: Rng,
{
    if probability.is_nan() {
        return false;
    }
    rng.gen_bool(probability.clamp(0.0, 1.0))
}
