#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mnemosyne session engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters submit [`Command`] values
//! (player input edges and wall-clock ticks), the session executes them and
//! broadcasts [`Event`] values describing what happened. Audio side effects
//! travel as explicit [`AudioCue`] values inside [`Event::Cue`] and are handed
//! to a [`CueSink`] exactly once. Presentation reads [`SessionSnapshot`]
//! copies and never touches the live state.

mod meter;
mod snapshot;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use meter::Meter;
pub use snapshot::SessionSnapshot;

/// Logical duration of one simulation step.
///
/// Hosts deliver arbitrary frame deltas; the session accumulates them and runs
/// zero or more steps of exactly this length.
pub const FIXED_STEP: Duration = Duration::from_millis(50);

/// Top-level phase of the session state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing has happened yet; audio output is still locked.
    PreBoot,
    /// Title screen waiting for confirmation.
    Boot,
    /// Level card shown for a fixed delay before play starts.
    LevelIntro,
    /// The simulation advances on every fixed step.
    Playing,
    /// Timed finale sequence played after the last level.
    Cutscene,
    /// Terminal failure; confirm resets the session.
    GameOver,
    /// Terminal success; confirm resets the session.
    Victory,
}

impl Phase {
    /// Reports whether `tick` advances game time in this phase.
    #[must_use]
    pub const fn advances_time(self) -> bool {
        matches!(self, Self::Playing | Self::Cutscene)
    }

    /// Reports whether the phase waits for a confirm to reset.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

/// Rule set applied by a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Corridor: the entity creeps closer while the eyes are closed.
    Approach,
    /// Terminal: progress uploads while the eyes are open and the link is unlocked.
    Upload,
    /// Mirror: the reflection punishes open eyes while it watches.
    Reflection,
    /// Basement: progress needs open eyes, and the entity rushes whoever looks.
    Void,
    /// Archive: progress is only recovered while the entity is dormant.
    Corruption,
    /// Core: inverted polarity, open eyes hold the entity back.
    Origin,
}

impl Archetype {
    /// Every archetype in campaign order.
    pub const ALL: [Self; 6] = [
        Self::Approach,
        Self::Upload,
        Self::Reflection,
        Self::Void,
        Self::Corruption,
        Self::Origin,
    ];

    /// Short uppercase label used by presentation layers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approach => "APPROACH",
            Self::Upload => "UPLOAD",
            Self::Reflection => "REFLECTION",
            Self::Void => "THE VOID",
            Self::Corruption => "CORRUPTION",
            Self::Origin => "ORIGIN",
        }
    }

    /// Reports whether a full danger meter ends the session in this archetype.
    #[must_use]
    pub const fn danger_is_lethal(self) -> bool {
        !matches!(self, Self::Upload)
    }
}

/// Behavioural mode of the entity inhabiting the current level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityMode {
    /// The entity is not paying attention.
    Idle,
    /// The reflection is looking back at the player.
    Watching,
    /// The archive entity is active and hostile.
    Danger,
    /// The archive entity is dormant.
    Safe,
}

impl EntityMode {
    /// Reports whether open eyes are punished in this mode.
    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::Watching | Self::Danger)
    }
}

/// Edge-triggered input delivered by the presentation adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    /// The player started holding their eyes closed.
    EyeDown,
    /// The player released and opened their eyes.
    EyeUp,
    /// The player confirmed (start, continue, reset).
    Confirm,
    /// The player pressed a character key.
    Key(char),
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Relays a player input edge.
    Input(InputEvent),
    /// Advances the session clock by the provided wall-clock delta.
    Tick {
        /// Host time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// How a level is completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelGoal {
    /// The level ends once the elapsed time reaches the duration.
    Survive(Duration),
    /// The level ends once the progress meter fills.
    Progress,
}

/// Static, immutable configuration for one level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Rule set applied while the level is playing.
    pub archetype: Archetype,
    /// Completion criterion.
    pub goal: LevelGoal,
    /// Title shown on the level card.
    pub title: String,
}

impl LevelDefinition {
    /// Creates a new level definition.
    #[must_use]
    pub fn new<T>(archetype: Archetype, goal: LevelGoal, title: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            archetype,
            goal,
            title: title.into(),
        }
    }
}

/// In-fiction reasons a session can end in failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCause {
    /// The moisture meter ran dry.
    Dryness,
    /// The corridor entity reached the player.
    Touched,
    /// The reflection took the player's place.
    Replaced,
    /// The archive entity overwrote the player.
    Corrupted,
    /// The basement entity saw the player looking.
    Seen,
    /// The core entity got in while the eyes were closed.
    Absorbed,
}

impl FailureCause {
    /// Stable lowercase marker identifying the cause inside log lines.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Dryness => "dryness",
            Self::Touched => "contact",
            Self::Replaced => "reflection",
            Self::Corrupted => "corruption",
            Self::Seen => "sighted",
            Self::Absorbed => "core",
        }
    }

    /// Human-readable cause of death.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Dryness => "EYES DRIED OUT. CONTACT LOST.",
            Self::Touched => "IT TOUCHED YOU.",
            Self::Replaced => "THE REFLECTION REPLACED YOU.",
            Self::Corrupted => "MEMORY SECTORS OVERWRITTEN.",
            Self::Seen => "IT SAW YOU.",
            Self::Absorbed => "THE CORE TOOK YOU IN.",
        }
    }

    /// Line appended to the failure log.
    #[must_use]
    pub fn log_line(self) -> String {
        format!("[{}] {}", self.marker(), self.message())
    }
}

/// Terminal signal returned by a single simulation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepSignal {
    /// The level keeps playing.
    Continue,
    /// The level goal was met.
    Advance,
    /// The player died.
    GameOver(FailureCause),
}

/// Full-screen effect layered above the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    /// Jump-scare image with a scream.
    Phantom,
    /// Sub-150ms subliminal frame.
    Flash,
}

/// Active overlay together with its remaining display time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Overlay {
    /// Kind of overlay shown.
    pub kind: OverlayKind,
    /// Time left before the overlay disappears.
    pub remaining: Duration,
}

/// Stage of the finale sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CutsceneStage {
    /// The world caves in; audio ducks.
    Collapse,
    /// Total silence.
    Blackout,
    /// Sound returns as the player wakes.
    Restore,
}

impl CutsceneStage {
    /// Stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Collapse => Some(Self::Blackout),
            Self::Blackout => Some(Self::Restore),
            Self::Restore => None,
        }
    }

    /// How long the stage lasts.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::Collapse => Duration::from_millis(2_000),
            Self::Blackout => Duration::from_millis(1_500),
            Self::Restore => Duration::from_millis(2_500),
        }
    }

    /// Multiplier applied to the master gain while the stage is active.
    #[must_use]
    pub const fn gain_scale(self) -> f32 {
        match self {
            Self::Collapse => 0.3,
            Self::Blackout => 0.0,
            Self::Restore => 1.0,
        }
    }
}

/// Audio side effects emitted by the session for the audio layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioCue {
    /// Unlocks audio output following a genuine user gesture.
    Activate,
    /// Switches the background layer to the menu hum.
    MenuAmbience,
    /// Switches the background layer to the in-game drone.
    GameAmbience,
    /// Retunes the persistent tension tone.
    Proximity {
        /// Rule set of the level being played.
        archetype: Archetype,
        /// Normalised danger in `0.0..=1.0`.
        danger: f32,
        /// Archetype-specific modifier (watching, hostile, locked).
        alert: bool,
    },
    /// Mutes the tension tone when leaving play.
    TensionOff,
    /// Rising sawtooth shriek.
    Scream {
        /// Length of the stinger.
        duration: Duration,
    },
    /// White-noise burst.
    StaticBurst {
        /// Length of the stinger.
        duration: Duration,
    },
    /// Breathy filtered noise.
    Whisper,
    /// Falling square-wave screech.
    DigitalError,
    /// Rising confirmation chirp.
    RepairSuccess,
    /// Short UI click.
    Click,
    /// Low percussive impact.
    Thud,
    /// Single heartbeat pulse.
    Heartbeat {
        /// Whether the pulse belongs to a racing heart.
        fast: bool,
    },
    /// Scales the master gain relative to its default.
    MasterGain {
        /// Multiplier in `0.0..=1.0`.
        scale: f32,
    },
    /// Releases every audio resource.
    Shutdown,
}

/// Consumer of audio cues; implemented by the audio engine.
///
/// Implementations must never panic or fail into game logic.
pub trait CueSink {
    /// Plays or applies the provided cue.
    fn play(&mut self, cue: &AudioCue);
}

/// Sink that discards every cue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutedSink;

impl CueSink for MutedSink {
    fn play(&mut self, _cue: &AudioCue) {}
}

impl CueSink for Vec<AudioCue> {
    fn play(&mut self, cue: &AudioCue) {
        self.push(*cue);
    }
}

impl<S> CueSink for Box<S>
where
    S: CueSink + ?Sized,
{
    fn play(&mut self, cue: &AudioCue) {
        (**self).play(cue);
    }
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The session moved between phases.
    PhaseChanged {
        /// Phase left behind.
        from: Phase,
        /// Phase entered.
        to: Phase,
    },
    /// A level card is being shown.
    LevelAnnounced {
        /// Index of the level within the table.
        index: usize,
        /// Rule set of the announced level.
        archetype: Archetype,
    },
    /// The player's eye state changed.
    EyesChanged {
        /// Whether the eyes are now closed.
        closed: bool,
    },
    /// The entity switched behaviour.
    EntityShifted {
        /// Mode that became active.
        mode: EntityMode,
    },
    /// The upload link locked and demands a repair key.
    LockEngaged {
        /// Key that clears the lock.
        key: char,
    },
    /// The upload lock was cleared by the correct key.
    LockCleared,
    /// A wrong key was pressed while the upload was locked.
    RepairRejected {
        /// Key that was pressed.
        key: char,
    },
    /// Panic overflowed and the eyes were forced open.
    PanicOverflow,
    /// The panic penalty window expired.
    PenaltyLifted,
    /// The level asked for a phantom scare outside the scheduler.
    PhantomRequested,
    /// Short screen glitch with shake.
    Glitch,
    /// A phantom jump-scare became visible.
    PhantomTriggered {
        /// How long the overlay stays up.
        overlay: Duration,
    },
    /// A subliminal flash became visible.
    FlashTriggered {
        /// How long the flash stays up.
        duration: Duration,
    },
    /// The level goal was met.
    LevelCompleted {
        /// Index of the completed level.
        index: usize,
    },
    /// The finale advanced to a new stage.
    CutsceneAdvanced {
        /// Stage that became active.
        stage: CutsceneStage,
    },
    /// The session ended in failure.
    GameOver {
        /// Cause recorded in the failure log.
        cause: FailureCause,
    },
    /// The session ended in success.
    Victory,
    /// The session returned to its initial values.
    SessionReset,
    /// Audio side effect relayed to the cue sink.
    Cue(AudioCue),
}

#[cfg(test)]
mod tests {
    use super::{Archetype, CutsceneStage, FailureCause, LevelDefinition, LevelGoal, Phase};
    use serde::{de::DeserializeOwned, Serialize};
    use std::time::Duration;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn only_playing_and_cutscene_advance_time() {
        let advancing: Vec<Phase> = [
            Phase::PreBoot,
            Phase::Boot,
            Phase::LevelIntro,
            Phase::Playing,
            Phase::Cutscene,
            Phase::GameOver,
            Phase::Victory,
        ]
        .into_iter()
        .filter(|phase| phase.advances_time())
        .collect();
        assert_eq!(advancing, vec![Phase::Playing, Phase::Cutscene]);
    }

    #[test]
    fn failure_log_line_carries_marker() {
        let line = FailureCause::Dryness.log_line();
        assert!(line.contains("dryness"), "unexpected line {line}");
        assert!(line.starts_with('['));
    }

    #[test]
    fn cutscene_stages_chain_to_completion() {
        let mut stage = CutsceneStage::Collapse;
        let mut total = stage.duration();
        while let Some(next) = stage.next() {
            stage = next;
            total += stage.duration();
        }
        assert_eq!(stage, CutsceneStage::Restore);
        assert_eq!(total, Duration::from_millis(6_000));
        assert!((CutsceneStage::Restore.gain_scale() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn upload_is_the_only_non_lethal_archetype() {
        let non_lethal: Vec<Archetype> = Archetype::ALL
            .into_iter()
            .filter(|archetype| !archetype.danger_is_lethal())
            .collect();
        assert_eq!(non_lethal, vec![Archetype::Upload]);
    }

    #[test]
    fn level_definition_round_trips_through_bincode() {
        let definition = LevelDefinition::new(
            Archetype::Reflection,
            LevelGoal::Survive(Duration::from_secs(25)),
            "SEQUENCE_03: REFLECTION",
        );
        assert_round_trip(&definition);
    }
}
