#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Mnemosyne adapters.
//!
//! Presentation layers never touch the live session. They receive
//! [`SessionSnapshot`] copies, turn them into a [`Scene`] through a
//! [`SceneComposer`], and report player input back as a [`FrameInput`].

mod glitch;
mod headless;

pub use glitch::{Scrambler, TextGlitch, CHARACTER_SCRAMBLE_CHANCE, GLITCH_GLYPHS};
pub use headless::{Autopilot, HeadlessBackend};

use anyhow::Result as AnyResult;
use glam::Vec2;
use mnemosyne_core::{
    Archetype, CutsceneStage, EntityMode, InputEvent, LevelGoal, OverlayKind, Phase,
    SessionSnapshot,
};
use rand::Rng;
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

/// Colors shared by every backend.
pub mod palette {
    use super::Color;

    /// Frame background.
    pub const BACKGROUND: Color = Color::from_rgb_u8(0, 0, 0);
    /// Regular text.
    pub const TEXT: Color = Color::from_rgb_u8(229, 231, 235);
    /// Dimmed text and empty meter tracks.
    pub const MUTED: Color = Color::from_rgb_u8(55, 65, 81);
    /// Moisture and calm indicators.
    pub const CYAN: Color = Color::from_rgb_u8(34, 211, 238);
    /// Danger and warnings.
    pub const RED: Color = Color::from_rgb_u8(220, 38, 38);
    /// Terminal progress.
    pub const GREEN: Color = Color::from_rgb_u8(34, 197, 94);
    /// Panic.
    pub const AMBER: Color = Color::from_rgb_u8(245, 158, 11);
    /// Victory background.
    pub const PAPER: Color = Color::from_rgb_u8(240, 240, 240);
}

/// Input gathered by adapters during a frame.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// The eye key went down on this frame.
    pub eyes_pressed: bool,
    /// The eye key was released on this frame.
    pub eyes_released: bool,
    /// The confirm key was pressed on this frame.
    pub confirm: bool,
    /// Characters typed on this frame, in order.
    pub keys: Vec<char>,
}

impl FrameInput {
    /// Reports whether nothing happened on this frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.eyes_pressed && !self.eyes_released && !self.confirm && self.keys.is_empty()
    }

    /// Session inputs in dispatch order: releases before presses, then confirm, then keys.
    #[must_use]
    pub fn into_inputs(self) -> Vec<InputEvent> {
        let mut inputs = Vec::with_capacity(3 + self.keys.len());
        if self.eyes_released {
            inputs.push(InputEvent::EyeUp);
        }
        if self.eyes_pressed {
            inputs.push(InputEvent::EyeDown);
        }
        if self.confirm {
            inputs.push(InputEvent::Confirm);
        }
        inputs.extend(self.keys.into_iter().map(InputEvent::Key));
        inputs
    }
}

/// Time spent by the update closure, reported for frame statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTiming {
    /// Time spent advancing the session.
    pub simulation: Duration,
    /// Time spent composing the scene.
    pub scene: Duration,
}

/// Horizontal meter drawn in the HUD.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeterBar {
    /// Caption shown above the bar.
    pub label: &'static str,
    /// Filled fraction in `0.0..=1.0`.
    pub fill: f32,
    /// Fill color.
    pub color: Color,
    /// Whether the bar should pulse as a warning.
    pub critical: bool,
}

/// Everything a backend needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Phase the frame belongs to.
    pub phase: Phase,
    /// Rule set of the current level.
    pub archetype: Archetype,
    /// Main line of text, possibly glitched.
    pub headline: String,
    /// Secondary line: instructions or status.
    pub caption: String,
    /// HUD meters, top to bottom.
    pub meters: Vec<MeterBar>,
    /// Whether the player's eyes are closed.
    pub eyes_closed: bool,
    /// The entity is hostile or the link is locked.
    pub alert: bool,
    /// Moisture as a fraction.
    pub moisture: f32,
    /// Danger as a fraction.
    pub danger: f32,
    /// Panic as a fraction.
    pub panic: f32,
    /// Key the player must type to clear an upload lock.
    pub repair_prompt: Option<char>,
    /// Eye input is refused while a panic penalty runs.
    pub eyes_forced_open: bool,
    /// Full-screen effect to draw over everything.
    pub overlay: Option<OverlayKind>,
    /// Camera offset produced by screen shake.
    pub shake_offset: Vec2,
    /// Opacity of a black layer covering the frame.
    pub blackout: f32,
    /// Causes of death since the last reset.
    pub failure_log: Vec<String>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            phase: Phase::PreBoot,
            archetype: Archetype::Approach,
            headline: String::from(TITLE),
            caption: String::from("PRESS ANY KEY TO WAKE THE AUDIO CORE"),
            meters: Vec::new(),
            eyes_closed: false,
            alert: false,
            moisture: 1.0,
            danger: 0.0,
            panic: 0.0,
            repair_prompt: None,
            eyes_forced_open: false,
            overlay: None,
            shake_offset: Vec2::ZERO,
            blackout: 0.0,
            failure_log: Vec::new(),
        }
    }
}

const TITLE: &str = "MNEMOSYNE";
const CRITICAL_MOISTURE: f32 = 0.2;
const CLOSED_EYES_BLACKOUT: f32 = 0.92;

/// Turns snapshots into scenes, adding text glitches and screen shake.
#[derive(Clone, Debug)]
pub struct SceneComposer<R> {
    scrambler: Scrambler<R>,
}

impl<R: Rng> SceneComposer<R> {
    /// Creates a composer drawing presentation randomness from `rng`.
    ///
    /// Keep this source separate from the session's; presentation must not
    /// perturb the simulation.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self {
            scrambler: Scrambler::new(rng),
        }
    }

    /// Builds the scene for `snapshot`.
    pub fn compose(&mut self, snapshot: &SessionSnapshot) -> Scene {
        let moisture = snapshot.moisture.fraction();
        let danger = snapshot.danger.fraction();
        let exposed = snapshot.archetype == Archetype::Void && !snapshot.eyes_closed;
        let alert = snapshot.entity_mode.is_hostile() || snapshot.lock.is_some() || exposed;

        let (headline, intensity) = match snapshot.phase {
            Phase::PreBoot => (TITLE.to_owned(), 0.0),
            Phase::Boot => (TITLE.to_owned(), 0.1),
            Phase::LevelIntro => (snapshot.level_title.clone(), 0.3),
            Phase::Playing => (snapshot.level_title.clone(), 0.05 + danger * 0.6),
            Phase::Cutscene => ("SYSTEM FAILURE".to_owned(), 0.8),
            Phase::GameOver => ("FATAL ERROR".to_owned(), 0.6),
            Phase::Victory => ("SUBJECT RELEASED".to_owned(), 0.0),
        };
        let headline = self.scrambler.glitch(&headline, intensity);

        let blackout = match (snapshot.phase, snapshot.cutscene_stage) {
            (Phase::Cutscene, Some(stage)) => stage_blackout(stage),
            (Phase::LevelIntro | Phase::Playing, _) if snapshot.eyes_closed => {
                CLOSED_EYES_BLACKOUT
            }
            _ => 0.0,
        };

        Scene {
            phase: snapshot.phase,
            archetype: snapshot.archetype,
            headline,
            caption: caption(snapshot),
            meters: if matches!(snapshot.phase, Phase::Playing | Phase::LevelIntro) {
                meters(snapshot)
            } else {
                Vec::new()
            },
            eyes_closed: snapshot.eyes_closed,
            alert,
            moisture,
            danger,
            panic: snapshot.panic.fraction(),
            repair_prompt: snapshot.lock,
            eyes_forced_open: snapshot.penalty_remaining.is_some(),
            overlay: snapshot.overlay.map(|overlay| overlay.kind),
            shake_offset: shake_offset(snapshot.shake, self.scrambler.rng_mut()),
            blackout,
            failure_log: snapshot.failure_log.clone(),
        }
    }
}

fn stage_blackout(stage: CutsceneStage) -> f32 {
    match stage {
        CutsceneStage::Collapse => 0.6,
        CutsceneStage::Blackout => 1.0,
        CutsceneStage::Restore => 0.3,
    }
}

/// Instruction shown on a level card.
#[must_use]
pub const fn instruction(archetype: Archetype) -> &'static str {
    match archetype {
        Archetype::Approach => "SURVIVE. IT MOVES WHILE YOU ARE NOT LOOKING.",
        Archetype::Upload => "KEEP YOUR EYES OPEN TO UPLOAD. TYPE THE KEY WHEN THE LINK LOCKS.",
        Archetype::Reflection => "IF THE REFLECTION IS WATCHING, CLOSE YOUR EYES [SPACE].",
        Archetype::Void => "IT SEES YOU WHEN YOU SEE IT. OPEN YOUR EYES TO FIND THE EXIT.",
        Archetype::Corruption => "RECOVER THE ARCHIVE ONLY WHILE IT SLEEPS.",
        Archetype::Origin => "IT ONLY MOVES IN THE DARK. DON'T LOOK AWAY.",
    }
}

fn caption(snapshot: &SessionSnapshot) -> String {
    match snapshot.phase {
        Phase::PreBoot => "PRESS ANY KEY TO WAKE THE AUDIO CORE".to_owned(),
        Phase::Boot => "[ENTER] BEGIN    [SPACE] HOLD TO CLOSE YOUR EYES".to_owned(),
        Phase::LevelIntro => instruction(snapshot.archetype).to_owned(),
        Phase::Playing => status(snapshot),
        Phase::Cutscene => String::new(),
        Phase::GameOver => match snapshot.failure_log.last() {
            Some(cause) => format!("{cause}    [ENTER] RESET"),
            None => "[ENTER] RESET".to_owned(),
        },
        Phase::Victory => "YOU WOKE UP.    [ENTER] AGAIN".to_owned(),
    }
}

fn status(snapshot: &SessionSnapshot) -> String {
    if snapshot.penalty_remaining.is_some() {
        return "PANIC. YOUR EYES ARE FORCED OPEN".to_owned();
    }
    if let Some(key) = snapshot.lock {
        return format!("LINK LOCKED. PRESS [{key}]");
    }
    match (snapshot.archetype, snapshot.entity_mode) {
        (Archetype::Reflection, EntityMode::Watching) => return "IT IS WATCHING".to_owned(),
        (Archetype::Corruption, EntityMode::Danger) => return "IT IS AWAKE".to_owned(),
        (Archetype::Void, _) if !snapshot.eyes_closed => return "IT SEES YOU".to_owned(),
        _ => {}
    }
    if snapshot.moisture.fraction() < CRITICAL_MOISTURE {
        return "CRITICAL DRYNESS".to_owned();
    }
    String::new()
}

fn meters(snapshot: &SessionSnapshot) -> Vec<MeterBar> {
    let moisture = snapshot.moisture.fraction();
    let mut bars = vec![
        MeterBar {
            label: "OCULAR MOISTURE",
            fill: moisture,
            color: palette::CYAN,
            critical: moisture < CRITICAL_MOISTURE,
        },
        MeterBar {
            label: if snapshot.archetype.danger_is_lethal() {
                "PROXIMITY"
            } else {
                "LOCK PRESSURE"
            },
            fill: snapshot.danger.fraction(),
            color: palette::RED,
            critical: snapshot.danger.fraction() > 0.8,
        },
        MeterBar {
            label: match snapshot.goal {
                LevelGoal::Survive(_) => "TIME",
                LevelGoal::Progress => "PROGRESS",
            },
            fill: snapshot.completion(),
            color: palette::GREEN,
            critical: false,
        },
    ];
    if snapshot.archetype == Archetype::Reflection {
        bars.push(MeterBar {
            label: "PANIC",
            fill: snapshot.panic.fraction(),
            color: palette::AMBER,
            critical: snapshot.penalty_remaining.is_some(),
        });
    }
    bars
}

/// Random camera offset for the provided shake intensity in pixels.
pub fn shake_offset<R>(intensity: f32, rng: &mut R) -> Vec2
where
    R: Rng + ?Sized,
{
    if !intensity.is_finite() || intensity <= 0.0 {
        return Vec2::ZERO;
    }
    let reach = intensity / 2.0;
    Vec2::new(
        rng.gen_range(-reach..=reach),
        rng.gen_range(-reach..=reach),
    )
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene shown before the first update.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Mnemosyne scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and replaces the scene before it is
    /// drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameTiming + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemosyne_core::{Meter, Overlay};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn snapshot(phase: Phase, archetype: Archetype) -> SessionSnapshot {
        SessionSnapshot {
            phase,
            level_index: 0,
            level_count: 6,
            archetype,
            level_title: "SEQUENCE_01: APPROACH".to_owned(),
            goal: LevelGoal::Progress,
            eyes_closed: false,
            moisture: Meter::full(),
            danger: Meter::empty(),
            progress: Meter::from_units(40),
            panic: Meter::empty(),
            entity_mode: EntityMode::Idle,
            level_elapsed: Duration::ZERO,
            lock: None,
            penalty_remaining: None,
            overlay: None,
            shake: 0.0,
            cutscene_stage: None,
            failure_log: Vec::new(),
        }
    }

    fn composer() -> SceneComposer<ChaCha8Rng> {
        SceneComposer::new(ChaCha8Rng::seed_from_u64(1))
    }

    #[test]
    fn frame_input_orders_release_before_press() {
        let input = FrameInput {
            eyes_pressed: true,
            eyes_released: true,
            confirm: true,
            keys: vec!['q'],
        };
        assert_eq!(
            input.into_inputs(),
            vec![
                InputEvent::EyeUp,
                InputEvent::EyeDown,
                InputEvent::Confirm,
                InputEvent::Key('q'),
            ]
        );
        assert!(FrameInput::default().is_empty());
    }

    #[test]
    fn open_eyes_in_the_void_are_seen() {
        let mut void = snapshot(Phase::Playing, Archetype::Void);
        let scene = composer().compose(&void);
        assert!(scene.alert);
        assert_eq!(scene.caption, "IT SEES YOU");

        void.eyes_closed = true;
        let scene = composer().compose(&void);
        assert!(!scene.alert);
        assert_eq!(scene.caption, "");
    }

    #[test]
    fn upload_lock_shows_repair_prompt() {
        let mut upload = snapshot(Phase::Playing, Archetype::Upload);
        upload.lock = Some('R');
        let scene = composer().compose(&upload);
        assert_eq!(scene.repair_prompt, Some('R'));
        assert!(scene.alert);
        assert_eq!(scene.caption, "LINK LOCKED. PRESS [R]");
        assert_eq!(scene.meters[1].label, "LOCK PRESSURE");
        assert!((scene.meters[2].fill - 0.4).abs() < 1e-6);
    }

    #[test]
    fn reflection_adds_panic_meter() {
        let mut mirror = snapshot(Phase::Playing, Archetype::Reflection);
        mirror.entity_mode = EntityMode::Watching;
        mirror.penalty_remaining = Some(Duration::from_millis(500));
        let scene = composer().compose(&mirror);
        assert_eq!(scene.meters.len(), 4);
        assert!(scene.eyes_forced_open);
        assert!(scene.caption.starts_with("PANIC"));
    }

    #[test]
    fn closed_eyes_and_cutscene_darken_the_frame() {
        let mut closed = snapshot(Phase::Playing, Archetype::Approach);
        closed.eyes_closed = true;
        assert_eq!(composer().compose(&closed).blackout, CLOSED_EYES_BLACKOUT);

        let mut finale = snapshot(Phase::Cutscene, Archetype::Origin);
        finale.cutscene_stage = Some(CutsceneStage::Blackout);
        let scene = composer().compose(&finale);
        assert_eq!(scene.blackout, 1.0);
        assert!(scene.meters.is_empty());
    }

    #[test]
    fn overlays_and_shake_reach_the_scene() {
        let mut scared = snapshot(Phase::Playing, Archetype::Approach);
        scared.overlay = Some(Overlay {
            kind: OverlayKind::Phantom,
            remaining: Duration::from_millis(200),
        });
        scared.shake = 20.0;
        let scene = composer().compose(&scared);
        assert_eq!(scene.overlay, Some(OverlayKind::Phantom));
        assert!(scene.shake_offset.x.abs() <= 10.0);
        assert!(scene.shake_offset.y.abs() <= 10.0);
    }

    #[test]
    fn game_over_caption_names_the_cause() {
        let mut dead = snapshot(Phase::GameOver, Archetype::Approach);
        dead.failure_log.push("ENTITY CONTACT".to_owned());
        let scene = composer().compose(&dead);
        assert!(scene.caption.starts_with("ENTITY CONTACT"));
    }

    #[test]
    fn calm_shake_is_still() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(shake_offset(0.0, &mut rng), Vec2::ZERO);
        assert_eq!(shake_offset(f32::NAN, &mut rng), Vec2::ZERO);
    }
}
