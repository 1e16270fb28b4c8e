//! Window-less backend for smoke runs, demos, and CI.

use std::time::Duration;

use anyhow::Result as AnyResult;
use mnemosyne_core::{Archetype, Phase};

use crate::{FrameInput, FrameTiming, Presentation, RenderingBackend, Scene};

/// Frames the autopilot lingers on a screen before confirming it.
const CONFIRM_DELAY_FRAMES: u32 = 30;

/// Runs a fixed number of frames with a constant delta.
#[derive(Clone, Debug)]
pub struct HeadlessBackend {
    frames: u32,
    frame_dt: Duration,
    autopilot: Option<Autopilot>,
}

impl HeadlessBackend {
    /// Creates a backend producing `frames` frames of `frame_dt` each.
    #[must_use]
    pub const fn new(frames: u32, frame_dt: Duration) -> Self {
        Self {
            frames,
            frame_dt,
            autopilot: None,
        }
    }

    /// Lets an [`Autopilot`] supply input instead of idling.
    #[must_use]
    pub fn with_autopilot(mut self, autopilot: Autopilot) -> Self {
        self.autopilot = Some(autopilot);
        self
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameTiming + 'static,
    {
        let Self {
            frames,
            frame_dt,
            mut autopilot,
        } = self;
        let mut scene = presentation.scene;

        for _ in 0..frames {
            let input = autopilot
                .as_mut()
                .map_or_else(FrameInput::default, |pilot| pilot.next_input(&scene));
            let _ = update_scene(frame_dt, input, &mut scene);
        }

        Ok(())
    }
}

/// Plays the game from scenes alone, deterministically.
///
/// It confirms menus after a short pause, blinks when the eyes dry out, hides
/// from hostile entities, rests in the void until the entity backs off, and
/// types the key an upload lock asks for.
#[derive(Clone, Debug, Default)]
pub struct Autopilot {
    idle_frames: u32,
}

impl Autopilot {
    /// Creates an autopilot.
    #[must_use]
    pub const fn new() -> Self {
        Self { idle_frames: 0 }
    }

    /// Input for the frame that is about to be simulated.
    pub fn next_input(&mut self, scene: &Scene) -> FrameInput {
        match scene.phase {
            Phase::PreBoot | Phase::Boot | Phase::GameOver | Phase::Victory => {
                self.idle_frames += 1;
                if self.idle_frames < CONFIRM_DELAY_FRAMES {
                    return FrameInput::default();
                }
                self.idle_frames = 0;
                FrameInput {
                    confirm: true,
                    ..FrameInput::default()
                }
            }
            Phase::LevelIntro | Phase::Playing => {
                self.idle_frames = 0;
                let wanted = wants_eyes_closed(scene);
                FrameInput {
                    eyes_pressed: wanted && !scene.eyes_closed,
                    eyes_released: !wanted && scene.eyes_closed,
                    keys: scene.repair_prompt.into_iter().collect(),
                    ..FrameInput::default()
                }
            }
            Phase::Cutscene => {
                self.idle_frames = 0;
                FrameInput::default()
            }
        }
    }
}

fn wants_eyes_closed(scene: &Scene) -> bool {
    let thirsty = if scene.eyes_closed {
        scene.moisture < 0.95
    } else {
        scene.moisture < 0.3
    };
    let hiding = scene.alert && matches!(scene.archetype, Archetype::Reflection | Archetype::Corruption);
    let seen = scene.archetype == Archetype::Void
        && if scene.eyes_closed {
            scene.danger > 0.05
        } else {
            scene.danger > 0.6
        };
    let cornered =
        matches!(scene.archetype, Archetype::Approach | Archetype::Origin) && scene.danger > 0.7;
    (thirsty || hiding || seen) && !cornered
}
