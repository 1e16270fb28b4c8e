//! Mirror rules: close the eyes while the reflection watches, but not for too long.

use std::time::Duration;

use mnemosyne_core::{AudioCue, EntityMode, Event, FailureCause, Meter, FIXED_STEP};
use rand::Rng;

use crate::{roll, LevelState, ReflectionTuning};

const OVERFLOW_BURST: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, Default)]
pub(crate) struct Reflection {
    penalty: Option<Duration>,
}

impl Reflection {
    pub(crate) const fn penalty(&self) -> Option<Duration> {
        self.penalty
    }

    pub(crate) fn step<R>(
        &mut self,
        state: &mut LevelState,
        tuning: &ReflectionTuning,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> Option<FailureCause>
    where
        R: Rng,
    {
        let mut lifted = false;
        if let Some(remaining) = self.penalty {
            let remaining = remaining.saturating_sub(FIXED_STEP);
            if remaining.is_zero() {
                self.penalty = None;
                state.meters.panic = Meter::empty();
                out.push(Event::PenaltyLifted);
                lifted = true;
            } else {
                self.penalty = Some(remaining);
            }
        }

        if roll(rng, tuning.toggle_chance) {
            state.entity_mode = match state.entity_mode {
                EntityMode::Watching => EntityMode::Idle,
                _ => EntityMode::Watching,
            };
            out.push(Event::EntityShifted {
                mode: state.entity_mode,
            });
            if state.entity_mode == EntityMode::Watching {
                out.push(Event::Cue(AudioCue::Whisper));
            }
            if roll(rng, tuning.phantom_chance) {
                out.push(Event::PhantomRequested);
            }
        }

        let watching = state.entity_mode == EntityMode::Watching;
        let meters = &mut state.meters;
        match (watching, state.eyes_closed) {
            (true, false) => meters.danger.raise(tuning.watched_advance),
            (true, true) => meters.danger.lower(tuning.closed_retreat),
            (false, _) => meters.danger.lower(tuning.idle_retreat),
        }

        // Panic stays at zero for the step the penalty lifts.
        if self.penalty.is_none() && !lifted {
            if state.eyes_closed {
                meters.panic.raise(tuning.closed_panic);
            } else if watching {
                meters.panic.raise(tuning.watched_panic);
            } else {
                meters.panic.lower(tuning.calm_relief);
            }

            if meters.panic.is_full() {
                self.penalty = Some(tuning.penalty);
                log::debug!("panic overflow, eyes forced open for {:?}", tuning.penalty);
                out.push(Event::PanicOverflow);
                if state.eyes_closed {
                    state.eyes_closed = false;
                    out.push(Event::EyesChanged { closed: false });
                }
                out.push(Event::Cue(AudioCue::StaticBurst {
                    duration: OVERFLOW_BURST,
                }));
            }
        }

        state
            .meters
            .danger
            .is_full()
            .then_some(FailureCause::Replaced)
    }
}
