//! Archive rules: data can only be recovered while the entity sleeps.

use mnemosyne_core::{AudioCue, EntityMode, Event, FailureCause};
use rand::Rng;
use std::time::Duration;

use crate::{roll, CorruptionTuning, LevelState};

const WAKE_BURST: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug)]
pub(crate) struct Corruption;

impl Corruption {
    pub(crate) fn step<R>(
        &self,
        state: &mut LevelState,
        tuning: &CorruptionTuning,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> Option<FailureCause>
    where
        R: Rng,
    {
        if roll(rng, tuning.toggle_chance) {
            state.entity_mode = match state.entity_mode {
                EntityMode::Danger => EntityMode::Safe,
                _ => EntityMode::Danger,
            };
            out.push(Event::EntityShifted {
                mode: state.entity_mode,
            });
            if state.entity_mode == EntityMode::Danger {
                out.push(Event::Cue(AudioCue::StaticBurst {
                    duration: WAKE_BURST,
                }));
            }
        }

        let meters = &mut state.meters;
        if state.entity_mode == EntityMode::Danger {
            if state.eyes_closed {
                meters.danger.lower(tuning.closed_retreat);
            } else {
                meters.danger.raise(tuning.exposed_advance);
            }
        } else {
            meters.danger.lower(tuning.dormant_retreat);
            if !state.eyes_closed {
                meters.progress.raise(tuning.recovery_rate);
            }
        }

        meters.danger.is_full().then_some(FailureCause::Corrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::Corruption;
    use crate::{CorruptionTuning, LevelState, Meters};
    use mnemosyne_core::{Archetype, EntityMode, LevelGoal};
    use rand::rngs::mock::StepRng;
    use std::time::Duration;

    fn state(mode: EntityMode, eyes_closed: bool) -> LevelState {
        LevelState {
            index: 3,
            archetype: Archetype::Corruption,
            goal: LevelGoal::Progress,
            eyes_closed,
            meters: Meters::fresh(),
            entity_mode: mode,
            elapsed: Duration::ZERO,
        }
    }

    fn calm() -> CorruptionTuning {
        CorruptionTuning {
            toggle_chance: 0.0,
            ..CorruptionTuning::default()
        }
    }

    #[test]
    fn dormant_entity_lets_open_eyes_recover_data() {
        let mut state = state(EntityMode::Safe, false);
        let mut events = Vec::new();
        let death = Corruption.step(&mut state, &calm(), &mut StepRng::new(0, 1), &mut events);
        assert_eq!(death, None);
        assert_eq!(state.meters.progress.milli(), 500);
        assert!(events.is_empty());
    }

    #[test]
    fn hostile_entity_punishes_open_eyes() {
        let mut state = state(EntityMode::Danger, false);
        let mut events = Vec::new();
        let _ = Corruption.step(&mut state, &calm(), &mut StepRng::new(0, 1), &mut events);
        assert_eq!(state.meters.danger.milli(), 3_000);
        assert!(state.meters.progress.is_empty());
    }

    #[test]
    fn toggling_into_danger_emits_a_shift() {
        let mut state = state(EntityMode::Safe, true);
        let tuning = CorruptionTuning {
            toggle_chance: 1.0,
            ..CorruptionTuning::default()
        };
        let mut events = Vec::new();
        let _ = Corruption.step(&mut state, &tuning, &mut StepRng::new(0, 1), &mut events);
        assert_eq!(state.entity_mode, EntityMode::Danger);
        assert!(events.contains(&mnemosyne_core::Event::EntityShifted {
            mode: EntityMode::Danger
        }));
    }
}
