//! Core rules: staring holds the entity back and fills the progress bar.

use mnemosyne_core::FailureCause;

use crate::{LevelState, OriginTuning};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Origin;

impl Origin {
    pub(crate) fn step(&self, state: &mut LevelState, tuning: &OriginTuning) -> Option<FailureCause> {
        let meters = &mut state.meters;
        if state.eyes_closed {
            meters.danger.raise(tuning.closed_advance);
        } else {
            meters.danger.lower(tuning.open_retreat);
            meters.progress.raise(tuning.open_progress);
        }

        meters.danger.is_full().then_some(FailureCause::Absorbed)
    }
}
