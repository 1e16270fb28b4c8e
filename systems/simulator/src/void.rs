//! Basement rules: the exit is only found by looking, and looking draws the entity in.

use mnemosyne_core::FailureCause;

use crate::{LevelState, VoidTuning};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Void;

impl Void {
    pub(crate) fn step(&self, state: &mut LevelState, tuning: &VoidTuning) -> Option<FailureCause> {
        let meters = &mut state.meters;
        if state.eyes_closed {
            meters.danger.lower(tuning.closed_retreat);
        } else {
            meters.progress.raise(tuning.search_rate);
            meters.danger.raise(tuning.open_advance);
        }

        meters.danger.is_full().then_some(FailureCause::Seen)
    }
}
