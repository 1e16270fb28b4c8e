//! Corridor rules: the entity only moves while it is not being watched.

use mnemosyne_core::FailureCause;
use rand::Rng;

use crate::{roll, ApproachTuning, LevelState};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Approach;

impl Approach {
    pub(crate) fn step<R>(
        &self,
        state: &mut LevelState,
        tuning: &ApproachTuning,
        rng: &mut R,
    ) -> Option<FailureCause>
    where
        R: Rng,
    {
        if state.eyes_closed {
            state.meters.danger.raise(tuning.closed_advance);
        } else if roll(rng, tuning.creep_chance) {
            state.meters.danger.raise(tuning.creep);
        }

        state.meters.danger.is_full().then_some(FailureCause::Touched)
    }
}
