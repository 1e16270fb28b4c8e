//! Terminal rules: keep watching the upload and repair the link when it locks.

use mnemosyne_core::{AudioCue, Event, FailureCause};
use rand::Rng;

use crate::{roll, KeyOutcome, LevelState, UploadTuning};

#[derive(Clone, Debug, Default)]
pub(crate) struct Upload {
    lock: Option<char>,
}

impl Upload {
    pub(crate) const fn lock(&self) -> Option<char> {
        self.lock
    }

    pub(crate) fn engage(&mut self, key: char, out: &mut Vec<Event>) -> bool {
        if self.lock.is_some() {
            return false;
        }
        self.lock = Some(key);
        log::debug!("upload locked, repair key {key}");
        out.push(Event::LockEngaged { key });
        out.push(Event::Cue(AudioCue::DigitalError));
        true
    }

    pub(crate) fn handle_key(
        &mut self,
        key: char,
        state: &mut LevelState,
        tuning: &UploadTuning,
        out: &mut Vec<Event>,
    ) -> KeyOutcome {
        let Some(required) = self.lock else {
            return KeyOutcome::Ignored;
        };

        if key.eq_ignore_ascii_case(&required) {
            self.lock = None;
            out.push(Event::LockCleared);
            out.push(Event::Cue(AudioCue::RepairSuccess));
            KeyOutcome::Repaired
        } else {
            state.meters.progress.lower(tuning.wrong_key_penalty);
            out.push(Event::RepairRejected { key });
            out.push(Event::Cue(AudioCue::DigitalError));
            KeyOutcome::Rejected
        }
    }

    /// Upload danger only tracks lock pressure; it never kills.
    pub(crate) fn step<R>(
        &mut self,
        state: &mut LevelState,
        tuning: &UploadTuning,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> Option<FailureCause>
    where
        R: Rng,
    {
        if self.lock.is_none() && !tuning.repair_keys.is_empty() && roll(rng, tuning.lock_chance)
        {
            let key = tuning.repair_keys[rng.gen_range(0..tuning.repair_keys.len())];
            let _ = self.engage(key.to_ascii_uppercase(), out);
        }

        let meters = &mut state.meters;
        if self.lock.is_some() {
            meters.progress.lower(tuning.locked_drain);
            meters.danger.raise(tuning.locked_pressure);
        } else {
            meters.danger.lower(tuning.pressure_relief);
            if state.eyes_closed {
                meters.progress.lower(tuning.closed_drain);
            } else {
                meters.progress.raise(tuning.upload_rate);
            }
        }

        if roll(rng, tuning.glitch_chance) {
            out.push(Event::Glitch);
            out.push(Event::Cue(AudioCue::DigitalError));
        }

        None
    }
}
