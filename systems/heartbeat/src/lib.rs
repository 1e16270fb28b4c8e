#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Heartbeat pacing derived from the danger, dryness and panic meters.
//!
//! The audio engine only knows how to play a single pulse. This system owns
//! the repeating timer: it converts the meters into beats per minute and emits
//! a [`Pulse`] whenever enough simulated time has accumulated.

use std::time::Duration;

use mnemosyne_core::Meter;

/// Tuning knobs for the heartbeat pacing.
#[derive(Clone, Copy, Debug)]
pub struct HeartbeatTuning {
    /// Beats per minute with every meter at rest.
    pub resting_bpm: f32,
    /// Beats added per unit of danger.
    pub danger_weight: f32,
    /// Beats added per unit of dryness.
    pub dryness_weight: f32,
    /// Beats added per unit of panic.
    pub panic_weight: f32,
    /// Rates above this threshold produce fast pulses.
    pub fast_above_bpm: f32,
}

impl Default for HeartbeatTuning {
    fn default() -> Self {
        Self {
            resting_bpm: 60.0,
            danger_weight: 1.0,
            dryness_weight: 0.5,
            panic_weight: 0.25,
            fast_above_bpm: 120.0,
        }
    }
}

impl HeartbeatTuning {
    /// Computes the heart rate for the provided meters.
    #[must_use]
    pub fn beats_per_minute(&self, danger: Meter, dryness: Meter, panic: Meter) -> f32 {
        let bpm = self.resting_bpm
            + danger.units() * self.danger_weight
            + dryness.units() * self.dryness_weight
            + panic.units() * self.panic_weight;
        bpm.max(1.0)
    }
}

/// Single heartbeat to be played by the audio layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pulse {
    /// Whether the heart is racing.
    pub fast: bool,
}

/// Repeating heartbeat timer advanced by the fixed-step clock.
#[derive(Clone, Debug)]
pub struct Heartbeat {
    tuning: HeartbeatTuning,
    accumulator: Duration,
}

impl Heartbeat {
    /// Creates a heartbeat timer with an empty accumulator.
    #[must_use]
    pub const fn new(tuning: HeartbeatTuning) -> Self {
        Self {
            tuning,
            accumulator: Duration::ZERO,
        }
    }

    /// Tuning the timer was built with.
    #[must_use]
    pub const fn tuning(&self) -> &HeartbeatTuning {
        &self.tuning
    }

    /// Clears accumulated time so the next pulse waits a full interval.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    /// Advances the timer by `step` at the provided heart rate.
    ///
    /// At most one pulse is produced per call; the remainder carries over.
    pub fn handle(&mut self, step: Duration, bpm: f32) -> Option<Pulse> {
        let bpm = if bpm.is_finite() { bpm.max(1.0) } else { 1.0 };
        let interval = Duration::from_secs_f32(60.0 / bpm);
        self.accumulator += step;
        if self.accumulator < interval {
            return None;
        }
        self.accumulator = (self.accumulator - interval).min(interval);
        Some(Pulse {
            fast: bpm > self.tuning.fast_above_bpm,
        })
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new(HeartbeatTuning::default())
    }
}
