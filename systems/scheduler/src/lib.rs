#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random event scheduler driving phantom scares and subliminal flashes.
//!
//! Both generators keep a "next fire time" on the same fixed-step clock that
//! drives the simulator. Firing always reschedules the generator, whether or
//! not the event passed its chance roll. Stopping the scheduler cancels both
//! generators and bumps the generation so stale fires can be recognised.

use std::time::Duration;

use mnemosyne_core::Meter;
use rand::Rng;

const MAX_RISK: f32 = 100.0;

/// Tuning knobs for the phantom jump-scare generator.
#[derive(Clone, Debug)]
pub struct PhantomTuning {
    /// Shortest possible delay between two rolls.
    pub min_delay: Duration,
    /// Random window added on top of `min_delay` at zero risk.
    pub base_window: Duration,
    /// Window removed per unit of risk.
    pub risk_shrink: Duration,
    /// The window never shrinks below this span.
    pub min_window: Duration,
    /// Chance that a roll turns into a scare at zero risk.
    pub base_chance: f64,
    /// Chance added per unit of risk.
    pub risk_chance: f64,
    /// Upper bound for the scare chance.
    pub max_chance: f64,
    /// Shortest overlay display time.
    pub overlay_min: Duration,
    /// Longest overlay display time.
    pub overlay_max: Duration,
}

impl Default for PhantomTuning {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(3_000),
            base_window: Duration::from_millis(15_000),
            risk_shrink: Duration::from_millis(8_000),
            min_window: Duration::from_millis(1_000),
            base_chance: 0.4,
            risk_chance: 0.3,
            max_chance: 0.95,
            overlay_min: Duration::from_millis(150),
            overlay_max: Duration::from_millis(250),
        }
    }
}

/// Tuning knobs for the subliminal flash generator.
#[derive(Clone, Debug)]
pub struct FlashTuning {
    /// Shortest delay between two rolls.
    pub min_delay: Duration,
    /// Longest delay between two rolls.
    pub max_delay: Duration,
    /// Chance that a roll turns into a flash.
    pub chance: f64,
    /// Shortest flash.
    pub duration_min: Duration,
    /// Longest flash.
    pub duration_max: Duration,
}

impl Default for FlashTuning {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(30),
            chance: 0.3,
            duration_min: Duration::from_millis(80),
            duration_max: Duration::from_millis(130),
        }
    }
}

/// Aggregated scheduler tuning.
#[derive(Clone, Debug, Default)]
pub struct SchedulerTuning {
    /// Phantom generator knobs.
    pub phantom: PhantomTuning,
    /// Flash generator knobs.
    pub flash: FlashTuning,
    /// Weights combining the session state into a risk factor.
    pub risk: RiskWeights,
}

/// Weights applied by [`risk_factor`].
#[derive(Clone, Copy, Debug)]
pub struct RiskWeights {
    /// Risk per unit of dryness fraction.
    pub dryness: f32,
    /// Risk added per level index.
    pub per_level: f32,
    /// Risk per unit of panic fraction.
    pub panic: f32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            dryness: 1.0,
            per_level: 0.2,
            panic: 0.3,
        }
    }
}

/// Session values the phantom generator reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskInputs {
    /// Moisture deficit.
    pub dryness: Meter,
    /// Index of the level being played.
    pub level_index: usize,
    /// Reflection panic.
    pub panic: Meter,
}

/// Combines dryness, level depth and panic into a non-negative risk factor.
#[must_use]
pub fn risk_factor(weights: RiskWeights, inputs: RiskInputs) -> f32 {
    let depth = inputs.level_index as f32 * weights.per_level;
    let risk = inputs.dryness.fraction() * weights.dryness
        + depth
        + inputs.panic.fraction() * weights.panic;
    risk.max(0.0)
}

/// Visible event produced by a generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScheduledKind {
    /// Jump-scare overlay.
    Phantom {
        /// How long the overlay stays visible.
        overlay: Duration,
    },
    /// Subliminal flash.
    Flash {
        /// How long the flash stays visible.
        duration: Duration,
    },
}

/// Event fired by the scheduler, tagged with the generation that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fired {
    /// Generation active when the event fired.
    pub generation: u64,
    /// What fired.
    pub kind: ScheduledKind,
}

/// Phantom and flash generators sharing the simulation clock.
#[derive(Clone, Debug)]
pub struct RandomEventScheduler {
    tuning: SchedulerTuning,
    generation: u64,
    clock: Duration,
    next_phantom: Option<Duration>,
    next_flash: Option<Duration>,
}

impl RandomEventScheduler {
    /// Creates a stopped scheduler.
    #[must_use]
    pub fn new(tuning: SchedulerTuning) -> Self {
        Self {
            tuning,
            generation: 0,
            clock: Duration::ZERO,
            next_phantom: None,
            next_flash: None,
        }
    }

    /// Tuning the scheduler was built with.
    #[must_use]
    pub fn tuning(&self) -> &SchedulerTuning {
        &self.tuning
    }

    /// Generation of the current run; bumped by every start and stop.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports whether either generator is armed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.next_phantom.is_some() || self.next_flash.is_some()
    }

    /// Time until the phantom generator rolls, if armed.
    #[must_use]
    pub fn phantom_due_in(&self) -> Option<Duration> {
        self.next_phantom.map(|due| due.saturating_sub(self.clock))
    }

    /// Time until the flash generator rolls, if armed.
    #[must_use]
    pub fn flash_due_in(&self) -> Option<Duration> {
        self.next_flash.map(|due| due.saturating_sub(self.clock))
    }

    /// Arms both generators from a fresh clock, discarding anything pending.
    pub fn start<R>(&mut self, risk: f32, rng: &mut R)
    where
        R: Rng,
    {
        self.generation = self.generation.wrapping_add(1);
        self.clock = Duration::ZERO;
        self.next_phantom = Some(self.phantom_delay(risk, rng));
        self.next_flash = Some(self.flash_delay(rng));
        log::debug!("scheduler started, generation {}", self.generation);
    }

    /// Cancels both generators.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.generation = self.generation.wrapping_add(1);
        self.next_phantom = None;
        self.next_flash = None;
        log::debug!("scheduler stopped, generation {}", self.generation);
    }

    /// Advances the clock and appends every event whose roll succeeded.
    pub fn advance<R>(&mut self, step: Duration, risk: f32, rng: &mut R, out: &mut Vec<Fired>)
    where
        R: Rng,
    {
        if !self.is_running() {
            return;
        }
        self.clock += step;

        while let Some(due) = self.next_phantom.filter(|due| *due <= self.clock) {
            if roll(rng, self.phantom_chance(risk)) {
                let overlay = self.phantom_overlay(rng);
                out.push(self.fired(ScheduledKind::Phantom { overlay }));
            }
            self.next_phantom = Some(due + self.phantom_delay(risk, rng));
        }

        while let Some(due) = self.next_flash.filter(|due| *due <= self.clock) {
            if roll(rng, self.tuning.flash.chance) {
                let flash = &self.tuning.flash;
                let duration = uniform(rng, flash.duration_min, flash.duration_max);
                out.push(self.fired(ScheduledKind::Flash { duration }));
            }
            self.next_flash = Some(due + self.flash_delay(rng));
        }
    }

    /// Chance that a phantom roll turns into a scare at the provided risk.
    #[must_use]
    pub fn phantom_chance(&self, risk: f32) -> f64 {
        let phantom = &self.tuning.phantom;
        (phantom.base_chance + phantom.risk_chance * f64::from(risk)).min(phantom.max_chance)
    }

    /// Random window the phantom delay is drawn from at the provided risk.
    #[must_use]
    pub fn phantom_window(&self, risk: f32) -> Duration {
        let phantom = &self.tuning.phantom;
        let risk = if risk.is_finite() {
            risk.clamp(0.0, MAX_RISK)
        } else {
            0.0
        };
        let shrink = phantom.risk_shrink.mul_f32(risk);
        phantom
            .base_window
            .saturating_sub(shrink)
            .max(phantom.min_window)
    }

    /// Draws how long a phantom overlay stays visible.
    pub fn phantom_overlay<R>(&self, rng: &mut R) -> Duration
    where
        R: Rng,
    {
        let phantom = &self.tuning.phantom;
        uniform(rng, phantom.overlay_min, phantom.overlay_max)
    }

    fn phantom_delay<R>(&self, risk: f32, rng: &mut R) -> Duration
    where
        R: Rng,
    {
        let window = self.phantom_window(risk);
        let delay = self.tuning.phantom.min_delay + uniform(rng, Duration::ZERO, window);
        delay.max(Duration::from_millis(1))
    }

    fn flash_delay<R>(&self, rng: &mut R) -> Duration
    where
        R: Rng,
    {
        let flash = &self.tuning.flash;
        uniform(rng, flash.min_delay, flash.max_delay).max(Duration::from_millis(1))
    }

    fn fired(&self, kind: ScheduledKind) -> Fired {
        Fired {
            generation: self.generation,
            kind,
        }
    }
}

fn roll<R>(rng: &mut R, probability: f64) -> bool
where
    R: Rng,
{
    if probability.is_nan() {
        return false;
    }
    rng.gen_bool(probability.clamp(0.0, 1.0))
}

/// Draws a duration uniformly from `low..=high`, at millisecond resolution.
fn uniform<R>(rng: &mut R, low: Duration, high: Duration) -> Duration
where
    R: Rng,
{
    let low_ms = low.as_millis() as u64;
    let high_ms = high.as_millis() as u64;
    if high_ms <= low_ms {
        return low;
    }
    Duration::from_millis(rng.gen_range(low_ms..=high_ms))
}
