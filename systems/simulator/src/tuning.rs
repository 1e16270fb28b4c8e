//! Balance knobs for every archetype.
//!
//! Amounts are expressed in thousandths of a meter unit per fixed step, so
//! `3_500` restores 3.5 units every 50ms. Chances are per-step probabilities.

use std::time::Duration;

/// Aggregated tuning knobs controlling every adjustable aspect of the simulator.
#[derive(Clone, Debug, Default)]
pub struct Tuning {
    /// Shared moisture rule applied to every archetype.
    pub moisture: MoistureTuning,
    /// Corridor rule set.
    pub approach: ApproachTuning,
    /// Terminal rule set.
    pub upload: UploadTuning,
    /// Mirror rule set.
    pub reflection: ReflectionTuning,
    /// Basement rule set.
    pub void: VoidTuning,
    /// Archive rule set.
    pub corruption: CorruptionTuning,
    /// Core rule set.
    pub origin: OriginTuning,
}

/// Moisture recovery and decay.
#[derive(Clone, Debug)]
pub struct MoistureTuning {
    /// Moisture regained per step while the eyes are closed.
    pub recovery: u32,
    /// Moisture lost per step with open eyes on the first level.
    pub base_decay: u32,
    /// Additional decay per level index; later levels dry out faster.
    pub decay_per_level: u32,
}

impl Default for MoistureTuning {
    fn default() -> Self {
        Self {
            recovery: 3_500,
            base_decay: 400,
            decay_per_level: 100,
        }
    }
}

impl MoistureTuning {
    /// Moisture lost per open-eyed step on the level at `index`.
    #[must_use]
    pub fn decay_for_level(&self, index: usize) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.base_decay
            .saturating_add(self.decay_per_level.saturating_mul(index))
    }
}

/// Corridor: the entity advances while the player is not looking.
#[derive(Clone, Debug)]
pub struct ApproachTuning {
    /// Danger added per step with closed eyes.
    pub closed_advance: u32,
    /// Chance per open-eyed step that the entity still creeps forward.
    pub creep_chance: f64,
    /// Danger added by a single creep.
    pub creep: u32,
}

impl Default for ApproachTuning {
    fn default() -> Self {
        Self {
            closed_advance: 2_000,
            creep_chance: 0.05,
            creep: 500,
        }
    }
}

/// Terminal: progress uploads while the eyes are open and the link is intact.
#[derive(Clone, Debug)]
pub struct UploadTuning {
    /// Progress gained per open-eyed step while unlocked.
    pub upload_rate: u32,
    /// Progress lost per closed-eyed step while unlocked.
    pub closed_drain: u32,
    /// Chance per step that the link locks up.
    pub lock_chance: f64,
    /// Progress lost per step while locked, whatever the eye state.
    pub locked_drain: u32,
    /// Danger added per locked step; drives the tension tone only.
    pub locked_pressure: u32,
    /// Danger removed per unlocked step.
    pub pressure_relief: u32,
    /// Progress removed by each wrong repair key.
    pub wrong_key_penalty: u32,
    /// Chance per step of a cosmetic screen glitch.
    pub glitch_chance: f64,
    /// Keys a lock may demand.
    pub repair_keys: Vec<char>,
}

impl Default for UploadTuning {
    fn default() -> Self {
        Self {
            upload_rate: 400,
            closed_drain: 500,
            lock_chance: 0.01,
            locked_drain: 300,
            locked_pressure: 1_500,
            pressure_relief: 2_500,
            wrong_key_penalty: 5_000,
            glitch_chance: 0.02,
            repair_keys: vec!['Q', 'W', 'E', 'R', 'A', 'S', 'D', 'F'],
        }
    }
}

/// Mirror: the reflection punishes open eyes while it watches.
#[derive(Clone, Debug)]
pub struct ReflectionTuning {
    /// Chance per step that the reflection toggles between idle and watching.
    pub toggle_chance: f64,
    /// Chance that a toggle also requests a phantom scare.
    pub phantom_chance: f64,
    /// Danger added per open-eyed step while watched.
    pub watched_advance: u32,
    /// Danger removed per closed-eyed step while watched.
    pub closed_retreat: u32,
    /// Danger removed per step while the reflection is idle.
    pub idle_retreat: u32,
    /// Panic added per open-eyed step while watched.
    pub watched_panic: u32,
    /// Panic added per closed-eyed step, watched or not.
    pub closed_panic: u32,
    /// Panic removed per open-eyed step while the reflection is idle.
    pub calm_relief: u32,
    /// Length of the forced-eyes-open window after panic overflows.
    pub penalty: Duration,
}

impl Default for ReflectionTuning {
    fn default() -> Self {
        Self {
            toggle_chance: 0.02,
            phantom_chance: 0.5,
            watched_advance: 4_000,
            closed_retreat: 1_000,
            idle_retreat: 200,
            watched_panic: 1_000,
            closed_panic: 600,
            calm_relief: 400,
            penalty: Duration::from_millis(2_500),
        }
    }
}

/// Basement: the exit is found by looking, which the entity notices.
#[derive(Clone, Debug)]
pub struct VoidTuning {
    /// Progress gained per open-eyed step.
    pub search_rate: u32,
    /// Danger added per open-eyed step.
    pub open_advance: u32,
    /// Danger removed per closed-eyed step.
    pub closed_retreat: u32,
}

impl Default for VoidTuning {
    fn default() -> Self {
        Self {
            search_rate: 200,
            open_advance: 1_800,
            closed_retreat: 800,
        }
    }
}

/// Archive: data is only recovered while the entity is dormant.
#[derive(Clone, Debug)]
pub struct CorruptionTuning {
    /// Chance per step that the entity toggles between safe and danger.
    pub toggle_chance: f64,
    /// Danger added per open-eyed step while hostile.
    pub exposed_advance: u32,
    /// Danger removed per closed-eyed step while hostile.
    pub closed_retreat: u32,
    /// Danger removed per step while dormant.
    pub dormant_retreat: u32,
    /// Progress gained per open-eyed step while dormant.
    pub recovery_rate: u32,
}

impl Default for CorruptionTuning {
    fn default() -> Self {
        Self {
            toggle_chance: 0.02,
            exposed_advance: 3_000,
            closed_retreat: 1_000,
            dormant_retreat: 200,
            recovery_rate: 500,
        }
    }
}

/// Core: open eyes hold the entity back, closed eyes let it in.
#[derive(Clone, Debug)]
pub struct OriginTuning {
    /// Progress gained per open-eyed step.
    pub open_progress: u32,
    /// Danger removed per open-eyed step.
    pub open_retreat: u32,
    /// Danger added per closed-eyed step.
    pub closed_advance: u32,
}

impl Default for OriginTuning {
    fn default() -> Self {
        Self {
            open_progress: 200,
            open_retreat: 800,
            closed_advance: 1_800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MoistureTuning;

    #[test]
    fn decay_scales_with_level_index() {
        let tuning = MoistureTuning::default();
        assert_eq!(tuning.decay_for_level(0), 400);
        assert_eq!(tuning.decay_for_level(4), 800);
    }

    #[test]
    fn decay_saturates_for_absurd_indices() {
        let tuning = MoistureTuning::default();
        assert_eq!(tuning.decay_for_level(usize::MAX), u32::MAX);
    }
}
