use std::time::Duration;

use mnemosyne_system_heartbeat::HeartbeatTuning;
use mnemosyne_system_scheduler::SchedulerTuning;
use mnemosyne_system_simulator::Tuning;

/// Seed used when the host does not provide one.
pub const DEFAULT_SEED: u64 = 0x6d6e_656d_6f73_796e;

/// Configuration parameters required to construct a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Seed of the single random stream driving the session.
    pub seed: u64,
    /// How long each level card stays up before play starts.
    pub intro_delay: Duration,
    /// Fixed steps between two tension-tone updates.
    pub proximity_interval_steps: u32,
    /// Whether the last level plays the finale before victory.
    pub finale: bool,
    /// Archetype balance.
    pub simulator: Tuning,
    /// Phantom and flash pacing.
    pub scheduler: SchedulerTuning,
    /// Heart-rate pacing.
    pub heartbeat: HeartbeatTuning,
}

impl SessionConfig {
    /// Creates the default configuration with the provided seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            intro_delay: Duration::from_secs(4),
            proximity_interval_steps: 2,
            finale: true,
            simulator: Tuning::default(),
            scheduler: SchedulerTuning::default(),
            heartbeat: HeartbeatTuning::default(),
        }
    }
}
