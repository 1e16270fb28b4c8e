use std::time::Duration;

use mnemosyne_core::{Archetype, LevelDefinition, LevelGoal};
use thiserror::Error;

/// Reasons a custom level table is rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelTableError {
    /// The table contains no level.
    #[error("level table is empty")]
    Empty,
    /// A survival level would complete on its first step.
    #[error("level {index} has a zero-length survival goal")]
    ZeroDuration {
        /// Index of the offending level.
        index: usize,
    },
}

/// Ordered, immutable campaign of levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelTable {
    levels: Vec<LevelDefinition>,
}

impl LevelTable {
    /// Validates and wraps a custom list of levels.
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, LevelTableError> {
        if levels.is_empty() {
            return Err(LevelTableError::Empty);
        }
        if let Some(index) = levels
            .iter()
            .position(|level| level.goal == LevelGoal::Survive(Duration::ZERO))
        {
            return Err(LevelTableError::ZeroDuration { index });
        }
        Ok(Self { levels })
    }

    /// The six-level campaign shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            levels: vec![
                LevelDefinition::new(
                    Archetype::Approach,
                    LevelGoal::Survive(Duration::from_secs(20)),
                    "SEQUENCE_01: APPROACH",
                ),
                LevelDefinition::new(
                    Archetype::Upload,
                    LevelGoal::Progress,
                    "SEQUENCE_02: UPLOAD",
                ),
                LevelDefinition::new(
                    Archetype::Reflection,
                    LevelGoal::Survive(Duration::from_secs(25)),
                    "SEQUENCE_03: REFLECTION",
                ),
                LevelDefinition::new(Archetype::Void, LevelGoal::Progress, "SEQUENCE_04: THE VOID"),
                LevelDefinition::new(
                    Archetype::Corruption,
                    LevelGoal::Progress,
                    "SEQUENCE_05: ARCHIVE",
                ),
                LevelDefinition::new(Archetype::Origin, LevelGoal::Progress, "SEQUENCE_06: CORE"),
            ],
        }
    }

    /// Number of levels in the campaign.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always `false`; tables are validated non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Definition of the level at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range; the session never indexes past the last level.
    #[must_use]
    pub fn level(&self, index: usize) -> &LevelDefinition {
        &self.levels[index]
    }

    /// Iterates over the levels in campaign order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter()
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}
