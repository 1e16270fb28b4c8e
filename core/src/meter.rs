//! Fixed-point gauge used for every bounded session resource.

use serde::{Deserialize, Serialize};

/// Bounded gauge stored in thousandths of a unit.
///
/// A meter spans `0..=100` units. Every mutation saturates at both ends, so a
/// meter can never be observed outside its range. Fixed-point storage keeps
/// fixed-step trajectories bit-exact across runs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Meter(u32);

impl Meter {
    /// Number of stored steps per displayed unit.
    pub const MILLI_PER_UNIT: u32 = 1_000;

    /// Largest representable value, equal to 100 units.
    pub const MAX_MILLI: u32 = 100 * Self::MILLI_PER_UNIT;

    /// Empty meter.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Meter filled to 100 units.
    #[must_use]
    pub const fn full() -> Self {
        Self(Self::MAX_MILLI)
    }

    /// Creates a meter from thousandths of a unit, clamping to the valid range.
    #[must_use]
    pub const fn from_milli(milli: u32) -> Self {
        if milli > Self::MAX_MILLI {
            Self(Self::MAX_MILLI)
        } else {
            Self(milli)
        }
    }

    /// Creates a meter from whole units, clamping to the valid range.
    #[must_use]
    pub const fn from_units(units: u32) -> Self {
        Self::from_milli(units.saturating_mul(Self::MILLI_PER_UNIT))
    }

    /// Raw value in thousandths of a unit.
    #[must_use]
    pub const fn milli(self) -> u32 {
        self.0
    }

    /// Value in display units (`0.0..=100.0`).
    #[must_use]
    pub fn units(self) -> f32 {
        self.0 as f32 / Self::MILLI_PER_UNIT as f32
    }

    /// Value normalised to `0.0..=1.0`.
    #[must_use]
    pub fn fraction(self) -> f32 {
        self.0 as f32 / Self::MAX_MILLI as f32
    }

    /// Complement of this meter (`100 - value`).
    #[must_use]
    pub const fn inverse(self) -> Self {
        Self(Self::MAX_MILLI - self.0)
    }

    /// Reports whether the meter reached its ceiling.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.0 >= Self::MAX_MILLI
    }

    /// Reports whether the meter reached its floor.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Adds `milli` thousandths, saturating at the ceiling.
    pub fn raise(&mut self, milli: u32) {
        self.0 = self.0.saturating_add(milli).min(Self::MAX_MILLI);
    }

    /// Removes `milli` thousandths, saturating at the floor.
    pub fn lower(&mut self, milli: u32) {
        self.0 = self.0.saturating_sub(milli);
    }
}

#[cfg(test)]
mod tests {
    use super::Meter;

    #[test]
    fn raise_saturates_at_ceiling() {
        let mut meter = Meter::from_units(99);
        meter.raise(5_000);
        assert!(meter.is_full());
        assert_eq!(meter.milli(), Meter::MAX_MILLI);
    }

    #[test]
    fn lower_saturates_at_floor() {
        let mut meter = Meter::from_milli(300);
        meter.lower(400);
        assert!(meter.is_empty());
    }

    #[test]
    fn construction_clamps_out_of_range_values() {
        assert_eq!(Meter::from_milli(u32::MAX), Meter::full());
        assert_eq!(Meter::from_units(250), Meter::full());
    }

    #[test]
    fn inverse_mirrors_value() {
        let meter = Meter::from_units(30);
        assert_eq!(meter.inverse(), Meter::from_units(70));
        assert!((meter.fraction() - 0.3).abs() < 1e-6);
    }
}
