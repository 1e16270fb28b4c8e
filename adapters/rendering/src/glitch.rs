//! Corrupted-text effect used for headlines and warnings.

use rand::Rng;

/// Glyphs substituted into scrambled text.
pub const GLITCH_GLYPHS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+-=[]{}|;:,.<>?/øµ¶§";

/// Probability that an individual character is replaced once a line glitches.
pub const CHARACTER_SCRAMBLE_CHANCE: f64 = 0.3;

/// Transforms text into a possibly corrupted rendition.
pub trait TextGlitch {
    /// Returns `text`, scrambled with probability `intensity` in `0.0..=1.0`.
    fn glitch(&mut self, text: &str, intensity: f32) -> String;
}

/// Random character scrambler.
///
/// Spaces always survive so word boundaries stay readable.
#[derive(Clone, Debug)]
pub struct Scrambler<R> {
    rng: R,
    glyphs: Vec<char>,
}

impl<R: Rng> Scrambler<R> {
    /// Creates a scrambler drawing from `rng`.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            glyphs: GLITCH_GLYPHS.chars().collect(),
        }
    }

    /// Random source shared with other presentation effects.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    fn scramble(&mut self, text: &str) -> String {
        text.chars()
            .map(|character| {
                if character == ' ' || !self.rng.gen_bool(CHARACTER_SCRAMBLE_CHANCE) {
                    character
                } else {
                    self.glyphs[self.rng.gen_range(0..self.glyphs.len())]
                }
            })
            .collect()
    }
}

impl<R: Rng> TextGlitch for Scrambler<R> {
    fn glitch(&mut self, text: &str, intensity: f32) -> String {
        let intensity = if intensity.is_finite() {
            f64::from(intensity).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.rng.gen_bool(intensity) {
            self.scramble(text)
        } else {
            text.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scrambler() -> Scrambler<ChaCha8Rng> {
        Scrambler::new(ChaCha8Rng::seed_from_u64(99))
    }

    #[test]
    fn zero_intensity_leaves_text_alone() {
        let mut glitch = scrambler();
        for _ in 0..100 {
            assert_eq!(glitch.glitch("SEQUENCE_01: APPROACH", 0.0), "SEQUENCE_01: APPROACH");
        }
    }

    #[test]
    fn full_intensity_keeps_length_and_spaces() {
        let mut glitch = scrambler();
        let text = "WAKE UP  NOW";
        let mut changed = false;
        for _ in 0..50 {
            let output = glitch.glitch(text, 1.0);
            assert_eq!(output.chars().count(), text.chars().count());
            for (before, after) in text.chars().zip(output.chars()) {
                if before == ' ' {
                    assert_eq!(after, ' ');
                } else if before != after {
                    assert!(GLITCH_GLYPHS.contains(after));
                }
            }
            changed |= output != text;
        }
        assert!(changed);
    }

    #[test]
    fn invalid_intensity_is_treated_as_calm() {
        let mut glitch = scrambler();
        assert_eq!(glitch.glitch("DON'T LOOK", f32::NAN), "DON'T LOOK");
        assert_eq!(glitch.glitch("DON'T LOOK", -3.0), "DON'T LOOK");
    }
}
