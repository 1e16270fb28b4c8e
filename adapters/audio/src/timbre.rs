//! Mapping from level state to the persistent tension voices.

use std::time::Duration;

use mnemosyne_core::Archetype;

use crate::{VoiceSpec, VoiceTarget, Waveform};

/// Number of persistent voices shaping the tension tone.
pub(crate) const TENSION_VOICES: usize = 3;

const SMOOTHING: Duration = Duration::from_millis(100);

/// Voices spawned once, silent, and retargeted on every proximity update.
pub(crate) fn tension_seed() -> [VoiceSpec; TENSION_VOICES] {
    [
        VoiceSpec::new(Waveform::Sawtooth, 50.0, 0.0),
        VoiceSpec::new(Waveform::Sine, 440.0, 0.0),
        VoiceSpec::new(Waveform::Sine, 660.0, 0.0),
    ]
}

/// Per-update modulation drawn by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Modulation {
    /// Uniform jitter in `0.0..1.0`.
    pub(crate) jitter: f32,
    /// Alternates on every update; drives pulsing layers.
    pub(crate) pulse: bool,
}

fn silent() -> VoiceTarget {
    VoiceTarget::smoothed(SMOOTHING).gain(0.0)
}

fn voice(waveform: Waveform, frequency: f32, gain: f32) -> VoiceTarget {
    VoiceTarget::smoothed(SMOOTHING)
        .waveform(waveform)
        .frequency(frequency)
        .gain(gain)
}

/// Targets for the tension voices at the provided normalised danger.
pub(crate) fn voicing(
    archetype: Archetype,
    danger: f32,
    alert: bool,
    modulation: Modulation,
) -> [VoiceTarget; TENSION_VOICES] {
    let n = if danger.is_finite() {
        danger.clamp(0.0, 1.0)
    } else {
        0.0
    };

    match archetype {
        // Rising sawtooth as the entity closes in.
        Archetype::Approach => [
            voice(Waveform::Sawtooth, 50.0 + n * 200.0, n * 0.4),
            silent(),
            silent(),
        ],
        // Digital whine dropping in pitch; a second, lower whine while locked.
        Archetype::Upload => {
            let whine = 10_000.0 - n * 5_000.0;
            let locked = if alert { 0.05 } else { 0.0 };
            [
                voice(Waveform::Square, whine, n * 0.1),
                voice(Waveform::Square, whine / 2.0, locked),
                silent(),
            ]
        }
        Archetype::Reflection => {
            let root = 440.0 + modulation.jitter * 50.0;
            let boost = if alert { 1.5 } else { 1.0 };
            [
                voice(Waveform::Sine, root, n * 0.25 * boost),
                voice(Waveform::Sine, root * 1.414, n * 0.15 * boost),
                voice(Waveform::Triangle, root * 1.5 + 3.0, n * 0.1 * boost),
            ]
        }
        // Low rumble that climbs and stutters as the entity closes in.
        Archetype::Void => {
            let rumble = 20.0 + n * 100.0;
            let stutter = if modulation.jitter > 0.8 {
                modulation.jitter * 50.0
            } else {
                0.0
            };
            [
                voice(Waveform::Sawtooth, rumble + stutter, n * 0.6),
                silent(),
                silent(),
            ]
        }
        Archetype::Corruption if alert => {
            let burst = if modulation.jitter > 0.5 { 0.2 + n * 0.4 } else { 0.05 };
            [
                voice(Waveform::Noise, 1_000.0, burst),
                voice(Waveform::Square, 80.0, 0.1 + n * 0.3),
                silent(),
            ]
        }
        Archetype::Corruption => [voice(Waveform::Sine, 220.0, 0.08), silent(), silent()],
        Archetype::Origin => {
            let sub = if modulation.pulse { 0.1 + n * 0.5 } else { 0.0 };
            [
                voice(Waveform::Sine, 3_000.0 + n * 2_000.0, 0.05 + n * 0.1),
                voice(Waveform::Sine, 40.0, sub),
                silent(),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STILL: Modulation = Modulation {
        jitter: 0.0,
        pulse: false,
    };

    #[test]
    fn approach_pitch_rises_with_danger() {
        let calm = voicing(Archetype::Approach, 0.0, false, STILL);
        let close = voicing(Archetype::Approach, 1.0, false, STILL);
        assert_eq!(calm[0].frequency, Some(50.0));
        assert_eq!(close[0].frequency, Some(250.0));
        assert_eq!(close[0].waveform, Some(Waveform::Sawtooth));
    }

    #[test]
    fn corruption_switches_timbre_with_entity_state() {
        let safe = voicing(Archetype::Corruption, 0.5, false, STILL);
        let hostile = voicing(Archetype::Corruption, 0.5, true, STILL);
        assert_eq!(safe[0].waveform, Some(Waveform::Sine));
        assert_eq!(hostile[0].waveform, Some(Waveform::Noise));
        assert_eq!(hostile[1].frequency, Some(80.0));
    }

    #[test]
    fn origin_sub_pulse_alternates() {
        let on = voicing(
            Archetype::Origin,
            0.2,
            false,
            Modulation {
                jitter: 0.0,
                pulse: true,
            },
        );
        let off = voicing(Archetype::Origin, 0.2, false, STILL);
        assert!(on[1].gain.unwrap_or_default() > 0.0);
        assert_eq!(off[1].gain, Some(0.0));
    }

    #[test]
    fn void_rumble_stutters_on_high_jitter() {
        let steady = voicing(Archetype::Void, 0.5, true, STILL);
        assert_eq!(steady[0].frequency, Some(70.0));
        assert_eq!(steady[0].gain, Some(0.3));

        let shaken = voicing(
            Archetype::Void,
            0.5,
            true,
            Modulation {
                jitter: 0.9,
                pulse: false,
            },
        );
        assert_eq!(shaken[0].frequency, Some(115.0));
    }

    #[test]
    fn danger_is_clamped() {
        let targets = voicing(Archetype::Upload, 7.0, false, STILL);
        assert_eq!(targets[0].frequency, Some(5_000.0));
        let nan = voicing(Archetype::Upload, f32::NAN, false, STILL);
        assert_eq!(nan[0].gain, Some(0.0));
    }
}
