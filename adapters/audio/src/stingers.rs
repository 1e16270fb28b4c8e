//! Self-stopping one-shot sounds.

use std::time::Duration;

use crate::{VoiceSpec, Waveform};

const fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Sawtooth zipping up from 100 Hz while fading out.
pub(crate) fn scream(duration: Duration) -> Vec<VoiceSpec> {
    let duration = duration.max(millis(100));
    vec![VoiceSpec::new(Waveform::Sawtooth, 100.0, 1.0)
        .with_pitch_ramp(3_000.0, millis(100))
        .with_gain_ramp(0.01, duration)
        .with_lifetime(duration)]
}

/// White-noise burst.
pub(crate) fn static_burst(duration: Duration) -> Vec<VoiceSpec> {
    let duration = duration.max(millis(10));
    vec![VoiceSpec::new(Waveform::Noise, 1_000.0, 0.5)
        .with_gain_ramp(0.05, duration)
        .with_lifetime(duration)]
}

/// Breathy filtered noise over an unsteady low tone.
pub(crate) fn whisper() -> Vec<VoiceSpec> {
    vec![
        VoiceSpec::new(Waveform::Noise, 1_000.0, 0.15)
            .with_lowpass(1_200.0)
            .with_gain_ramp(0.001, millis(1_200))
            .with_lifetime(millis(1_200)),
        VoiceSpec::new(Waveform::Sine, 180.0, 0.03)
            .with_vibrato(6.0, 20.0)
            .with_gain_ramp(0.001, millis(1_000))
            .with_lifetime(millis(1_000)),
    ]
}

/// Square wave dropping from 2 kHz.
pub(crate) fn digital_error() -> Vec<VoiceSpec> {
    vec![VoiceSpec::new(Waveform::Square, 2_000.0, 0.5)
        .with_pitch_ramp(50.0, millis(100))
        .with_gain_ramp(0.001, millis(100))
        .with_lifetime(millis(100))]
}

/// Two rising chirps.
pub(crate) fn repair_success() -> Vec<VoiceSpec> {
    vec![
        VoiceSpec::new(Waveform::Sine, 600.0, 0.3)
            .with_pitch_ramp(1_200.0, millis(150))
            .with_gain_ramp(0.01, millis(200))
            .with_lifetime(millis(200)),
        VoiceSpec::new(Waveform::Triangle, 1_200.0, 0.15)
            .with_pitch_ramp(2_400.0, millis(150))
            .with_gain_ramp(0.01, millis(250))
            .with_lifetime(millis(250)),
    ]
}

/// Short 800 Hz tick.
pub(crate) fn click() -> Vec<VoiceSpec> {
    vec![VoiceSpec::new(Waveform::Sine, 800.0, 0.1)
        .with_gain_ramp(0.001, millis(50))
        .with_lifetime(millis(50))]
}

/// Low impact with a muffled noise transient.
pub(crate) fn thud() -> Vec<VoiceSpec> {
    vec![
        VoiceSpec::new(Waveform::Sine, 90.0, 0.9)
            .with_pitch_ramp(30.0, millis(300))
            .with_gain_ramp(0.01, millis(400))
            .with_lifetime(millis(400)),
        VoiceSpec::new(Waveform::Noise, 1_000.0, 0.4)
            .with_lowpass(200.0)
            .with_gain_ramp(0.01, millis(120))
            .with_lifetime(millis(120)),
    ]
}

/// Single pulse; racing hearts beat slightly higher and louder.
pub(crate) fn heartbeat(fast: bool) -> Vec<VoiceSpec> {
    let (from, to, gain) = if fast {
        (70.0, 45.0, 0.7)
    } else {
        (60.0, 40.0, 0.5)
    };
    vec![VoiceSpec::new(Waveform::Sine, from, gain)
        .with_pitch_ramp(to, millis(100))
        .with_gain_ramp(0.01, millis(150))
        .with_lifetime(millis(200))]
}

/// Low hum for the title screen.
pub(crate) fn menu_hum() -> Vec<VoiceSpec> {
    vec![
        VoiceSpec::new(Waveform::Sine, 55.0, 0.08).with_lowpass(200.0),
        VoiceSpec::new(Waveform::Triangle, 110.0, 0.02).with_vibrato(0.2, 1.0),
    ]
}

/// Dual detuned sawtooth drone over a slow sub-bass.
pub(crate) fn game_drone() -> Vec<VoiceSpec> {
    vec![
        VoiceSpec::new(Waveform::Sawtooth, 50.0, 0.15)
            .with_lowpass(120.0)
            .with_vibrato(0.1, 10.0),
        VoiceSpec::new(Waveform::Sawtooth, 50.7, 0.15)
            .with_lowpass(120.0)
            .with_vibrato(0.13, 8.0),
        VoiceSpec::new(Waveform::Sine, 30.0, 0.2).with_vibrato(0.05, 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stinger_stops_itself() {
        let stingers = [
            scream(millis(500)),
            static_burst(millis(100)),
            whisper(),
            digital_error(),
            repair_success(),
            click(),
            thud(),
            heartbeat(true),
            heartbeat(false),
        ];
        for specs in stingers {
            assert!(!specs.is_empty());
            assert!(specs.iter().all(|spec| spec.lifetime.is_some()));
        }
    }

    #[test]
    fn ambience_layers_are_persistent() {
        for spec in menu_hum().into_iter().chain(game_drone()) {
            assert_eq!(spec.lifetime, None);
        }
    }
}
