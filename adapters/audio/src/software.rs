//! Sample-accurate software synthesizer implementing [`AudioGraph`].

use std::{f32::consts::TAU, time::Duration};

use crate::{AudioError, AudioGraph, Lfo, Ramp, VoiceId, VoiceSpec, VoiceTarget, Waveform};

const NOISE_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const NOISE_INCREMENT: u64 = 1;
const RELEASE: Duration = Duration::from_millis(20);
const MAX_FREQUENCY: f32 = 20_000.0;
const MAX_GAIN: f32 = 4.0;

/// Default output sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Clone, Copy, Debug)]
enum Motion {
    Hold,
    Glide { target: f32, coeff: f32 },
    Ramp { target: f32, ratio: f32, remaining: u64 },
}

/// Parameter that moves towards its target one sample at a time.
#[derive(Clone, Copy, Debug)]
struct Param {
    value: f32,
    motion: Motion,
}

impl Param {
    const fn new(value: f32) -> Self {
        Self {
            value,
            motion: Motion::Hold,
        }
    }

    fn glide(&mut self, target: f32, smoothing: Duration, sample_rate: u32) {
        let samples = smoothing.as_secs_f32() * sample_rate as f32;
        if samples < 1.0 {
            self.value = target;
            self.motion = Motion::Hold;
            return;
        }
        self.motion = Motion::Glide {
            target,
            coeff: 1.0 - (-1.0 / samples).exp(),
        };
    }

    /// Exponential ramps need strictly positive endpoints; anything else glides.
    fn ramp(&mut self, ramp: Ramp, sample_rate: u32) {
        let samples = (ramp.duration.as_secs_f32() * sample_rate as f32) as u64;
        if samples == 0 {
            self.value = ramp.target;
            self.motion = Motion::Hold;
            return;
        }
        if self.value <= 0.0 || ramp.target <= 0.0 {
            self.glide(ramp.target, ramp.duration / 4, sample_rate);
            return;
        }
        self.motion = Motion::Ramp {
            target: ramp.target,
            ratio: (ramp.target / self.value).powf(1.0 / samples as f32),
            remaining: samples,
        };
    }

    fn next(&mut self) -> f32 {
        let current = self.value;
        match &mut self.motion {
            Motion::Hold => {}
            Motion::Glide { target, coeff } => {
                self.value += (*target - self.value) * *coeff;
                if (*target - self.value).abs() < 1e-6 {
                    self.value = *target;
                    self.motion = Motion::Hold;
                }
            }
            Motion::Ramp {
                target,
                ratio,
                remaining,
            } => {
                self.value *= *ratio;
                *remaining -= 1;
                if *remaining == 0 {
                    self.value = *target;
                    self.motion = Motion::Hold;
                }
            }
        }
        current
    }
}

#[derive(Clone, Debug)]
struct Voice {
    id: VoiceId,
    waveform: Waveform,
    frequency: Param,
    gain: Param,
    phase: f32,
    vibrato: Option<Lfo>,
    lfo_phase: f32,
    lowpass: Option<Lowpass>,
    age: u64,
    lifetime: Option<u64>,
}

impl Voice {
    fn finished(&self) -> bool {
        self.lifetime.map_or(false, |lifetime| self.age >= lifetime)
    }
}

/// One-pole lowpass filter.
#[derive(Clone, Copy, Debug)]
struct Lowpass {
    alpha: f32,
    state: f32,
}

impl Lowpass {
    fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        let alpha = 1.0 - (-TAU * cutoff_hz / sample_rate as f32).exp();
        Self { alpha, state: 0.0 }
    }

    fn process(&mut self, input: f32) -> f32 {
        self.state += self.alpha * (input - self.state);
        self.state
    }
}

/// In-memory synthesizer rendering every voice into a mono buffer.
///
/// The graph produces silence until resumed. Finished one-shot voices are
/// reaped at the end of each [`SoftwareGraph::render`] call.
#[derive(Clone, Debug)]
pub struct SoftwareGraph {
    sample_rate: u32,
    running: bool,
    master: Param,
    voices: Vec<Voice>,
    next_id: u64,
    noise_state: u64,
}

impl SoftwareGraph {
    /// Creates a suspended graph rendering at `sample_rate`.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            running: false,
            master: Param::new(1.0),
            voices: Vec::new(),
            next_id: 0,
            noise_state: 0x853c_49e6_748f_ea9b,
        }
    }

    /// Output sample rate.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Reports whether the graph is producing sound.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Current master gain.
    #[must_use]
    pub fn master_gain(&self) -> f32 {
        self.master.value
    }

    /// Fills `out` with the next mono samples.
    pub fn render(&mut self, out: &mut [f32]) {
        if !self.running {
            out.fill(0.0);
            return;
        }

        for sample in out.iter_mut() {
            let mut mix = 0.0;
            for index in 0..self.voices.len() {
                let noise = self.next_noise();
                let voice = &mut self.voices[index];
                mix += render_voice(voice, noise, self.sample_rate);
            }
            *sample = (mix * self.master.next()).clamp(-1.0, 1.0);
        }

        self.voices.retain(|voice| !voice.finished());
    }

    fn next_noise(&mut self) -> f32 {
        self.noise_state = self
            .noise_state
            .wrapping_mul(NOISE_MULTIPLIER)
            .wrapping_add(NOISE_INCREMENT);
        let bits = (self.noise_state >> 40) as u32;
        (bits as f32 / (1u32 << 24) as f32) * 2.0 - 1.0
    }

    fn samples(&self, duration: Duration) -> u64 {
        (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as u64
    }

    fn voice_mut(&mut self, id: VoiceId) -> Result<&mut Voice, AudioError> {
        self.voices
            .iter_mut()
            .find(|voice| voice.id == id)
            .ok_or(AudioError::UnknownVoice(id))
    }
}

impl Default for SoftwareGraph {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

fn render_voice(voice: &mut Voice, noise: f32, sample_rate: u32) -> f32 {
    voice.age += 1;
    let mut frequency = voice.frequency.next();
    if let Some(lfo) = voice.vibrato {
        frequency += (voice.lfo_phase * TAU).sin() * lfo.depth_hz;
        voice.lfo_phase = (voice.lfo_phase + lfo.rate_hz / sample_rate as f32).fract();
    }
    let gain = voice.gain.next();

    let raw = match voice.waveform {
        Waveform::Sine => (voice.phase * TAU).sin(),
        Waveform::Square => {
            if voice.phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Sawtooth => 2.0 * voice.phase - 1.0,
        Waveform::Triangle => 1.0 - 4.0 * (voice.phase - 0.5).abs(),
        Waveform::Noise => noise,
    };
    voice.phase = (voice.phase + frequency.max(0.0) / sample_rate as f32).fract();

    let filtered = match voice.lowpass.as_mut() {
        Some(filter) => filter.process(raw),
        None => raw,
    };
    filtered * gain
}

fn check(name: &'static str, value: f32, max: f32) -> Result<f32, AudioError> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(AudioError::InvalidParameter { name, value })
    }
}

impl AudioGraph for SoftwareGraph {
    fn resume(&mut self) -> Result<(), AudioError> {
        self.running = true;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        self.running = false;
        Ok(())
    }

    fn spawn(&mut self, spec: VoiceSpec) -> Result<VoiceId, AudioError> {
        let frequency = check("frequency", spec.frequency, MAX_FREQUENCY)?;
        let gain = check("gain", spec.gain, MAX_GAIN)?;
        if let Some(cutoff) = spec.lowpass_hz {
            let _ = check("lowpass", cutoff, MAX_FREQUENCY)?;
        }

        let id = VoiceId::new(self.next_id);
        self.next_id += 1;

        let mut voice = Voice {
            id,
            waveform: spec.waveform,
            frequency: Param::new(frequency),
            gain: Param::new(gain),
            phase: 0.0,
            vibrato: spec.vibrato,
            lfo_phase: 0.0,
            lowpass: spec
                .lowpass_hz
                .map(|cutoff| Lowpass::new(cutoff, self.sample_rate)),
            age: 0,
            lifetime: spec.lifetime.map(|lifetime| self.samples(lifetime).max(1)),
        };
        if let Some(ramp) = spec.pitch_ramp {
            voice.frequency.ramp(ramp, self.sample_rate);
        }
        if let Some(ramp) = spec.gain_ramp {
            voice.gain.ramp(ramp, self.sample_rate);
        }
        self.voices.push(voice);
        Ok(id)
    }

    fn retarget(&mut self, id: VoiceId, target: VoiceTarget) -> Result<(), AudioError> {
        let frequency = target
            .frequency
            .map(|value| check("frequency", value, MAX_FREQUENCY))
            .transpose()?;
        let gain = target
            .gain
            .map(|value| check("gain", value, MAX_GAIN))
            .transpose()?;
        let sample_rate = self.sample_rate;
        let voice = self.voice_mut(id)?;
        if let Some(waveform) = target.waveform {
            voice.waveform = waveform;
        }
        if let Some(frequency) = frequency {
            voice.frequency.glide(frequency, target.smoothing, sample_rate);
        }
        if let Some(gain) = gain {
            voice.gain.glide(gain, target.smoothing, sample_rate);
        }
        Ok(())
    }

    fn stop(&mut self, id: VoiceId) -> Result<(), AudioError> {
        let sample_rate = self.sample_rate;
        let release = self.samples(RELEASE);
        let voice = self.voice_mut(id)?;
        voice.gain.glide(0.0, RELEASE / 4, sample_rate);
        let deadline = voice.age + release;
        voice.lifetime = Some(voice.lifetime.map_or(deadline, |lifetime| lifetime.min(deadline)));
        Ok(())
    }

    fn set_master_gain(&mut self, gain: f32, smoothing: Duration) -> Result<(), AudioError> {
        let gain = check("master gain", gain, MAX_GAIN)?;
        self.master.glide(gain, smoothing, self.sample_rate);
        Ok(())
    }

    fn live_voices(&self) -> usize {
        self.voices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8_000;

    fn running() -> SoftwareGraph {
        let mut graph = SoftwareGraph::new(RATE);
        graph.resume().expect("resume");
        graph
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0_f32, |peak, sample| peak.max(sample.abs()))
    }

    #[test]
    fn suspended_graph_renders_silence() {
        let mut graph = SoftwareGraph::new(RATE);
        let _ = graph
            .spawn(VoiceSpec::new(Waveform::Square, 440.0, 1.0))
            .expect("spawn");
        let mut buffer = vec![1.0; 256];
        graph.render(&mut buffer);
        assert!(buffer.iter().all(|sample| *sample == 0.0));
    }

    #[test]
    fn one_shots_are_reaped_after_their_lifetime() {
        let mut graph = running();
        let _ = graph
            .spawn(
                VoiceSpec::new(Waveform::Sine, 800.0, 0.5)
                    .with_lifetime(Duration::from_millis(50)),
            )
            .expect("spawn");
        assert_eq!(graph.live_voices(), 1);

        let mut buffer = vec![0.0; 200];
        graph.render(&mut buffer);
        assert_eq!(graph.live_voices(), 1);
        graph.render(&mut buffer);
        assert_eq!(graph.live_voices(), 0);
    }

    #[test]
    fn stopped_voices_release_then_disappear() {
        let mut graph = running();
        let voice = graph
            .spawn(VoiceSpec::new(Waveform::Sawtooth, 110.0, 0.5))
            .expect("spawn");
        graph.stop(voice).expect("stop");

        let mut buffer = vec![0.0; 400];
        graph.render(&mut buffer);
        assert_eq!(graph.live_voices(), 0);
        assert_eq!(graph.stop(voice), Err(AudioError::UnknownVoice(voice)));
    }

    #[test]
    fn retarget_glides_gain() {
        let mut graph = running();
        let voice = graph
            .spawn(VoiceSpec::new(Waveform::Square, 100.0, 0.0))
            .expect("spawn");
        let mut buffer = vec![0.0; 800];
        graph.render(&mut buffer);
        assert!(peak(&buffer) < 1e-6);

        graph
            .retarget(
                voice,
                VoiceTarget::smoothed(Duration::from_millis(10)).gain(0.5),
            )
            .expect("retarget");
        graph.render(&mut buffer);
        assert!(peak(&buffer) > 0.4);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut graph = running();
        let error = graph
            .spawn(VoiceSpec::new(Waveform::Sine, f32::NAN, 0.5))
            .expect_err("nan frequency");
        assert!(matches!(
            error,
            AudioError::InvalidParameter {
                name: "frequency",
                ..
            }
        ));
        assert_eq!(graph.live_voices(), 0);
    }

    #[test]
    fn exponential_pitch_ramp_lands_on_target() {
        let mut param = Param::new(100.0);
        param.ramp(
            Ramp {
                target: 3_000.0,
                duration: Duration::from_millis(100),
            },
            RATE,
        );
        for _ in 0..800 {
            let _ = param.next();
        }
        assert!((param.value - 3_000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn output_is_clamped() {
        let mut graph = running();
        for _ in 0..4 {
            let _ = graph
                .spawn(VoiceSpec::new(Waveform::Square, 50.0, 1.0))
                .expect("spawn");
        }
        let mut buffer = vec![0.0; 256];
        graph.render(&mut buffer);
        assert!(peak(&buffer) <= 1.0);
    }
}
