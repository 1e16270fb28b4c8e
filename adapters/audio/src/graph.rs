//! Audio-graph capability consumed by the engine.

use std::time::Duration;

use crate::AudioError;

/// Identifier of a voice spawned on an audio graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

impl VoiceId {
    /// Creates a new voice identifier with the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Oscillator shape of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// Pure tone.
    Sine,
    /// Hollow, buzzy tone.
    Square,
    /// Bright, harsh tone.
    Sawtooth,
    /// Soft, flute-like tone.
    Triangle,
    /// White noise; the frequency is ignored.
    Noise,
}

/// Exponential glide from the initial value to `target` over `duration`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    /// Value reached at the end of the ramp.
    pub target: f32,
    /// Length of the ramp.
    pub duration: Duration,
}

/// Low-frequency oscillator modulating a voice's pitch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lfo {
    /// Modulation rate in hertz.
    pub rate_hz: f32,
    /// Peak frequency deviation in hertz.
    pub depth_hz: f32,
}

/// Description of a voice to spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSpec {
    /// Oscillator shape.
    pub waveform: Waveform,
    /// Initial frequency in hertz.
    pub frequency: f32,
    /// Initial linear gain.
    pub gain: f32,
    /// Cutoff of a one-pole lowpass filter, if any.
    pub lowpass_hz: Option<f32>,
    /// Pitch modulation, if any.
    pub vibrato: Option<Lfo>,
    /// Pitch ramp started on spawn.
    pub pitch_ramp: Option<Ramp>,
    /// Gain ramp started on spawn.
    pub gain_ramp: Option<Ramp>,
    /// One-shot voices stop themselves after this long; `None` keeps the voice alive.
    pub lifetime: Option<Duration>,
}

impl VoiceSpec {
    /// Creates a persistent, unfiltered voice.
    #[must_use]
    pub const fn new(waveform: Waveform, frequency: f32, gain: f32) -> Self {
        Self {
            waveform,
            frequency,
            gain,
            lowpass_hz: None,
            vibrato: None,
            pitch_ramp: None,
            gain_ramp: None,
            lifetime: None,
        }
    }

    /// Routes the voice through a lowpass filter.
    #[must_use]
    pub fn with_lowpass(mut self, cutoff_hz: f32) -> Self {
        self.lowpass_hz = Some(cutoff_hz);
        self
    }

    /// Adds pitch vibrato.
    #[must_use]
    pub fn with_vibrato(mut self, rate_hz: f32, depth_hz: f32) -> Self {
        self.vibrato = Some(Lfo { rate_hz, depth_hz });
        self
    }

    /// Glides the pitch to `target` after spawning.
    #[must_use]
    pub fn with_pitch_ramp(mut self, target: f32, duration: Duration) -> Self {
        self.pitch_ramp = Some(Ramp { target, duration });
        self
    }

    /// Glides the gain to `target` after spawning.
    #[must_use]
    pub fn with_gain_ramp(mut self, target: f32, duration: Duration) -> Self {
        self.gain_ramp = Some(Ramp { target, duration });
        self
    }

    /// Turns the voice into a self-stopping one-shot.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }
}

/// New parameter targets for a live voice.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoiceTarget {
    /// Oscillator shape to switch to.
    pub waveform: Option<Waveform>,
    /// Frequency to glide to.
    pub frequency: Option<f32>,
    /// Gain to glide to.
    pub gain: Option<f32>,
    /// Time constant of the glide; zero jumps immediately.
    pub smoothing: Duration,
}

impl VoiceTarget {
    /// Creates an empty retarget with the provided smoothing.
    #[must_use]
    pub const fn smoothed(smoothing: Duration) -> Self {
        Self {
            waveform: None,
            frequency: None,
            gain: None,
            smoothing,
        }
    }

    /// Switches the oscillator shape.
    #[must_use]
    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = Some(waveform);
        self
    }

    /// Glides to a new frequency.
    #[must_use]
    pub fn frequency(mut self, frequency: f32) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Glides to a new gain.
    #[must_use]
    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = Some(gain);
        self
    }
}

/// Capability to build and drive a graph of synthesized voices.
///
/// Implementations report failures through [`AudioError`]; callers decide
/// whether to surface or absorb them.
pub trait AudioGraph {
    /// Starts or resumes output.
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Pauses output without releasing voices.
    fn suspend(&mut self) -> Result<(), AudioError>;

    /// Spawns a voice and returns its identifier.
    fn spawn(&mut self, spec: VoiceSpec) -> Result<VoiceId, AudioError>;

    /// Retargets the parameters of a live voice.
    fn retarget(&mut self, voice: VoiceId, target: VoiceTarget) -> Result<(), AudioError>;

    /// Releases a voice.
    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError>;

    /// Glides the master gain.
    fn set_master_gain(&mut self, gain: f32, smoothing: Duration) -> Result<(), AudioError>;

    /// Number of voices currently allocated.
    fn live_voices(&self) -> usize;
}

impl<G> AudioGraph for Box<G>
where
    G: AudioGraph + ?Sized,
{
    fn resume(&mut self) -> Result<(), AudioError> {
        (**self).resume()
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        (**self).suspend()
    }

    fn spawn(&mut self, spec: VoiceSpec) -> Result<VoiceId, AudioError> {
        (**self).spawn(spec)
    }

    fn retarget(&mut self, voice: VoiceId, target: VoiceTarget) -> Result<(), AudioError> {
        (**self).retarget(voice, target)
    }

    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        (**self).stop(voice)
    }

    fn set_master_gain(&mut self, gain: f32, smoothing: Duration) -> Result<(), AudioError> {
        (**self).set_master_gain(gain, smoothing)
    }

    fn live_voices(&self) -> usize {
        (**self).live_voices()
    }
}

/// Graph standing in for a missing or denied audio capability.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableGraph;

impl AudioGraph for UnavailableGraph {
    fn resume(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Unavailable)
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Unavailable)
    }

    fn spawn(&mut self, _spec: VoiceSpec) -> Result<VoiceId, AudioError> {
        Err(AudioError::Unavailable)
    }

    fn retarget(&mut self, _voice: VoiceId, _target: VoiceTarget) -> Result<(), AudioError> {
        Err(AudioError::Unavailable)
    }

    fn stop(&mut self, _voice: VoiceId) -> Result<(), AudioError> {
        Err(AudioError::Unavailable)
    }

    fn set_master_gain(&mut self, _gain: f32, _smoothing: Duration) -> Result<(), AudioError> {
        Err(AudioError::Unavailable)
    }

    fn live_voices(&self) -> usize {
        0
    }
}
