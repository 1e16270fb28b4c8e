//! Procedural audio engine translating cues into voices on an [`AudioGraph`].

use std::time::Duration;

use log::{debug, info, warn};
use mnemosyne_core::{Archetype, AudioCue, CueSink};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    stingers,
    timbre::{self, Modulation, TENSION_VOICES},
    AudioError, AudioGraph, VoiceId, VoiceSpec, VoiceTarget,
};

/// Master gain applied when the engine is activated.
pub const DEFAULT_MASTER_GAIN: f32 = 0.8;

const MASTER_SMOOTHING: Duration = Duration::from_millis(500);
const TENSION_RELEASE: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AmbienceKind {
    Menu,
    Game,
}

#[derive(Clone, Debug)]
struct Ambience {
    kind: AmbienceKind,
    voices: Vec<VoiceId>,
}

/// Synthesizes every sound of the game from oscillators and noise.
///
/// Nothing is audible until [`ProceduralAudioEngine::activate`] succeeds; cues
/// received earlier are dropped. Graph failures are logged and absorbed so
/// they never reach game logic.
#[derive(Debug)]
pub struct ProceduralAudioEngine<G: AudioGraph> {
    graph: G,
    rng: ChaCha8Rng,
    active: bool,
    shut_down: bool,
    ambience: Option<Ambience>,
    tension: Option<[VoiceId; TENSION_VOICES]>,
    pulse: bool,
    master_scale: f32,
    failures: u64,
}

impl<G: AudioGraph> ProceduralAudioEngine<G> {
    /// Creates an inactive engine driving `graph`; `seed` feeds pitch jitter.
    #[must_use]
    pub fn new(graph: G, seed: u64) -> Self {
        Self {
            graph,
            rng: ChaCha8Rng::seed_from_u64(seed),
            active: false,
            shut_down: false,
            ambience: None,
            tension: None,
            pulse: false,
            master_scale: 1.0,
            failures: 0,
        }
    }

    /// Underlying audio graph.
    #[must_use]
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Mutable access to the underlying audio graph.
    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// Reports whether output has been unlocked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Reports whether every resource has been released.
    #[must_use]
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Number of graph failures absorbed so far.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }

    /// Unlocks output. Repeated calls after a successful activation do nothing.
    pub fn activate(&mut self) {
        if self.active || self.shut_down {
            return;
        }
        let resumed = self.graph.resume();
        if self.absorb("resume", resumed).is_none() {
            return;
        }
        self.active = true;
        info!("audio activated");
        self.apply_master();
    }

    /// Replaces whatever ambience is playing with the menu hum.
    pub fn menu_ambience(&mut self) {
        self.switch_ambience(AmbienceKind::Menu);
    }

    /// Replaces whatever ambience is playing with the in-game drone.
    pub fn game_ambience(&mut self) {
        self.switch_ambience(AmbienceKind::Game);
    }

    /// Retunes the persistent tension voices.
    pub fn update_proximity(&mut self, archetype: Archetype, danger: f32, alert: bool) {
        if !self.ready() {
            return;
        }
        let Some(voices) = self.tension_voices() else {
            return;
        };

        self.pulse = !self.pulse;
        let modulation = Modulation {
            jitter: self.rng.gen(),
            pulse: self.pulse,
        };
        let targets = timbre::voicing(archetype, danger, alert, modulation);
        let mut lost = Vec::new();
        for (voice, target) in voices.into_iter().zip(targets) {
            let result = self.graph.retarget(voice, target);
            if matches!(result, Err(AudioError::UnknownVoice(_))) {
                lost.push(voice);
            }
            let _ = self.absorb("retarget tension", result);
        }
        // A partial set is released so the next update respawns all three.
        if !lost.is_empty() {
            for voice in voices.into_iter().filter(|voice| !lost.contains(voice)) {
                let result = self.graph.stop(voice);
                let _ = self.absorb("stop tension", result);
            }
            self.tension = None;
        }

        self.wobble_drone();
    }

    /// Fades the tension voices out without releasing them.
    pub fn tension_off(&mut self) {
        if !self.ready() {
            return;
        }
        let Some(voices) = self.tension else {
            return;
        };
        for voice in voices {
            let result = self
                .graph
                .retarget(voice, VoiceTarget::smoothed(TENSION_RELEASE).gain(0.0));
            let _ = self.absorb("silence tension", result);
        }
    }

    /// Plays a single heartbeat pulse.
    pub fn heartbeat(&mut self, fast: bool) {
        self.one_shot(stingers::heartbeat(fast));
    }

    /// Scales the master gain relative to [`DEFAULT_MASTER_GAIN`].
    pub fn set_master_scale(&mut self, scale: f32) {
        self.master_scale = if scale.is_finite() {
            scale.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.ready() {
            self.apply_master();
        }
    }

    /// Stops every voice and suspends output. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let mut voices = self.tension.take().map(Vec::from).unwrap_or_default();
        if let Some(ambience) = self.ambience.take() {
            voices.extend(ambience.voices);
        }
        for voice in voices {
            let result = self.graph.stop(voice);
            let _ = self.absorb("stop", result);
        }
        if self.active {
            let suspended = self.graph.suspend();
            let _ = self.absorb("suspend", suspended);
        }
        self.active = false;
        info!("audio shut down");
    }

    fn ready(&self) -> bool {
        self.active && !self.shut_down
    }

    fn absorb<T>(&mut self, action: &str, result: Result<T, AudioError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.failures += 1;
                if self.failures == 1 {
                    warn!("audio {action} failed: {error}");
                } else {
                    debug!("audio {action} failed: {error}");
                }
                None
            }
        }
    }

    fn apply_master(&mut self) {
        let gain = DEFAULT_MASTER_GAIN * self.master_scale;
        let result = self.graph.set_master_gain(gain, MASTER_SMOOTHING);
        let _ = self.absorb("master gain", result);
    }

    fn spawn_all(&mut self, specs: Vec<VoiceSpec>) -> Vec<VoiceId> {
        let mut voices = Vec::with_capacity(specs.len());
        for spec in specs {
            let result = self.graph.spawn(spec);
            if let Some(voice) = self.absorb("spawn", result) {
                voices.push(voice);
            }
        }
        voices
    }

    fn one_shot(&mut self, specs: Vec<VoiceSpec>) {
        if self.ready() {
            let _ = self.spawn_all(specs);
        }
    }

    fn switch_ambience(&mut self, kind: AmbienceKind) {
        if !self.ready() {
            return;
        }
        if self.ambience.as_ref().map(|ambience| ambience.kind) == Some(kind) {
            return;
        }
        if let Some(previous) = self.ambience.take() {
            for voice in previous.voices {
                let stopped = self.graph.stop(voice);
                let _ = self.absorb("stop ambience", stopped);
            }
        }

        let specs = match kind {
            AmbienceKind::Menu => stingers::menu_hum(),
            AmbienceKind::Game => stingers::game_drone(),
        };
        let voices = self.spawn_all(specs);
        debug!("ambience {kind:?} with {} voices", voices.len());
        self.ambience = Some(Ambience { kind, voices });
    }

    fn tension_voices(&mut self) -> Option<[VoiceId; TENSION_VOICES]> {
        if let Some(voices) = self.tension {
            return Some(voices);
        }

        let spawned = self.spawn_all(timbre::tension_seed().to_vec());
        match <[VoiceId; TENSION_VOICES]>::try_from(spawned) {
            Ok(voices) => {
                self.tension = Some(voices);
                Some(voices)
            }
            Err(partial) => {
                for voice in partial {
                    let result = self.graph.stop(voice);
                    let _ = self.absorb("stop tension", result);
                }
                None
            }
        }
    }

    fn wobble_drone(&mut self) {
        let lead = match &self.ambience {
            Some(Ambience {
                kind: AmbienceKind::Game,
                voices,
            }) => voices.first().copied(),
            _ => None,
        };
        if let Some(voice) = lead {
            let frequency = 50.0 + self.rng.gen_range(-1.5..1.5);
            let result = self.graph.retarget(
                voice,
                VoiceTarget::smoothed(Duration::from_millis(300)).frequency(frequency),
            );
            let _ = self.absorb("wobble drone", result);
        }
    }
}

impl<G: AudioGraph> CueSink for ProceduralAudioEngine<G> {
    fn play(&mut self, cue: &AudioCue) {
        match *cue {
            AudioCue::Activate => self.activate(),
            AudioCue::MenuAmbience => self.menu_ambience(),
            AudioCue::GameAmbience => self.game_ambience(),
            AudioCue::Proximity {
                archetype,
                danger,
                alert,
            } => self.update_proximity(archetype, danger, alert),
            AudioCue::TensionOff => self.tension_off(),
            AudioCue::Scream { duration } => self.one_shot(stingers::scream(duration)),
            AudioCue::StaticBurst { duration } => self.one_shot(stingers::static_burst(duration)),
            AudioCue::Whisper => self.one_shot(stingers::whisper()),
            AudioCue::DigitalError => self.one_shot(stingers::digital_error()),
            AudioCue::RepairSuccess => self.one_shot(stingers::repair_success()),
            AudioCue::Click => self.one_shot(stingers::click()),
            AudioCue::Thud => self.one_shot(stingers::thud()),
            AudioCue::Heartbeat { fast } => self.heartbeat(fast),
            AudioCue::MasterGain { scale } => self.set_master_scale(scale),
            AudioCue::Shutdown => self.shutdown(),
        }
    }
}

impl<G: AudioGraph> Drop for ProceduralAudioEngine<G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
