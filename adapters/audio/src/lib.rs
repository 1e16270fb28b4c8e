#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural audio for Mnemosyne.
//!
//! Every sound is synthesized at runtime: oscillators, filtered noise, and
//! pitch or gain ramps, scheduled on an [`AudioGraph`]. The
//! [`ProceduralAudioEngine`] consumes [`mnemosyne_core::AudioCue`] values as a
//! [`mnemosyne_core::CueSink`] and never lets audio failures reach the game.

mod engine;
mod error;
mod graph;
#[cfg(feature = "rodio-output")]
mod output;
mod shared;
mod software;
mod stingers;
mod timbre;

pub use engine::{ProceduralAudioEngine, DEFAULT_MASTER_GAIN};
pub use error::AudioError;
pub use graph::{AudioGraph, Lfo, Ramp, UnavailableGraph, VoiceId, VoiceSpec, VoiceTarget, Waveform};
#[cfg(feature = "rodio-output")]
pub use output::RodioOutput;
pub use shared::SharedGraph;
pub use software::{SoftwareGraph, DEFAULT_SAMPLE_RATE};
