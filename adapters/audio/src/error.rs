use thiserror::Error;

use crate::VoiceId;

/// Failures reported by an audio graph.
///
/// The engine never lets these escape into game logic; they are logged and dropped.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AudioError {
    /// No audio capability exists or it was denied.
    #[error("audio output is unavailable")]
    Unavailable,
    /// The output device failed.
    #[error("audio device failure: {0}")]
    Device(String),
    /// The voice was already reaped or never existed.
    #[error("unknown voice {0:?}")]
    UnknownVoice(VoiceId),
    /// A parameter was not a finite, in-range value.
    #[error("invalid value {value} for {name}")]
    InvalidParameter {
        /// Parameter that was rejected.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
}
