//! Chooses where audio cues end up.

use mnemosyne_audio::{ProceduralAudioEngine, SoftwareGraph};
use mnemosyne_core::{CueSink, MutedSink};

/// Destination requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AudioMode {
    /// Cues are dropped.
    Muted,
    /// Cues drive a synthesizer that is never connected to a device.
    Offline,
    /// Cues drive a synthesizer streaming to the default output device.
    Device,
}

/// Cue sink plus whatever keeps its output alive.
pub(crate) struct AudioWiring {
    pub(crate) sink: Box<dyn CueSink>,
    #[cfg(feature = "audio-device")]
    _output: Option<mnemosyne_audio::RodioOutput>,
}

impl AudioWiring {
    fn sink_only(sink: Box<dyn CueSink>) -> Self {
        Self {
            sink,
            #[cfg(feature = "audio-device")]
            _output: None,
        }
    }
}

/// Builds the sink for `mode`; the engine jitter is seeded from `seed`.
pub(crate) fn wire(mode: AudioMode, seed: u64) -> AudioWiring {
    match mode {
        AudioMode::Muted => AudioWiring::sink_only(Box::new(MutedSink)),
        AudioMode::Offline => AudioWiring::sink_only(Box::new(ProceduralAudioEngine::new(
            SoftwareGraph::default(),
            seed,
        ))),
        AudioMode::Device => open_device(seed),
    }
}

#[cfg(feature = "audio-device")]
fn open_device(seed: u64) -> AudioWiring {
    use mnemosyne_audio::{RodioOutput, SharedGraph, UnavailableGraph};

    let graph = SharedGraph::new(SoftwareGraph::default());
    match RodioOutput::open(graph.clone()) {
        Ok(output) => AudioWiring {
            sink: Box::new(ProceduralAudioEngine::new(graph, seed)),
            _output: Some(output),
        },
        Err(error) => {
            log::warn!("{error}; continuing without sound");
            AudioWiring::sink_only(Box::new(ProceduralAudioEngine::new(UnavailableGraph, seed)))
        }
    }
}

#[cfg(not(feature = "audio-device"))]
fn open_device(seed: u64) -> AudioWiring {
    log::info!("built without the `audio-device` feature; sound is synthesized but not played");
    AudioWiring::sink_only(Box::new(ProceduralAudioEngine::new(
        mnemosyne_audio::UnavailableGraph,
        seed,
    )))
}
