//! Device output through `rodio`.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Source};

use crate::{AudioError, SharedGraph};

const BLOCK: usize = 256;

/// Keeps a `rodio` output stream alive while it pulls samples from a graph.
pub struct RodioOutput {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
}

impl RodioOutput {
    /// Opens the default output device and starts streaming `graph`.
    pub fn open(graph: SharedGraph) -> Result<Self, AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|error| AudioError::Device(error.to_string()))?;
        handle
            .play_raw(GraphSource::new(graph))
            .map_err(|error| AudioError::Device(error.to_string()))?;
        log::debug!("audio output stream opened");
        Ok(Self {
            _stream: stream,
            _handle: handle,
        })
    }
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput").finish_non_exhaustive()
    }
}

/// Endless mono source rendering a shared graph block by block.
struct GraphSource {
    graph: SharedGraph,
    sample_rate: u32,
    block: Vec<f32>,
    cursor: usize,
}

impl GraphSource {
    fn new(graph: SharedGraph) -> Self {
        Self {
            sample_rate: graph.sample_rate(),
            graph,
            block: vec![0.0; BLOCK],
            cursor: BLOCK,
        }
    }
}

impl Iterator for GraphSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.cursor >= self.block.len() {
            self.graph.render(&mut self.block);
            self.cursor = 0;
        }
        let sample = self.block[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for GraphSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
