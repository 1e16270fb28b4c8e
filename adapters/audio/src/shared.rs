use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{AudioError, AudioGraph, SoftwareGraph, VoiceId, VoiceSpec, VoiceTarget};

/// Cloneable handle to a [`SoftwareGraph`] shared with an output thread.
///
/// The engine drives the graph through one clone while the device callback
/// renders samples through another.
#[derive(Clone, Debug, Default)]
pub struct SharedGraph {
    inner: Arc<Mutex<SoftwareGraph>>,
}

impl SharedGraph {
    /// Wraps a software graph.
    #[must_use]
    pub fn new(graph: SoftwareGraph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Output sample rate of the wrapped graph.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.inner.lock().sample_rate()
    }

    /// Renders the next mono samples into `out`.
    pub fn render(&self, out: &mut [f32]) {
        self.inner.lock().render(out);
    }
}

impl AudioGraph for SharedGraph {
    fn resume(&mut self) -> Result<(), AudioError> {
        self.inner.lock().resume()
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        self.inner.lock().suspend()
    }

    fn spawn(&mut self, spec: VoiceSpec) -> Result<VoiceId, AudioError> {
        self.inner.lock().spawn(spec)
    }

    fn retarget(&mut self, voice: VoiceId, target: VoiceTarget) -> Result<(), AudioError> {
        self.inner.lock().retarget(voice, target)
    }

    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        self.inner.lock().stop(voice)
    }

    fn set_master_gain(&mut self, gain: f32, smoothing: Duration) -> Result<(), AudioError> {
        self.inner.lock().set_master_gain(gain, smoothing)
    }

    fn live_voices(&self) -> usize {
        self.inner.lock().live_voices()
    }
}
