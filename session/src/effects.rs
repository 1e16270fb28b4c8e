use std::time::Duration;

use mnemosyne_core::{Overlay, OverlayKind};

/// Short-lived visual effects layered over the level.
#[derive(Clone, Debug, Default)]
pub(crate) struct Effects {
    overlay: Option<Overlay>,
    shake: f32,
    shake_remaining: Duration,
}

impl Effects {
    pub(crate) fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    pub(crate) fn shake(&self) -> f32 {
        if self.shake_remaining.is_zero() {
            0.0
        } else {
            self.shake
        }
    }

    pub(crate) fn show(&mut self, kind: OverlayKind, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        self.overlay = Some(Overlay {
            kind,
            remaining: duration,
        });
    }

    pub(crate) fn start_shake(&mut self, intensity: f32, duration: Duration) {
        self.shake = intensity;
        self.shake_remaining = duration;
    }

    pub(crate) fn age(&mut self, step: Duration) {
        self.overlay = self.overlay.and_then(|overlay| {
            let remaining = overlay.remaining.saturating_sub(step);
            (!remaining.is_zero()).then_some(Overlay {
                kind: overlay.kind,
                remaining,
            })
        });
        self.shake_remaining = self.shake_remaining.saturating_sub(step);
        if self.shake_remaining.is_zero() {
            self.shake = 0.0;
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
