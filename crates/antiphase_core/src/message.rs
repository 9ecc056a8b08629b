//! Event Types for Thread Communication
//!
//! Events flow from the session and its monitor thread to whoever holds the
//! receiving end (a UI, a logger, a test).

use serde::{Deserialize, Serialize};

/// Events published by the audio session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Processing armed with the given (clamped) gain
    Started { gain: f32 },

    /// Processing disarmed
    Stopped,

    /// Gain changed through `set_gain`
    GainChanged { gain: f32 },

    /// Frame buffers resized while stopped
    Reconfigured { frame_size: usize },

    /// Input level for meters, 0.0 - 100.0
    LevelUpdate { level: f32 },

    /// Smoothed band energies for a spectrum-style display, each 0.0 - 100.0
    SpectrumUpdate { bands: Vec<f32> },
}

impl Event {
    /// Periodic meter output, as opposed to a lifecycle change
    pub fn is_meter(&self) -> bool {
        matches!(self, Event::LevelUpdate { .. } | Event::SpectrumUpdate { .. })
    }
}
