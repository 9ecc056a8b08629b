//! Session Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use antiphase_dsp::DEFAULT_GAIN;

/// Largest frame the exchange will allocate for
pub const MAX_FRAME_SIZE: usize = 8192;

/// Audio session configuration
///
/// The frame size is fixed for the lifetime of a started session. Changing
/// it needs a stop / reconfigure / start cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Samples per frame, as agreed with the driver before `start`
    pub frame_size: usize,

    /// Sample rate in Hz (used for frame timing and processor context)
    pub sample_rate: u32,

    /// Gain applied until the first `start`/`set_gain`
    pub initial_gain: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            sample_rate: 48000,
            initial_gain: DEFAULT_GAIN,
        }
    }
}

impl SessionConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            frame_size: 256, // ~5.3ms at 48kHz
            ..Self::default()
        }
    }

    /// Create config optimized for stability
    pub fn stable() -> Self {
        Self {
            frame_size: 2048, // ~42.7ms at 48kHz
            ..Self::default()
        }
    }

    /// Calculate latency of one frame in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.frame_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Wall-clock duration of one frame
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(self.frame_size as f64 / self.sample_rate as f64)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_size == 0 || self.frame_size > MAX_FRAME_SIZE {
            return Err(format!("Invalid frame size: {}", self.frame_size));
        }
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        Ok(())
    }
}
