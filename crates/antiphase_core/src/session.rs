//! Audio Session - Lifecycle Controller
//!
//! The `AudioSession` is the single owned object behind every operation:
//! it owns the frame exchange, the configuration and the event channel.
//! Share it across consumer threads with an `Arc`; hand the driver a
//! [`FrameHandle`] instead.
//!
//! ```text
//!   Stopped ──start(gain)──▶ Running ──stop()──▶ Stopped
//!      │                        │
//!      └── reconfigure() ok     └── reconfigure() → ReconfigureWhileRunning
//! ```

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use antiphase_dsp::DEFAULT_NUM_BANDS;

use crate::config::SessionConfig;
use crate::error::{EngineError, EngineResult};
use crate::exchange::{Exchange, FrameHandle, FrameSnapshot};
use crate::message::Event;

/// Meter updates kept for a slow reader; older ones are evicted first
const METER_CAPACITY: usize = 256;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingState {
    Stopped,
    Running,
}

/// Result of [`AudioSession::start`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub success: bool,
    pub gain: f32,
}

/// Result of [`AudioSession::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOutcome {
    pub success: bool,
}

/// Result of [`AudioSession::set_gain`], carrying the post-clamp gain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainOutcome {
    pub success: bool,
    pub gain: f32,
}

/// A configured audio session
pub struct AudioSession {
    exchange: Arc<Exchange>,
    config: RwLock<SessionConfig>,
    event_sender: Sender<Event>,
    event_receiver: Receiver<Event>,
    meter_sender: Sender<Event>,
    meter_receiver: Receiver<Event>,
}

impl AudioSession {
    /// Create a session with the default configuration
    pub fn new() -> EngineResult<Self> {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session with a custom configuration
    pub fn with_config(config: SessionConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        let (event_sender, event_receiver) = unbounded::<Event>();
        let (meter_sender, meter_receiver) = bounded::<Event>(METER_CAPACITY);
        let exchange = Arc::new(Exchange::new(&config));

        debug!(
            frame_size = config.frame_size,
            sample_rate = config.sample_rate,
            "Audio session created"
        );

        Ok(Self {
            exchange,
            config: RwLock::new(config),
            event_sender,
            event_receiver,
            meter_sender,
            meter_receiver,
        })
    }

    /// Store the clamped gain and arm the realtime path
    ///
    /// Starting a running session only re-applies the gain.
    pub fn start(&self, gain: f32) -> StartOutcome {
        let (gain, was_running) = self.exchange.arm(gain);

        if was_running {
            debug!(gain, "Session already running, gain re-applied");
            self.publish(Event::GainChanged { gain });
        } else {
            info!(gain, "Audio session started");
            self.publish(Event::Started { gain });
        }

        StartOutcome {
            success: true,
            gain,
        }
    }

    /// Disarm the realtime path; further frame callbacks become no-ops
    ///
    /// Idempotent. Waits for an in-flight callback to finish its frame, so no
    /// frame is processed after this returns.
    pub fn stop(&self) -> StopOutcome {
        if self.exchange.disarm() {
            info!("Audio session stopped");
            self.publish(Event::Stopped);
        } else {
            debug!("Stop requested on a stopped session");
        }
        StopOutcome { success: true }
    }

    /// Clamp and store a gain, effective from the next frame in any state
    pub fn set_gain(&self, value: f32) -> GainOutcome {
        let gain = self.exchange.set_gain(value);
        debug!(requested = value, gain, "Gain updated");
        self.publish(Event::GainChanged { gain });
        GainOutcome {
            success: true,
            gain,
        }
    }

    pub fn gain(&self) -> f32 {
        self.exchange.gain()
    }

    pub fn state(&self) -> ProcessingState {
        if self.exchange.is_processing() {
            ProcessingState::Running
        } else {
            ProcessingState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ProcessingState::Running
    }

    /// Input level of the current frame, 0-100 (0 when stopped)
    pub fn level(&self) -> f32 {
        self.exchange.level_percent()
    }

    /// Coarse band energies of the current frame, each 0-100
    pub fn band_energies(&self, num_bands: usize) -> Vec<f32> {
        self.exchange.band_energies(num_bands)
    }

    /// Band energies with the default band count
    pub fn spectrum(&self) -> Vec<f32> {
        self.band_energies(DEFAULT_NUM_BANDS)
    }

    /// Consistent copy of the current frame
    pub fn snapshot(&self) -> FrameSnapshot {
        self.exchange.snapshot()
    }

    /// Block until the driver publishes another frame or `timeout` elapses
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        self.exchange.wait_for_frame(timeout)
    }

    pub fn frames_processed(&self) -> u64 {
        self.exchange.frames_processed()
    }

    /// Handle for the driver's delivery thread
    pub fn frame_handle(&self) -> FrameHandle {
        FrameHandle::new(Arc::clone(&self.exchange))
    }

    /// Direct access to the exchange for low-level consumers
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Apply a new configuration; the session must be stopped
    pub fn reconfigure(&self, config: SessionConfig) -> EngineResult<()> {
        config.validate().map_err(EngineError::ConfigError)?;

        // Held across the resize so the stored config always matches the buffers
        let mut current = self.config.write();
        self.exchange.reconfigure(&config)?;
        let frame_size = config.frame_size;
        *current = config;
        drop(current);

        info!(frame_size, "Audio session reconfigured");
        self.publish(Event::Reconfigured { frame_size });
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> SessionConfig {
        self.config.read().clone()
    }

    /// Get next lifecycle event (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get next meter update (non-blocking)
    pub fn poll_meter_event(&self) -> Option<Event> {
        self.meter_receiver.try_recv().ok()
    }

    /// Lifecycle and gain events, for a dedicated listener thread
    ///
    /// Never dropped.
    pub fn events(&self) -> Receiver<Event> {
        self.event_receiver.clone()
    }

    /// `LevelUpdate` / `SpectrumUpdate` events from a [`MeterMonitor`]
    ///
    /// Bounded; when nobody keeps up, the oldest updates are discarded.
    ///
    /// [`MeterMonitor`]: crate::MeterMonitor
    pub fn meter_events(&self) -> Receiver<Event> {
        self.meter_receiver.clone()
    }

    pub(crate) fn publish(&self, event: Event) {
        if !event.is_meter() {
            // The session holds a receiver, so the channel never disconnects
            let _ = self.event_sender.send(event);
            return;
        }

        let mut pending = event;
        loop {
            match self.meter_sender.try_send(pending) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.meter_receiver.try_recv();
                    pending = rejected;
                }
            }
        }
    }
}
