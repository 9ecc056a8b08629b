//! Frame Sources
//!
//! The driver side of the exchange. Real hardware drivers (discovery, session
//! open/close, channel and buffer-size negotiation) live outside this crate;
//! all they need from it is a [`FrameHandle`] to call once per frame period.
//!
//! [`SimulatedDriver`] stands in for hardware: a named thread that synthesizes
//! a waveform and delivers it in alternating slots, optionally paced at the
//! real frame period.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buffer::SlotIndex;
use crate::config::SessionConfig;
use crate::error::{EngineError, EngineResult};
use crate::exchange::FrameHandle;

/// Static capabilities reported by a frame source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub name: String,
    pub input_channels: u16,
    pub output_channels: u16,
    pub min_frame_size: usize,
    pub max_frame_size: usize,
    pub preferred_frame_size: usize,
    pub granularity: usize,
}

impl DriverInfo {
    /// Whether the driver can run at `frame_size`
    ///
    /// Sizes must fall in `min..=max` and sit on the granularity grid
    /// counted from the minimum. A granularity of 0 accepts any size in range.
    pub fn supports_frame_size(&self, frame_size: usize) -> bool {
        if frame_size < self.min_frame_size || frame_size > self.max_frame_size {
            return false;
        }
        self.granularity == 0 || (frame_size - self.min_frame_size) % self.granularity == 0
    }

    /// Check a session config against these capabilities
    pub fn check(&self, config: &SessionConfig) -> EngineResult<()> {
        if self.supports_frame_size(config.frame_size) {
            Ok(())
        } else {
            Err(EngineError::ConfigError(format!(
                "{} does not support frame size {} (range {}..={}, step {})",
                self.name,
                config.frame_size,
                self.min_frame_size,
                self.max_frame_size,
                self.granularity
            )))
        }
    }

    /// Default session config at the driver's preferred frame size
    pub fn preferred_config(&self, sample_rate: u32) -> SessionConfig {
        SessionConfig {
            frame_size: self.preferred_frame_size,
            sample_rate,
            ..Default::default()
        }
    }
}

/// Something that calls `on_frame_ready` once per frame period
pub trait FrameSource: Send {
    /// Capabilities of this source
    fn info(&self) -> DriverInfo;

    /// Begin delivering frames to `handle`
    fn start(&mut self, handle: FrameHandle) -> EngineResult<()>;

    /// Stop delivering frames; safe to call when already stopped
    fn stop(&mut self);

    /// Whether frames are currently being delivered
    fn is_running(&self) -> bool;
}

/// Signal synthesized by the simulated driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Waveform {
    Silence,
    Constant { amplitude: f32 },
    Sine { frequency_hz: f32, amplitude: f32 },
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Sine {
            frequency_hz: 440.0,
            amplitude: 0.5,
        }
    }
}

/// Simulated driver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedDriverConfig {
    pub sample_rate: u32,
    pub waveform: Waveform,
    /// Sleep one frame period between callbacks; false runs flat out
    pub paced: bool,
}

impl Default for SimulatedDriverConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            waveform: Waveform::default(),
            paced: true,
        }
    }
}

/// Software frame source for development and tests
pub struct SimulatedDriver {
    config: SimulatedDriverConfig,
    thread: Option<JoinHandle<()>>,
    shutdown_flag: Arc<AtomicBool>,
    frames_delivered: Arc<AtomicU64>,
}

impl SimulatedDriver {
    pub fn new(config: SimulatedDriverConfig) -> Self {
        Self {
            config,
            thread: None,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            frames_delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Frames handed to the exchange since creation
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }

    fn driver_main(
        handle: FrameHandle,
        config: SimulatedDriverConfig,
        shutdown: Arc<AtomicBool>,
        delivered: Arc<AtomicU64>,
    ) {
        let frame_size = handle.frame_size();
        // Allocate once; the loop below only reuses these
        let mut input = vec![0.0_f32; frame_size];
        let mut output = vec![0.0_f32; frame_size];
        let mut oscillator = Oscillator::new(config.waveform, config.sample_rate);
        let period = Duration::from_secs_f64(frame_size as f64 / config.sample_rate as f64);

        info!(frame_size, paced = config.paced, "Simulated driver thread started");

        let mut slot = SlotIndex::Zero;
        let mut next_deadline = Instant::now() + period;

        while !shutdown.load(Ordering::SeqCst) {
            oscillator.fill(&mut input);
            handle.on_frame_ready(slot, &input, &mut output);
            delivered.fetch_add(1, Ordering::Relaxed);
            slot = slot.other();

            if config.paced {
                let now = Instant::now();
                if next_deadline > now {
                    thread::sleep(next_deadline - now);
                    next_deadline += period;
                } else {
                    // Fell behind; resync instead of bursting to catch up
                    next_deadline = now + period;
                }
            } else {
                thread::yield_now();
            }
        }

        debug!("Simulated driver thread exiting");
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new(SimulatedDriverConfig::default())
    }
}

impl FrameSource for SimulatedDriver {
    fn info(&self) -> DriverInfo {
        DriverInfo {
            name: "Simulation ASIO".to_string(),
            input_channels: 2,
            output_channels: 2,
            min_frame_size: 256,
            max_frame_size: 2048,
            preferred_frame_size: 1024,
            granularity: 256,
        }
    }

    fn start(&mut self, handle: FrameHandle) -> EngineResult<()> {
        if self.thread.is_some() {
            warn!("Simulated driver already running");
            return Err(EngineError::AlreadyRunning);
        }

        self.shutdown_flag.store(false, Ordering::SeqCst);
        let shutdown = Arc::clone(&self.shutdown_flag);
        let delivered = Arc::clone(&self.frames_delivered);
        let config = self.config;

        let thread = thread::Builder::new()
            .name("antiphase-driver".into())
            .spawn(move || Self::driver_main(handle, config, shutdown, delivered))
            .map_err(|e| EngineError::ThreadSpawnError(e.to_string()))?;

        self.thread = Some(thread);
        Ok(())
    }

    fn stop(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            info!(frames = self.frames_delivered(), "Simulated driver stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for SimulatedDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Phase-continuous waveform generator
struct Oscillator {
    waveform: Waveform,
    phase: f32,
    phase_step: f32,
}

impl Oscillator {
    fn new(waveform: Waveform, sample_rate: u32) -> Self {
        let phase_step = match waveform {
            Waveform::Sine { frequency_hz, .. } => {
                2.0 * std::f32::consts::PI * frequency_hz / sample_rate as f32
            }
            _ => 0.0,
        };
        Self {
            waveform,
            phase: 0.0,
            phase_step,
        }
    }

    fn fill(&mut self, block: &mut [f32]) {
        match self.waveform {
            Waveform::Silence => block.fill(0.0),
            Waveform::Constant { amplitude } => block.fill(amplitude),
            Waveform::Sine { amplitude, .. } => {
                for sample in block.iter_mut() {
                    *sample = amplitude * self.phase.sin();
                    self.phase = (self.phase + self.phase_step) % std::f32::consts::TAU;
                }
            }
        }
    }
}
