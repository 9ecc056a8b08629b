//! Antiphase Core - Realtime Frame Exchange
//!
//! This crate provides the session that sits between a realtime audio driver
//! and non-realtime consumers:
//! - Double-buffered frame exchange guarded by one short-held lock
//! - Gain-scaled phase inversion inside the driver callback
//! - RMS level and coarse band energy reads that never see a torn frame
//! - Start/stop/gain lifecycle with events over a channel
//! - A simulated driver and a meter monitor thread
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Consumer Threads                        │
//! │  start/stop/set_gain ──▶ AudioSession ◀── level/spectrum    │
//! │                              │   ▲                          │
//! │              MeterMonitor ───┘   └── events (crossbeam)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ Arc<Exchange>
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Driver Thread                           │
//! │  FrameSource ──FrameHandle──▶ on_frame_ready(slot 0|1)      │
//! │               lock ▸ load ▸ invert ▸ mark ready ▸ unlock    │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod buffer;
mod config;
mod driver;
mod error;
mod exchange;
mod message;
mod monitor;
mod session;

pub use buffer::{FrameBuffer, FrameBufferPair, SlotIndex};
pub use config::{SessionConfig, MAX_FRAME_SIZE};
pub use driver::{DriverInfo, FrameSource, SimulatedDriver, SimulatedDriverConfig, Waveform};
pub use error::{EngineError, EngineResult};
pub use exchange::{Exchange, FrameHandle, FrameSnapshot};
pub use message::Event;
pub use monitor::{MeterMonitor, MonitorConfig};
pub use session::{AudioSession, GainOutcome, ProcessingState, StartOutcome, StopOutcome};

// Re-export DSP types for convenience
pub use antiphase_dsp::{Gain, DEFAULT_GAIN, DEFAULT_NUM_BANDS, MAX_GAIN, MIN_GAIN};
