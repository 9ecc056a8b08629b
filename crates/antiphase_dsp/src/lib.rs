//! Antiphase DSP - Sample Math for the Frame Exchange
//!
//! This crate provides the pure processing pieces used by `antiphase_core`:
//! - Gain-scaled phase inversion (the realtime transform)
//! - RMS level metering with NaN/Inf rejection
//! - Coarse band energy estimation (sample-range binning, not an FFT)
//! - Attack/decay smoothing for band displays
//!
//! # Architecture
//!
//! Nothing here locks or allocates on the per-frame path. The analysis
//! functions are split into an "accumulate" half, meant to run while the
//! caller holds its frame lock, and a "finish" half that runs afterwards.

mod bands;
mod inverter;
mod level;
mod processor;

pub use bands::{
    accumulate_band_energies, band_energies, band_range, band_weight, normalize_band_energies,
    BandSmoother, DEFAULT_NUM_BANDS,
};
pub use inverter::{clamp_gain, Gain, PhaseInverter, DEFAULT_GAIN, MAX_GAIN, MIN_GAIN};
pub use level::{level_percent, RmsAccumulator, SINE_FULL_SCALE};
pub use processor::{AudioProcessor, ProcessContext};
