//! Phase Inverter
//!
//! The realtime transform: every output sample is the input sample scaled by
//! the negated gain. No clamping or saturation happens here; a gain of 2.0
//! on a full-scale input yields a sample of magnitude 2.0.

use crate::processor::{AudioProcessor, ProcessContext};

/// Lowest accepted inversion gain
pub const MIN_GAIN: f32 = 0.0;

/// Highest accepted inversion gain
pub const MAX_GAIN: f32 = 2.0;

/// Gain used when none is supplied
pub const DEFAULT_GAIN: f32 = 1.0;

/// Clamp a requested gain into `[MIN_GAIN, MAX_GAIN]`
///
/// NaN maps to `MIN_GAIN` so a garbage control value mutes the output
/// instead of poisoning every sample.
#[inline]
pub fn clamp_gain(gain: f32) -> f32 {
    if gain.is_nan() {
        return MIN_GAIN;
    }
    gain.clamp(MIN_GAIN, MAX_GAIN)
}

/// Inversion gain, always within `[MIN_GAIN, MAX_GAIN]`
///
/// The inner value is private; every constructor goes through [`clamp_gain`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Gain(f32);

impl Gain {
    pub fn new(value: f32) -> Self {
        Self(clamp_gain(value))
    }

    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self(DEFAULT_GAIN)
    }
}

impl From<f32> for Gain {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// Gain-scaled phase inverter
#[derive(Debug, Clone, Default)]
pub struct PhaseInverter {
    gain: Gain,
}

impl PhaseInverter {
    pub fn new(gain: Gain) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn set_gain(&mut self, gain: Gain) {
        self.gain = gain;
    }

    /// Write `output[i] = input[i] * -gain` over the common length
    #[inline]
    pub fn invert(&self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        let factor = -self.gain.value();
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = sample * factor;
        }
    }
}

impl AudioProcessor for PhaseInverter {
    fn process(&mut self, input: &[f32], output: &mut [f32], _context: &ProcessContext) {
        self.invert(input, output);
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "Phase Inverter"
    }
}
