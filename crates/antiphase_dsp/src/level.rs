//! RMS Level Meter
//!
//! Split in two phases so the caller can keep its critical section to a
//! single scan: [`RmsAccumulator::accumulate`] runs while the frame is locked,
//! [`RmsAccumulator::percent`] runs after the lock is released.

/// Scale applied to the RMS so a full-scale sine (RMS = 1/√2) reads 100%
pub const SINE_FULL_SCALE: f32 = std::f32::consts::SQRT_2;

/// Running sum of squares over finite samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RmsAccumulator {
    sum_squares: f64,
    valid: usize,
}

impl RmsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block of samples, skipping NaN and infinities
    #[inline]
    pub fn accumulate(&mut self, samples: &[f32]) {
        for &sample in samples {
            if sample.is_finite() {
                let s = sample as f64;
                self.sum_squares += s * s;
                self.valid += 1;
            }
        }
    }

    /// Number of finite samples seen so far
    pub fn valid_count(&self) -> usize {
        self.valid
    }

    /// Root-mean-square of the finite samples, 0.0 if there were none
    pub fn rms(&self) -> f32 {
        if self.valid == 0 {
            return 0.0;
        }
        (self.sum_squares / self.valid as f64).sqrt() as f32
    }

    /// RMS scaled by √2, clamped to 1.0, expressed as 0-100
    pub fn percent(&self) -> f32 {
        let normalized = (self.rms() * SINE_FULL_SCALE).min(1.0);
        normalized * 100.0
    }
}

/// One-shot level of a block of samples in percent
pub fn level_percent(samples: &[f32]) -> f32 {
    let mut acc = RmsAccumulator::new();
    acc.accumulate(samples);
    acc.percent()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * i as f32 / 64.0).sin())
            .collect()
    }

    #[test]
    fn test_silence_is_zero() {
        assert_eq!(level_percent(&[0.0; 1024]), 0.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(level_percent(&[]), 0.0);
    }

    #[test]
    fn test_only_non_finite_is_zero() {
        let samples = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, f32::NAN];
        let mut acc = RmsAccumulator::new();
        acc.accumulate(&samples);
        assert_eq!(acc.valid_count(), 0);
        assert_eq!(acc.percent(), 0.0);
    }

    #[test]
    fn test_full_scale_sine_reads_100() {
        let level = level_percent(&sine(1024, 1.0));
        assert!((level - 100.0).abs() < 0.1, "level = {level}");
    }

    #[test]
    fn test_half_scale_sine_reads_50() {
        let level = level_percent(&sine(1024, 0.5));
        assert!((level - 50.0).abs() < 0.1, "level = {level}");
    }

    #[test]
    fn test_non_finite_samples_are_excluded() {
        let mut samples = vec![0.5_f32; 100];
        let clean = level_percent(&samples);
        samples.extend([f32::NAN, f32::INFINITY]);
        assert_eq!(level_percent(&samples), clean);
    }

    #[test]
    fn test_clamped_at_100() {
        assert_eq!(level_percent(&[2.0; 64]), 100.0);
        assert_eq!(level_percent(&[f32::MAX; 64]), 100.0);
    }

    #[test]
    fn test_accumulate_across_blocks() {
        let mut acc = RmsAccumulator::new();
        acc.accumulate(&[1.0, 1.0]);
        acc.accumulate(&[-1.0, -1.0]);
        assert_eq!(acc.valid_count(), 4);
        assert!((acc.rms() - 1.0).abs() < 1e-6);
    }
}
