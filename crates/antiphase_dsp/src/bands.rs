//! Coarse Band Energy Estimator
//!
//! This is NOT a spectral transform. A frame is cut into contiguous sample
//! ranges ("bands"), each range's mean squared amplitude is weighted by a
//! linear roll-off, and the result is normalized against the loudest band.
//! It gives a lively display for a spectrum-style widget at almost no cost.
//!
//! # Phases
//!
//! ```text
//!   lock ─▶ accumulate_band_energies() ─▶ unlock ─▶ normalize_band_energies()
//!           (one scan, writes f64 scratch)           (max, sqrt, ×100)
//! ```

use std::ops::Range;

/// Number of bands reported when the caller does not ask for a count
pub const DEFAULT_NUM_BANDS: usize = 32;

/// Smoothing factor for band decay (0.0 = instant, 1.0 = no decay)
const BAND_DECAY: f32 = 0.7;

/// Attack factor for band rise (higher = faster response to new peaks)
const BAND_ATTACK: f32 = 0.5;

/// Sample range covered by `band`
///
/// Every band is `len / num_bands` samples wide. The last band runs to the
/// end of the frame and absorbs the remainder. When `num_bands > len` the
/// width is zero, so all bands but the last are empty.
#[inline]
pub fn band_range(band: usize, num_bands: usize, len: usize) -> Range<usize> {
    if num_bands == 0 {
        return 0..0;
    }
    let width = len / num_bands;
    let start = (band * width).min(len);
    let end = if band + 1 == num_bands {
        len
    } else {
        ((band + 1) * width).min(len)
    };
    start..end
}

/// Linear high-band roll-off: 1.0 for band 0 down towards 0.5
#[inline]
pub fn band_weight(band: usize, num_bands: usize) -> f64 {
    1.0 - 0.5 * band as f64 / num_bands as f64
}

/// Weighted mean-square energy of each band, written into `energies`
///
/// The band count is `energies.len()`. Non-finite samples contribute zero
/// energy but still count towards their band's length.
pub fn accumulate_band_energies(samples: &[f32], energies: &mut [f64]) {
    let num_bands = energies.len();
    for (band, energy) in energies.iter_mut().enumerate() {
        let range = band_range(band, num_bands, samples.len());
        let count = range.len();
        if count == 0 {
            *energy = 0.0;
            continue;
        }

        let sum: f64 = samples[range]
            .iter()
            .filter(|s| s.is_finite())
            .map(|&s| (s as f64) * (s as f64))
            .sum();

        *energy = (sum / count as f64) * band_weight(band, num_bands);
    }
}

/// Normalize weighted energies to 0-100 for display
///
/// Each band is divided by the loudest one and square-rooted. If every band
/// is silent the output is all zeros.
pub fn normalize_band_energies(energies: &[f64], out: &mut [f32]) {
    debug_assert_eq!(energies.len(), out.len());
    let max = energies.iter().copied().fold(0.0_f64, f64::max);

    if max <= 0.0 {
        out.fill(0.0);
        return;
    }

    for (dst, &energy) in out.iter_mut().zip(energies) {
        *dst = ((energy / max).sqrt() * 100.0) as f32;
    }
}

/// One-shot band energies of a block of samples
pub fn band_energies(samples: &[f32], num_bands: usize) -> Vec<f32> {
    let mut energies = vec![0.0_f64; num_bands];
    accumulate_band_energies(samples, &mut energies);
    let mut out = vec![0.0_f32; num_bands];
    normalize_band_energies(&energies, &mut out);
    out
}

/// Display smoothing for successive band vectors
///
/// Uses asymmetric attack/decay for snappy response but smooth falloff.
#[derive(Debug, Clone)]
pub struct BandSmoother {
    smoothed: Vec<f32>,
}

impl BandSmoother {
    pub fn new(num_bands: usize) -> Self {
        Self {
            smoothed: vec![0.0; num_bands],
        }
    }

    /// Fold a new raw band vector in and return the smoothed values
    ///
    /// A vector of a different length resets the smoother to that length.
    pub fn update(&mut self, raw: &[f32]) -> &[f32] {
        if raw.len() != self.smoothed.len() {
            self.smoothed = vec![0.0; raw.len()];
        }

        for (current, &value) in self.smoothed.iter_mut().zip(raw) {
            if value > *current {
                *current += (value - *current) * BAND_ATTACK;
            } else {
                *current = *current * BAND_DECAY + value * (1.0 - BAND_DECAY);
            }
        }

        &self.smoothed
    }

    pub fn values(&self) -> &[f32] {
        &self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_partition_frame() {
        let ranges: Vec<_> = (0..32).map(|b| band_range(b, 32, 1024)).collect();
        assert_eq!(ranges[0], 0..32);
        assert_eq!(ranges[31], 992..1024);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_last_band_absorbs_remainder() {
        // 1000 / 32 = 31 samples per band, 8 left over
        assert_eq!(band_range(30, 32, 1000), 930..961);
        assert_eq!(band_range(31, 32, 1000), 961..1000);
    }

    #[test]
    fn test_more_bands_than_samples() {
        assert_eq!(band_range(0, 32, 8), 0..0);
        assert_eq!(band_range(10, 32, 8), 0..0);
        assert_eq!(band_range(31, 32, 8), 0..8);

        let bands = band_energies(&[0.5; 8], 32);
        assert_eq!(bands.len(), 32);
        assert!(bands[..31].iter().all(|&b| b == 0.0));
        assert_eq!(bands[31], 100.0);
    }

    #[test]
    fn test_weights_roll_off() {
        assert_eq!(band_weight(0, 32), 1.0);
        assert_eq!(band_weight(16, 32), 0.75);
        assert!(band_weight(31, 32) > 0.5);
        for b in 1..32 {
            assert!(band_weight(b, 32) < band_weight(b - 1, 32));
        }
    }

    #[test]
    fn test_silence_is_all_zero() {
        let bands = band_energies(&[0.0; 1024], DEFAULT_NUM_BANDS);
        assert_eq!(bands.len(), DEFAULT_NUM_BANDS);
        assert!(bands.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_loud_band_reads_100() {
        let mut samples = vec![0.0_f32; 1024];
        // Band 5 covers samples 160..192
        samples[160..192].fill(0.8);

        let bands = band_energies(&samples, 32);
        assert_eq!(bands[5], 100.0);
        for (i, &b) in bands.iter().enumerate() {
            if i != 5 {
                assert_eq!(b, 0.0, "band {i}");
            }
        }
    }

    #[test]
    fn test_weighting_and_sqrt_compression() {
        // Equal energy everywhere: only the weighting separates the bands
        let bands = band_energies(&[0.5; 1024], 32);
        assert_eq!(bands[0], 100.0);

        let expected = (band_weight(16, 32)).sqrt() * 100.0;
        assert!((bands[16] as f64 - expected).abs() < 1e-3);

        for pair in bands.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn test_non_finite_contributes_zero() {
        let mut samples = vec![0.0_f32; 64];
        samples[0..32].fill(f32::NAN);
        samples[32..64].fill(0.5);

        let mut energies = [0.0_f64; 2];
        accumulate_band_energies(&samples, &mut energies);
        assert_eq!(energies[0], 0.0);
        assert!(energies[1] > 0.0);

        let mut half_bad = vec![0.5_f32; 32];
        half_bad[..16].fill(f32::INFINITY);
        let mut energy = [0.0_f64; 1];
        accumulate_band_energies(&half_bad, &mut energy);
        // 16 valid samples of 0.25 averaged over 32
        assert!((energy[0] - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_huge_samples_stay_finite() {
        let bands = band_energies(&[f32::MAX; 128], 4);
        assert!(bands.iter().all(|b| b.is_finite()));
        assert_eq!(bands[0], 100.0);
    }

    #[test]
    fn test_zero_bands() {
        assert!(band_energies(&[0.5; 16], 0).is_empty());
    }

    #[test]
    fn test_smoother_attack_and_decay() {
        let mut smoother = BandSmoother::new(2);

        let first = smoother.update(&[100.0, 0.0]).to_vec();
        assert_eq!(first, vec![50.0, 0.0]);

        let second = smoother.update(&[0.0, 0.0]).to_vec();
        assert!((second[0] - 35.0).abs() < 1e-4);

        smoother.reset();
        assert!(smoother.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_smoother_resizes() {
        let mut smoother = BandSmoother::new(4);
        assert_eq!(smoother.update(&[10.0; 8]).len(), 8);
    }
}
