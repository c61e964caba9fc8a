//! # Spectral Window Module
//!
//! Precomputed Hann taper for the analysis buffer and the bin range that the peak
//! search is restricted to. Both are computed once at startup and never change.

use crate::error::ConfigError;
use crate::tuning;
use std::f32::consts::PI;

/// Periodic Hann window: `w[i] = 0.5 * (1 - cos(2*pi*i / len))` for `i` in `0..len`.
///
/// The endpoint of the cosine period is excluded, so the first coefficient is 0 and
/// the last one is close to, but not exactly, 0.
#[derive(Debug, Clone)]
pub struct HannWindow {
    coefficients: Vec<f32>,
}

impl HannWindow {
    /// Precomputes a periodic Hann window, `0.5 * (1 - cos(2πi / len))`.
    ///
    /// # Arguments
    /// * `len` - Analysis buffer length `L`
    ///
    /// # Returns
    /// * A window whose first coefficient is 0 and whose peak of 1 sits at `len / 2`
    pub fn new(len: usize) -> Self {
        let coefficients = (0..len)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / len as f32).cos()))
            .collect();
        Self { coefficients }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Returns a windowed copy of `samples`.
    pub fn apply(&self, samples: &[f32]) -> Vec<f32> {
        samples
            .iter()
            .zip(&self.coefficients)
            .map(|(s, w)| s * w)
            .collect()
    }

    /// Writes the windowed `samples` into `out` without allocating.
    ///
    /// Only the overlapping prefix of `samples`, `out` and the window is touched.
    pub fn apply_to(&self, samples: &[f32], out: &mut [f32]) {
        for ((o, s), w) in out.iter_mut().zip(samples).zip(&self.coefficients) {
            *o = s * w;
        }
    }
}

/// Bins `[min_bin, max_bin)` searched for the spectral peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRange {
    pub min_bin: usize,
    pub max_bin: usize,
}

impl AnalysisRange {
    /// Derives the bin range for notes `min_note..=max_note`, padded by one semitone
    /// on each side and clamped to `[0, len / 2]`.
    ///
    /// An empty range can never produce a detection, so it is rejected here rather
    /// than discovered on the first analysis cycle.
    ///
    /// # Arguments
    /// * `min_note`, `max_note` - Inclusive semitone range of interest
    /// * `d_freq` - Spectral bin width in Hz
    /// * `len` - Analysis buffer length `L`
    ///
    /// # Returns
    /// * The range, or [`ConfigError::NoteOrder`] / [`ConfigError::EmptyRange`]
    pub fn from_notes(
        min_note: i32,
        max_note: i32,
        d_freq: f64,
        len: usize,
    ) -> Result<Self, ConfigError> {
        if min_note > max_note {
            return Err(ConfigError::NoteOrder {
                min: min_note,
                max: max_note,
            });
        }
        let nyquist_bin = len / 2;
        let clamp = |bin: f64| -> usize {
            if bin.is_finite() {
                bin.clamp(0.0, nyquist_bin as f64) as usize
            } else {
                nyquist_bin
            }
        };

        let min_bin = clamp(tuning::semitone_to_bin_index((min_note - 1) as f64, d_freq).floor());
        let max_bin = clamp(tuning::semitone_to_bin_index((max_note + 1) as f64, d_freq).ceil());

        if max_bin <= min_bin {
            return Err(ConfigError::EmptyRange { min_bin, max_bin });
        }
        Ok(Self { min_bin, max_bin })
    }

    pub fn len(&self) -> usize {
        self.max_bin - self.min_bin
    }

    pub fn is_empty(&self) -> bool {
        self.max_bin <= self.min_bin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_hann_shape() {
        assert_eq!(HannWindow::new(16384).len(), 16384);

        let len = 64;
        let window = HannWindow::new(len);
        let w = window.coefficients();

        assert_eq!(w.len(), len);
        assert!(w[0].abs() < 1e-7);
        // Peak sits at the middle for the periodic form.
        assert!((w[len / 2] - 1.0).abs() < 1e-6);
        // Symmetric around len/2, which leaves the last sample short of zero.
        assert!((w[1] - w[len - 1]).abs() < 1e-6);
        assert!(w[len - 1] > 0.0);
    }

    #[test]
    fn apply_does_not_touch_input() {
        let window = HannWindow::new(8);
        let samples = vec![2.0f32; 8];
        let windowed = window.apply(&samples);

        assert_eq!(samples, vec![2.0f32; 8]);
        assert_eq!(windowed.len(), 8);
        assert_eq!(windowed[0], 0.0);
        assert!((windowed[4] - 2.0).abs() < 1e-6);

        let mut out = vec![0.0f32; 8];
        window.apply_to(&samples, &mut out);
        assert_eq!(out, windowed);
    }

    #[test]
    fn default_range() {
        let len = 16384;
        let d_freq = 100_000.0 / len as f64;
        let range = AnalysisRange::from_notes(60, 69, d_freq, len).unwrap();

        assert!(range.min_bin < range.max_bin);
        assert!(range.max_bin <= len / 2);
        // B3 (246.9 Hz) and A#4 (466.2 Hz) at ~6.1 Hz per bin.
        assert_eq!(range.min_bin, 40);
        assert_eq!(range.max_bin, 77);
    }

    #[test]
    fn range_clamps_to_nyquist() {
        // Notes well above Nyquist collapse onto len/2.
        let result = AnalysisRange::from_notes(120, 127, 1.0, 1024);
        assert_eq!(
            result,
            Err(ConfigError::EmptyRange {
                min_bin: 512,
                max_bin: 512
            })
        );
    }

    #[test]
    fn inverted_notes_rejected() {
        assert_eq!(
            AnalysisRange::from_notes(70, 60, 1.0, 4096),
            Err(ConfigError::NoteOrder { min: 70, max: 60 })
        );
    }

    #[test]
    fn single_note_range_is_not_empty() {
        let range = AnalysisRange::from_notes(69, 69, 1.0, 4096).unwrap();
        assert!(!range.is_empty());
        assert!(range.min_bin <= 415 && range.max_bin >= 467);
    }
}
