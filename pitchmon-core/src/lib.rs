// pitchmon-core/src/lib.rs

//! The core logic for the pitch monitor.
//! This crate turns a stream of 16-bit PCM blocks into "nearest note" reports:
//! sliding-window buffering, Hann windowing, FFT, a peak search restricted to a
//! note range, and frequency to note conversion. It prints nothing itself;
//! results go to a [`Reporter`] supplied by the caller.

pub mod audio;
pub mod buffer;
pub mod capture;
pub mod config;
pub mod error;
pub mod fft;
pub mod pitch;
pub mod tuning;
pub mod window;

pub use config::DetectorConfig;
pub use error::{CaptureError, ConfigError, Error, Result};
pub use pitch::PitchDetector;

use serde::Serialize;

/// Represents the result of a single analysis cycle that found a note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    /// Frequency of the spectral peak in Hz (a bin center, so a multiple of the resolution).
    pub frequency: f64,
    /// The continuous semitone number of `frequency` (69.0 = A4).
    pub semitone: f64,
    /// The nearest whole semitone.
    pub nearest: i32,
    /// The name of the nearest note, e.g. "A4".
    pub note_name: String,
    /// Index of the peak bin in the magnitude spectrum.
    pub peak_bin: usize,
}

impl DetectionResult {
    /// How far the peak sits from the nearest note, in cents.
    pub fn cents_deviation(&self) -> f64 {
        tuning::cents_between(
            self.frequency,
            tuning::semitone_to_frequency(self.nearest as f64),
        )
    }
}

/// Receives detections that are due for display.
pub trait Reporter {
    fn report(&mut self, result: &DetectionResult);
}

impl<F> Reporter for F
where
    F: FnMut(&DetectionResult),
{
    fn report(&mut self, result: &DetectionResult) {
        (self)(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_from_nearest_note() {
        let result = DetectionResult {
            frequency: 445.0,
            semitone: tuning::frequency_to_semitone(445.0).unwrap(),
            nearest: 69,
            note_name: "A4".to_string(),
            peak_bin: 445,
        };
        let cents = result.cents_deviation();
        assert!((cents - 19.56).abs() < 0.01, "got {cents}");
    }

    #[test]
    fn closures_are_reporters() {
        let mut seen = Vec::new();
        {
            let mut reporter = |r: &DetectionResult| seen.push(r.note_name.clone());
            let result = DetectionResult {
                frequency: 440.0,
                semitone: 69.0,
                nearest: 69,
                note_name: "A4".to_string(),
                peak_bin: 440,
            };
            reporter.report(&result);
        }
        assert_eq!(seen, vec!["A4".to_string()]);
    }
}
