//! # Detector Configuration
//!
//! Startup parameters for the pitch monitor. Nothing here is persisted; the CLI maps
//! its flags onto a [`DetectorConfig`] and the detector validates it before the audio
//! stream is opened.

use crate::error::ConfigError;
use crate::window::AnalysisRange;

/// Default lowest note of interest (C4).
pub const DEFAULT_MIN_NOTE: i32 = 60;
/// Default highest note of interest (A4).
pub const DEFAULT_MAX_NOTE: i32 = 69;
/// Default capture sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 100_000;
/// Default samples per capture block.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;
/// Default number of capture blocks in the analysis buffer.
pub const DEFAULT_BLOCK_COUNT: usize = 16;
/// Largest analysis buffer accepted, in samples (2^24, about three minutes at 100 kHz).
pub const MAX_BUFFER_LEN: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Lowest note (semitone number) the peak search covers.
    pub min_note: i32,
    /// Highest note (semitone number) the peak search covers.
    pub max_note: i32,
    pub sample_rate: u32,
    /// Samples delivered per capture read.
    pub block_size: usize,
    /// Capture blocks kept in the analysis buffer.
    pub block_count: usize,
    /// Cycles before the first report. `None` means one full buffer (`block_count`).
    pub report_after: Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_note: DEFAULT_MIN_NOTE,
            max_note: DEFAULT_MAX_NOTE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            block_count: DEFAULT_BLOCK_COUNT,
            report_after: None,
        }
    }
}

impl DetectorConfig {
    /// Analysis buffer length `L`.
    ///
    /// Saturates instead of overflowing; [`validate`](Self::validate) rejects any
    /// length above [`MAX_BUFFER_LEN`].
    pub fn buffer_len(&self) -> usize {
        self.block_size.saturating_mul(self.block_count)
    }

    /// Width of one spectral bin in Hz (`sample_rate / L`).
    pub fn frequency_resolution(&self) -> f64 {
        self.sample_rate as f64 / self.buffer_len() as f64
    }

    /// Number of cycles after which results start being reported.
    pub fn report_interval(&self) -> u64 {
        self.report_after.unwrap_or(self.block_count as u64)
    }

    /// Checks every parameter and returns the bin range they produce.
    pub fn validate(&self) -> Result<AnalysisRange, ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.block_count == 0 {
            return Err(ConfigError::ZeroBlockCount);
        }
        match self.block_size.checked_mul(self.block_count) {
            Some(len) if len <= MAX_BUFFER_LEN => {}
            _ => {
                return Err(ConfigError::BufferTooLarge {
                    block_size: self.block_size,
                    block_count: self.block_count,
                    limit: MAX_BUFFER_LEN,
                });
            }
        }
        if self.report_interval() == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }
        AnalysisRange::from_notes(
            self.min_note,
            self.max_note,
            self.frequency_resolution(),
            self.buffer_len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.buffer_len(), 16384);
        assert_eq!(config.frequency_resolution(), 6.103515625);
        assert_eq!(config.report_interval(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_report_interval() {
        let config = DetectorConfig {
            report_after: Some(3),
            ..Default::default()
        };
        assert_eq!(config.report_interval(), 3);
    }

    #[test]
    fn zero_parameters_rejected() {
        let zero_rate = DetectorConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert_eq!(zero_rate.validate(), Err(ConfigError::ZeroSampleRate));

        let zero_block = DetectorConfig {
            block_size: 0,
            ..Default::default()
        };
        assert_eq!(zero_block.validate(), Err(ConfigError::ZeroBlockSize));

        let zero_count = DetectorConfig {
            block_count: 0,
            ..Default::default()
        };
        assert_eq!(zero_count.validate(), Err(ConfigError::ZeroBlockCount));

        let zero_interval = DetectorConfig {
            report_after: Some(0),
            ..Default::default()
        };
        assert_eq!(zero_interval.validate(), Err(ConfigError::ZeroReportInterval));
    }

    #[test]
    fn oversized_buffer_rejected_without_overflow() {
        let overflowing = DetectorConfig {
            block_size: usize::MAX / 2,
            block_count: 4,
            ..Default::default()
        };
        assert_eq!(overflowing.buffer_len(), usize::MAX);
        assert!(matches!(
            overflowing.validate(),
            Err(ConfigError::BufferTooLarge {
                block_count: 4,
                ..
            })
        ));

        let too_long = DetectorConfig {
            block_size: MAX_BUFFER_LEN,
            block_count: 2,
            ..Default::default()
        };
        assert!(matches!(
            too_long.validate(),
            Err(ConfigError::BufferTooLarge { .. })
        ));

        let at_limit = DetectorConfig {
            block_size: MAX_BUFFER_LEN / 2,
            block_count: 2,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn range_above_nyquist_rejected() {
        let config = DetectorConfig {
            min_note: 120,
            max_note: 125,
            sample_rate: 8000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRange { .. })));
    }
}
