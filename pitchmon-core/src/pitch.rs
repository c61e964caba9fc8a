//! # Pitch Detection Module
//!
//! Spectral peak picking over a restricted note range.
//!
//! Each capture block runs one analysis cycle:
//! 1. Shift the block into the sliding buffer
//! 2. Apply the Hann window
//! 3. Compute the one-sided magnitude spectrum
//! 4. Find the strongest bin inside the configured note range
//! 5. Convert that bin to a frequency and the nearest note
//! 6. Report once enough cycles have gone by to fill the buffer

use crate::buffer::SlidingBuffer;
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::fft::MagnitudeSpectrum;
use crate::tuning;
use crate::window::{AnalysisRange, HannWindow};
use crate::{DetectionResult, Reporter};

/// Outcome of a single analysis cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    /// Frequency of the peak bin in Hz, or 0 when there was no usable peak.
    pub frequency: f64,
    /// The detected note, absent for degenerate cycles (silence, DC peak).
    pub detection: Option<DetectionResult>,
    /// Whether the detection was handed to the reporter.
    pub reported: bool,
}

/// Returns the index of the strongest bin in `range`.
///
/// Scans left to right and keeps the first maximum, so ties resolve to the lowest
/// index. Bins past the end of `magnitudes` are ignored. Returns `None` when no bin
/// in range has a positive magnitude.
///
/// # Arguments
/// * `magnitudes` - One-sided magnitude spectrum
/// * `range` - Bins `[min_bin, max_bin)` to search
///
/// # Returns
/// * Index of the first maximum, or `None` for a flat zero spectrum
pub fn peak_bin(magnitudes: &[f32], range: &AnalysisRange) -> Option<usize> {
    let end = range.max_bin.min(magnitudes.len());
    let start = range.min_bin.min(end);

    let mut best: Option<(usize, f32)> = None;
    for (offset, &magnitude) in magnitudes[start..end].iter().enumerate() {
        let is_better = match best {
            Some((_, best_magnitude)) => magnitude > best_magnitude,
            None => magnitude > 0.0,
        };
        if is_better {
            best = Some((start + offset, magnitude));
        }
    }
    best.map(|(bin, _)| bin)
}

/// Owns the full analysis state for the capture loop.
pub struct PitchDetector {
    buffer: SlidingBuffer,
    window: HannWindow,
    spectrum: MagnitudeSpectrum,
    windowed: Vec<f32>,
    range: AnalysisRange,
    d_freq: f64,
    cycles: u64,
    report_interval: u64,
}

impl PitchDetector {
    /// Builds a detector, failing fast on any invalid parameter.
    ///
    /// # Arguments
    /// * `config` - Note range, sample rate and buffer geometry
    ///
    /// # Returns
    /// * A detector with a zeroed buffer and a planned transform, or
    ///   [`Error::Config`](crate::Error::Config) before anything is allocated
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let range = config.validate()?;
        let len = config.buffer_len();
        let d_freq = config.frequency_resolution();

        tracing::debug!(
            len,
            d_freq,
            min_bin = range.min_bin,
            max_bin = range.max_bin,
            report_interval = config.report_interval(),
            "pitch detector ready"
        );

        Ok(Self {
            buffer: SlidingBuffer::new(config.block_size, config.block_count),
            window: HannWindow::new(len),
            spectrum: MagnitudeSpectrum::new(len),
            windowed: vec![0.0; len],
            range,
            d_freq,
            cycles: 0,
            report_interval: config.report_interval(),
        })
    }

    pub fn range(&self) -> AnalysisRange {
        self.range
    }

    /// Spectral bin width in Hz.
    pub fn frequency_resolution(&self) -> f64 {
        self.d_freq
    }

    pub fn block_size(&self) -> usize {
        self.buffer.block_size()
    }

    /// Analysis cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Magnitude spectrum from the latest cycle.
    pub fn magnitudes(&self) -> &[f32] {
        self.spectrum.magnitudes()
    }

    /// Runs one cycle on a block of float samples.
    pub fn on_block<R: Reporter + ?Sized>(
        &mut self,
        block: &[f32],
        reporter: &mut R,
    ) -> Result<Cycle> {
        self.buffer.push(block)?;
        Ok(self.analyze(reporter))
    }

    /// Runs one cycle on a block of raw 16-bit PCM.
    ///
    /// # Arguments
    /// * `block` - Exactly `block_size` samples, in i16 units
    /// * `reporter` - Receives the detection once the reporting threshold is met
    ///
    /// # Returns
    /// * What the cycle found, or [`Error::BlockLength`](crate::Error::BlockLength)
    ///   without counting a cycle
    pub fn on_pcm_block<R: Reporter + ?Sized>(
        &mut self,
        block: &[i16],
        reporter: &mut R,
    ) -> Result<Cycle> {
        self.buffer.push_pcm(block)?;
        Ok(self.analyze(reporter))
    }

    fn analyze<R: Reporter + ?Sized>(&mut self, reporter: &mut R) -> Cycle {
        self.window.apply_to(self.buffer.snapshot(), &mut self.windowed);
        let magnitudes = self.spectrum.compute(&self.windowed);

        let peak = peak_bin(magnitudes, &self.range);
        let frequency = peak.map_or(0.0, |bin| bin as f64 * self.d_freq);

        // A zero frequency has no semitone; the cycle still counts but emits nothing.
        let detection = peak.zip(tuning::frequency_to_semitone(frequency)).map(
            |(peak_bin, semitone)| {
                let nearest = semitone.round() as i32;
                DetectionResult {
                    frequency,
                    semitone,
                    nearest,
                    note_name: tuning::semitone_to_name(nearest),
                    peak_bin,
                }
            },
        );

        // Never reset: once the buffer has filled, every cycle reports.
        self.cycles = self.cycles.saturating_add(1);
        let due = self.cycles >= self.report_interval;

        tracing::trace!(cycle = self.cycles, ?peak, frequency, "analysis cycle");

        let reported = match &detection {
            Some(result) if due => {
                reporter.report(result);
                true
            }
            _ => false,
        };

        Cycle {
            frequency,
            detection,
            reported,
        }
    }
}
