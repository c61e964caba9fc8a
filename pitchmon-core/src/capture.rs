//! # Capture Loop
//!
//! Drives acquisition and analysis: read one block from the source, run one detector
//! cycle, repeat until the source reports itself inactive. The activity check happens
//! before every read, so an inactive source is never read from.
//!
//! Read failures are returned to the caller untouched. Retrying or reopening the
//! device is not this loop's job. A source that went inactive because its device
//! failed still ends the run with that failure, not with `Ok`.

use crate::audio::AudioSource;
use crate::error::Result;
use crate::pitch::PitchDetector;
use crate::Reporter;

/// Counters for a finished capture run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Blocks read and analyzed.
    pub blocks: u64,
    /// Detections handed to the reporter.
    pub reports: u64,
}

/// Runs the acquisition-analysis cycle until `source` goes inactive.
///
/// # Arguments
/// * `source` - Open audio source; it is not closed here
/// * `detector` - Detector whose block size matches the source
/// * `reporter` - Sink for reported detections
///
/// # Returns
/// * Counters for the run, or the first read, block or device error
pub fn run<S, R>(source: &mut S, detector: &mut PitchDetector, reporter: &mut R) -> Result<LoopStats>
where
    S: AudioSource + ?Sized,
    R: Reporter + ?Sized,
{
    let mut block = vec![0i16; detector.block_size()];
    let mut stats = LoopStats::default();

    tracing::debug!(
        sample_rate = source.sample_rate(),
        block_size = block.len(),
        "capture loop started"
    );

    while source.is_active() {
        source.read_block(&mut block)?;
        let cycle = detector.on_pcm_block(&block, reporter)?;
        stats.blocks += 1;
        if cycle.reported {
            stats.reports += 1;
        }
    }

    if let Some(err) = source.take_error() {
        tracing::debug!(blocks = stats.blocks, "capture loop stopped by a device error");
        return Err(err.into());
    }

    tracing::debug!(blocks = stats.blocks, reports = stats.reports, "capture loop finished");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CaptureError, Error};
    use crate::{DetectionResult, DetectorConfig};

    /// Source that counts reads and fails on demand.
    struct ScriptedSource {
        blocks_left: usize,
        reads: usize,
        fail_on_read: Option<usize>,
        /// Device failure raised after this many reads, flipping the source inactive.
        fault_after: Option<usize>,
        fault: Option<CaptureError>,
        block_size: usize,
    }

    impl AudioSource for ScriptedSource {
        fn sample_rate(&self) -> u32 {
            100_000
        }

        fn block_size(&self) -> usize {
            self.block_size
        }

        fn is_active(&self) -> bool {
            self.blocks_left > 0
        }

        fn read_block(&mut self, block: &mut [i16]) -> crate::Result<()> {
            self.reads += 1;
            if self.fail_on_read == Some(self.reads) {
                return Err(CaptureError::Device("unplugged".to_string()).into());
            }
            self.blocks_left -= 1;
            if self.fault_after == Some(self.reads) {
                self.fault = Some(CaptureError::Device("stream error".to_string()));
                self.blocks_left = 0;
            }
            block.fill(0);
            Ok(())
        }

        fn close(&mut self) {
            self.blocks_left = 0;
        }

        fn take_error(&mut self) -> Option<CaptureError> {
            self.fault.take()
        }
    }

    fn source(blocks: usize) -> ScriptedSource {
        ScriptedSource {
            blocks_left: blocks,
            reads: 0,
            fail_on_read: None,
            fault_after: None,
            fault: None,
            block_size: 1024,
        }
    }

    #[test]
    fn inactive_source_is_never_read() {
        let mut detector = PitchDetector::new(&DetectorConfig::default()).unwrap();
        let mut source = source(0);
        let mut reported = Vec::new();
        let mut reporter = |r: &DetectionResult| reported.push(r.clone());

        let stats = run(&mut source, &mut detector, &mut reporter).unwrap();

        assert!(reported.is_empty());
        assert_eq!(source.reads, 0);
        assert_eq!(stats, LoopStats::default());
        assert_eq!(detector.cycles(), 0);
    }

    #[test]
    fn runs_until_source_goes_inactive() {
        let mut detector = PitchDetector::new(&DetectorConfig::default()).unwrap();
        let mut source = source(5);
        let mut reporter = |_: &DetectionResult| {};

        let stats = run(&mut source, &mut detector, &mut reporter).unwrap();

        assert_eq!(source.reads, 5);
        assert_eq!(stats.blocks, 5);
        assert_eq!(detector.cycles(), 5);
    }

    #[test]
    fn read_errors_are_surfaced() {
        let mut detector = PitchDetector::new(&DetectorConfig::default()).unwrap();
        let mut source = ScriptedSource {
            fail_on_read: Some(3),
            ..source(10)
        };
        let mut reporter = |_: &DetectionResult| {};

        let result = run(&mut source, &mut detector, &mut reporter);

        assert!(matches!(
            result,
            Err(Error::Capture(CaptureError::Device(ref msg))) if msg == "unplugged"
        ));
        // No retry after the failure.
        assert_eq!(source.reads, 3);
        assert_eq!(detector.cycles(), 2);
    }

    #[test]
    fn device_failure_between_reads_is_an_error() {
        let mut detector = PitchDetector::new(&DetectorConfig::default()).unwrap();
        let mut source = ScriptedSource {
            fault_after: Some(2),
            ..source(10)
        };
        let mut reporter = |_: &DetectionResult| {};

        let result = run(&mut source, &mut detector, &mut reporter);

        assert!(matches!(
            result,
            Err(Error::Capture(CaptureError::Device(ref msg))) if msg == "stream error"
        ));
        assert_eq!(source.reads, 2);
        assert_eq!(detector.cycles(), 2);
    }
}
