//! Presentation of detections on stdout.
//!
//! Both reporters flush after every line so output stays live when piped.

use pitchmon_core::{DetectionResult, Reporter};
use serde::Serialize;
use std::io::Write;

/// Prints the one-line startup diagnostic.
///
/// # Arguments
/// * `stdout` - Destination of the console table
/// * `stderr` - Destination of the line in JSON mode, where stdout carries reports only
/// * `json` - Whether reports are line-delimited JSON
/// * `sample_rate` - Capture rate in Hz
/// * `resolution` - Spectral bin width in Hz
pub fn write_startup<O: Write, E: Write>(
    stdout: &mut O,
    stderr: &mut E,
    json: bool,
    sample_rate: u32,
    resolution: f64,
) -> std::io::Result<()> {
    let line = format!("sampling at {sample_rate} Hz with max resolution of {resolution} Hz");
    if json {
        writeln!(stderr, "{line}")?;
        stderr.flush()
    } else {
        writeln!(stdout, "{line}")?;
        writeln!(stdout)?;
        stdout.flush()
    }
}

/// Fixed-width console table, one line per detection.
pub struct ConsoleReporter<W: Write> {
    out: W,
    failed: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, result: &DetectionResult) {
        let written = writeln!(
            self.out,
            "frequency: {:8.0} Hz     note: {:>3} ",
            result.frequency, result.note_name
        )
        .and_then(|_| self.out.flush());
        note_failure(&mut self.failed, written);
    }
}

#[derive(Serialize)]
struct ReportLine<'a> {
    #[serde(flatten)]
    result: &'a DetectionResult,
    cents: f64,
}

/// Line-delimited JSON, for feeding other tools.
pub struct JsonReporter<W: Write> {
    out: W,
    failed: bool,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, result: &DetectionResult) {
        let line = ReportLine {
            result,
            cents: result.cents_deviation(),
        };
        let written = serde_json::to_writer(&mut self.out, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        note_failure(&mut self.failed, written);
    }
}

/// Logs the first write failure only; a closed stdout would otherwise warn on every cycle.
fn note_failure(failed: &mut bool, written: std::io::Result<()>) {
    if let Err(err) = written {
        if !*failed {
            tracing::warn!(%err, "failed to write report");
            *failed = true;
        }
    }
}
