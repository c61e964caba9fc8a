//! # pitchmon - live pitch monitor
//!
//! Listens to the default input device (or a generated tone) and prints the note
//! nearest to the strongest frequency in the configured note range.
//!
//! ## Architecture
//! - **Capture**: CPAL input stream, re-blocked into fixed-size i16 blocks
//! - **Analysis**: `pitchmon-core` detector, one cycle per block, on the main thread
//! - **Output**: reports on stdout, logs on stderr

mod cli;
mod output;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use output::{ConsoleReporter, JsonReporter};
use pitchmon_core::audio::{CpalSource, ToneSource};
use pitchmon_core::{capture, PitchDetector, Reporter};
use std::io;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Amplitude of the simulated tone, in i16 units.
const SIMULATED_AMPLITUDE: i16 = 8000;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    // Validate everything before touching the audio device.
    let config = cli.detector_config();
    let mut detector = PitchDetector::new(&config).context("invalid configuration")?;
    let range = detector.range();
    tracing::info!(
        min_note = config.min_note,
        max_note = config.max_note,
        min_bin = range.min_bin,
        max_bin = range.max_bin,
        bins = range.len(),
        "analysis range"
    );
    let resolution = detector.frequency_resolution();

    output::write_startup(
        &mut io::stdout(),
        &mut io::stderr(),
        cli.json,
        config.sample_rate,
        resolution,
    )
    .context("failed to write startup diagnostic")?;
    let mut reporter: Box<dyn Reporter> = if cli.json {
        Box::new(JsonReporter::new(io::stdout()))
    } else {
        Box::new(ConsoleReporter::new(io::stdout()))
    };

    let stats = match cli.simulate {
        Some(frequency) => {
            let mut source =
                ToneSource::new(frequency, SIMULATED_AMPLITUDE, config.sample_rate, config.block_size);
            source = match cli.simulate_blocks {
                Some(blocks) => source.with_block_limit(blocks),
                None => source.realtime(true),
            };
            tracing::info!(frequency, "using simulated input");
            capture::run(&mut source, &mut detector, reporter.as_mut())
        }
        None => {
            let mut source = CpalSource::open(config.sample_rate, config.block_size)
                .context("failed to open audio input")?;
            capture::run(&mut source, &mut detector, reporter.as_mut())
        }
    }
    .context("audio capture failed")?;

    tracing::info!(blocks = stats.blocks, reports = stats.reports, "input stream ended");
    Ok(())
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the level from the flags.
fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
