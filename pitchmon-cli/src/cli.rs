//! Command-line flags for the `pitchmon` binary.

use clap::{ArgAction, Parser};
use pitchmon_core::config::{DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};
use pitchmon_core::{tuning, ConfigError, DetectorConfig};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "pitchmon", version)]
#[command(about = "report the note nearest to the dominant pitch of the audio input")]
pub struct Cli {
    /// lowest note to listen for (name like C4 or Db3, or a semitone number)
    #[arg(long, default_value = "C4", value_parser = parse_note)]
    pub min_note: i32,

    /// highest note to listen for
    #[arg(long, default_value = "A4", value_parser = parse_note)]
    pub max_note: i32,

    /// capture sample rate in Hz
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// samples per capture block
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// capture blocks kept in the analysis buffer
    #[arg(long, default_value_t = DEFAULT_BLOCK_COUNT)]
    pub block_count: usize,

    /// analysis cycles before the first report (defaults to --block-count)
    #[arg(long, value_name = "CYCLES")]
    pub report_after: Option<u64>,

    /// print one JSON object per report instead of the console table
    #[arg(long)]
    pub json: bool,

    /// analyze a generated sine at this frequency instead of the microphone
    #[arg(long, value_name = "HZ")]
    pub simulate: Option<f64>,

    /// stop the simulated input after this many blocks (runs unpaced)
    #[arg(long, value_name = "N", requires = "simulate")]
    pub simulate_blocks: Option<u64>,

    /// more log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            min_note: self.min_note,
            max_note: self.max_note,
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            block_count: self.block_count,
            report_after: self.report_after,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

fn parse_note(input: &str) -> Result<i32, String> {
    tuning::parse_note_name(input).ok_or_else(|| ConfigError::UnknownNote(input.to_string()).to_string())
}
