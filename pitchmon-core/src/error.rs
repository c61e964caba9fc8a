//! # Error Types
//!
//! Errors are split by when they can happen:
//! - [`ConfigError`] is raised while building the detector, before any stream is opened.
//! - [`CaptureError`] comes from the audio source and is surfaced to the caller as-is.
//!
//! Transient analysis conditions (silence, a zero-frequency peak) are not errors at all;
//! they only suppress the report for that cycle.

use thiserror::Error;

/// Invalid startup parameters. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,
    #[error("capture block size must be greater than zero")]
    ZeroBlockSize,
    #[error("analysis block count must be greater than zero")]
    ZeroBlockCount,
    #[error(
        "analysis buffer of {block_size} x {block_count} samples is too large \
         (limit {limit} samples)"
    )]
    BufferTooLarge {
        block_size: usize,
        block_count: usize,
        limit: usize,
    },
    #[error("reporting interval must be at least one cycle")]
    ZeroReportInterval,
    #[error("minimum note {min} is above maximum note {max}")]
    NoteOrder { min: i32, max: i32 },
    #[error(
        "note range covers no spectral bins (bins {min_bin}..{max_bin}); \
         check the note range against the sample rate"
    )]
    EmptyRange { min_bin: usize, max_bin: usize },
    #[error("unknown note name: {0:?}")]
    UnknownNote(String),
}

/// Failures of the audio capture collaborator.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no input device available")]
    NoInputDevice,
    #[error("input device does not support {requested} Hz (supported ranges: {supported})")]
    UnsupportedSampleRate { requested: u32, supported: String },
    #[error("input device offers no i16 or f32 sample format at {0} Hz")]
    UnsupportedFormat(u32),
    #[error("failed to query input configs: {0}")]
    Configs(#[from] cpal::SupportedStreamConfigsError),
    #[error("failed to build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("input stream closed")]
    StreamClosed,
    #[error("input device error: {0}")]
    Device(String),
}

/// Top-level error for the pitch pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("block has {actual} samples, expected {expected}")]
    BlockLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
