//! # Audio Capture Module
//!
//! Sources of fixed-size blocks of 16-bit PCM for the capture loop.
//!
//! ## Sources
//! - [`CpalSource`]: the default input device through CPAL (Cross-Platform Audio Library)
//! - [`ToneSource`]: a synthetic sine generator, for running without a microphone
//!
//! Opening a source is its constructor and closing happens on `Drop`, so the device is
//! released on every exit path of the loop, including early returns and panics.

use crate::error::{CaptureError, Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// How many finished blocks may wait between the audio callback and the reader.
const BLOCK_QUEUE_DEPTH: usize = 64;

/// How often a blocked read wakes up to check whether the stream is still alive.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The capture collaborator: a blocking source of mono i16 blocks.
pub trait AudioSource {
    fn sample_rate(&self) -> u32;

    /// Samples per block returned by [`read_block`](Self::read_block).
    fn block_size(&self) -> usize;

    /// Whether another block can be read.
    fn is_active(&self) -> bool;

    /// Blocks until exactly `block.len()` samples have been written into `block`.
    ///
    /// `block.len()` must equal [`block_size`](Self::block_size).
    fn read_block(&mut self, block: &mut [i16]) -> Result<()>;

    /// Stops the stream. Further calls are no-ops.
    fn close(&mut self);

    /// Takes the device failure that made the source go inactive, if there was one.
    ///
    /// Sources that can only end cleanly keep the default.
    fn take_error(&mut self) -> Option<CaptureError> {
        None
    }
}

/// First error reported by a stream's error callback, shared with the reader.
#[derive(Debug, Clone, Default)]
struct DeviceFault(Arc<Mutex<Option<String>>>);

impl DeviceFault {
    /// Keeps the first message; later errors are usually fallout from it.
    fn record(&self, message: String) {
        if let Ok(mut slot) = self.0.lock() {
            slot.get_or_insert(message);
        }
    }

    fn take(&self) -> Option<CaptureError> {
        self.0
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .map(CaptureError::Device)
    }
}

fn check_block_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::BlockLength { expected, actual });
    }
    Ok(())
}

/// Live microphone input from the default CPAL input device.
pub struct CpalSource {
    stream: Option<cpal::Stream>,
    blocks: Receiver<Vec<i16>>,
    active: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    fault: DeviceFault,
    sample_rate: u32,
    block_size: usize,
}

impl CpalSource {
    /// Opens the default input device at `sample_rate` and starts streaming.
    ///
    /// This function:
    /// 1. Selects the default input device
    /// 2. Picks an input config that supports `sample_rate` exactly (mono and i16 preferred)
    /// 3. Starts a stream whose callback re-blocks samples into `block_size` chunks
    pub fn open(sample_rate: u32, block_size: usize) -> std::result::Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        match device.name() {
            Ok(name) => tracing::info!(device = %name, "using audio input device"),
            Err(err) => tracing::warn!(%err, "input device has no readable name"),
        }

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let supported = find_supported_config(configs, sample_rate)?
            .with_sample_rate(cpal::SampleRate(sample_rate));
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        tracing::info!(
            sample_rate,
            channels = config.channels,
            format = ?sample_format,
            block_size,
            "opening input stream"
        );

        let (sender, blocks) = crossbeam_channel::bounded(BLOCK_QUEUE_DEPTH);
        let active = Arc::new(AtomicBool::new(true));
        let dropped = Arc::new(AtomicU64::new(0));
        let fault = DeviceFault::default();
        let stream_state = StreamState {
            sender,
            active: Arc::clone(&active),
            dropped: Arc::clone(&dropped),
            fault: fault.clone(),
            block_size,
        };

        let stream = match sample_format {
            SampleFormat::I16 => build_stream::<i16>(&device, &config, stream_state)?,
            SampleFormat::F32 => build_stream::<f32>(&device, &config, stream_state)?,
            _ => return Err(CaptureError::UnsupportedFormat(sample_rate)),
        };
        stream.play()?;

        Ok(Self {
            stream: Some(stream),
            blocks,
            active,
            dropped,
            fault,
            sample_rate,
            block_size,
        })
    }
}

impl AudioSource for CpalSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn is_active(&self) -> bool {
        self.stream.is_some() && self.active.load(Ordering::SeqCst)
    }

    fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        check_block_len(self.block_size, block.len())?;
        loop {
            match self.blocks.recv_timeout(POLL_INTERVAL) {
                Ok(data) => {
                    block.copy_from_slice(&data);
                    return Ok(());
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !self.is_active() {
                        return Err(self.closed_error().into());
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.active.store(false, Ordering::SeqCst);
                    return Err(self.closed_error().into());
                }
            }
        }
    }

    fn close(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                tracing::warn!(%err, "error pausing input stream");
            }
            drop(stream);
            let dropped = self.dropped.load(Ordering::Relaxed);
            if dropped > 0 {
                tracing::warn!(dropped, "blocks dropped because the analysis fell behind");
            }
            tracing::info!("input stream closed");
        }
    }

    fn take_error(&mut self) -> Option<CaptureError> {
        self.fault.take()
    }
}

impl CpalSource {
    /// The device error behind a dead stream, or a plain close.
    fn closed_error(&self) -> CaptureError {
        self.fault.take().unwrap_or(CaptureError::StreamClosed)
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Everything the realtime callback owns.
struct StreamState {
    sender: Sender<Vec<i16>>,
    active: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    fault: DeviceFault,
    block_size: usize,
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    state: StreamState,
) -> std::result::Result<cpal::Stream, CaptureError>
where
    T: SizedSample + Send + 'static,
    i16: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));
    let StreamState {
        sender,
        active,
        dropped,
        fault,
        block_size,
    } = state;
    let error_flag = Arc::clone(&active);

    // This buffer accumulates audio data from the callback until a block is complete.
    let mut pending: Vec<i16> = Vec::with_capacity(block_size * 2);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            // Keep the first channel of each frame.
            pending.extend(data.chunks(channels).map(|frame| frame[0].to_sample::<i16>()));

            while block_size > 0 && pending.len() >= block_size {
                let block: Vec<i16> = pending.drain(..block_size).collect();
                match sender.try_send(block) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        active.store(false, Ordering::SeqCst);
                        pending.clear();
                        return;
                    }
                }
            }
        },
        move |err| {
            tracing::error!(%err, "an error occurred on the input stream");
            fault.record(err.to_string());
            error_flag.store(false, Ordering::SeqCst);
        },
        None,
    )?;
    Ok(stream)
}

/// Picks the input config for `sample_rate`.
///
/// Only ranges that contain the rate exactly are considered, since the detector's
/// frequency resolution is derived from it. Among those: mono first, then i16 over
/// f32, then the fewest channels.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    sample_rate: u32,
) -> std::result::Result<SupportedStreamConfigRange, CaptureError> {
    let supported = describe_ranges(&configs);
    let in_range: Vec<_> = configs
        .into_iter()
        .filter(|c| c.min_sample_rate().0 <= sample_rate && sample_rate <= c.max_sample_rate().0)
        .collect();
    if in_range.is_empty() {
        return Err(CaptureError::UnsupportedSampleRate {
            requested: sample_rate,
            supported,
        });
    }

    in_range
        .into_iter()
        .filter(|c| matches!(c.sample_format(), SampleFormat::I16 | SampleFormat::F32))
        .min_by_key(|c| {
            (
                c.channels() != 1,
                c.sample_format() != SampleFormat::I16,
                c.channels(),
            )
        })
        .ok_or(CaptureError::UnsupportedFormat(sample_rate))
}

fn describe_ranges(configs: &[SupportedStreamConfigRange]) -> String {
    if configs.is_empty() {
        return "none".to_string();
    }
    configs
        .iter()
        .map(|c| {
            format!(
                "{}-{} Hz x{} {:?}",
                c.min_sample_rate().0,
                c.max_sample_rate().0,
                c.channels(),
                c.sample_format()
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Synthetic sine input with a continuous phase across blocks.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f64,
    amplitude: f64,
    sample_rate: u32,
    block_size: usize,
    phase: f64,
    remaining: Option<u64>,
    realtime: bool,
    started: Option<Instant>,
    samples_emitted: u64,
    closed: bool,
}

impl ToneSource {
    /// A never-ending sine at `frequency` Hz with peak `amplitude` (in i16 units).
    pub fn new(frequency: f64, amplitude: i16, sample_rate: u32, block_size: usize) -> Self {
        Self {
            frequency,
            amplitude: f64::from(amplitude),
            sample_rate,
            block_size,
            phase: 0.0,
            remaining: None,
            realtime: false,
            started: None,
            samples_emitted: 0,
            closed: false,
        }
    }

    /// Stops the source after `blocks` reads.
    pub fn with_block_limit(mut self, blocks: u64) -> Self {
        self.remaining = Some(blocks);
        self
    }

    /// Paces reads to the wall clock, like a real device would.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    fn wait_for_wall_clock(&mut self) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let due = Duration::from_secs_f64(self.samples_emitted as f64 / self.sample_rate as f64);
        if let Some(wait) = due.checked_sub(started.elapsed()) {
            thread::sleep(wait);
        }
    }
}

impl AudioSource for ToneSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn is_active(&self) -> bool {
        !self.closed && self.remaining != Some(0)
    }

    fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        check_block_len(self.block_size, block.len())?;
        if !self.is_active() {
            return Err(CaptureError::StreamClosed.into());
        }

        let step = std::f64::consts::TAU * self.frequency / self.sample_rate as f64;
        for sample in block.iter_mut() {
            *sample = (self.amplitude * self.phase.sin()).round() as i16;
            self.phase = (self.phase + step) % std::f64::consts::TAU;
        }
        self.samples_emitted += block.len() as u64;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        if self.realtime {
            self.wait_for_wall_clock();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
