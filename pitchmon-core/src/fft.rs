//! # Fast Fourier Transform (FFT) Module
//!
//! One-sided magnitude spectrum of a real buffer using RustFFT.
//!
//! The transform is planned once for the analysis length and all working memory is
//! allocated up front, so computing a spectrum on every capture block does not touch
//! the allocator.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Planned forward FFT producing `len / 2 + 1` magnitude bins.
pub struct MagnitudeSpectrum {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl MagnitudeSpectrum {
    /// Plans a forward transform and allocates its working buffers.
    ///
    /// # Arguments
    /// * `len` - Input length `L`; the output has `L / 2 + 1` bins
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); len],
            scratch,
            magnitudes: vec![0.0; len / 2 + 1],
        }
    }

    /// Length of the input the transform was planned for.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of output bins, DC through Nyquist.
    pub fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }

    /// Transforms `signal` and returns the magnitude of bins `0..=len/2`.
    ///
    /// A shorter `signal` is zero padded; extra samples are ignored.
    ///
    /// # Arguments
    /// * `signal` - Real, already windowed samples
    ///
    /// # Returns
    /// * Magnitudes `|X[k]|` for `k` in `0..=len/2`, borrowed until the next call
    pub fn compute(&mut self, signal: &[f32]) -> &[f32] {
        let used = signal.len().min(self.buffer.len());
        for (slot, &sample) in self.buffer.iter_mut().zip(&signal[..used]) {
            *slot = Complex::new(sample, 0.0);
        }
        for slot in self.buffer.iter_mut().skip(used) {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (mag, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *mag = c.norm(); // .norm() is sqrt(re^2 + im^2)
        }
        &self.magnitudes
    }

    /// Magnitudes from the most recent [`compute`](Self::compute) call.
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }
}
