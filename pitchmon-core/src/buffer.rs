//! # Sliding Sample Buffer
//!
//! Fixed-length analysis history. Every new capture block shifts the oldest
//! `block_size` samples out and lands at the end, so the buffer always holds the
//! most recent `block_size * block_count` samples, oldest first.
//!
//! The shift is a plain `copy_within` over the whole buffer. At the sizes used here
//! (around 2^14 samples) that is cheap and keeps the snapshot contiguous for the FFT.

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct SlidingBuffer {
    samples: Vec<f32>,
    block_size: usize,
}

impl SlidingBuffer {
    /// Creates a zero-filled buffer of `block_size * block_count` samples.
    ///
    /// # Arguments
    /// * `block_size` - Samples per pushed block
    /// * `block_count` - Blocks of history kept
    pub fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            samples: vec![0.0; block_size * block_count],
            block_size,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Shifts in one block of samples.
    pub fn push(&mut self, block: &[f32]) -> Result<()> {
        let tail = self.make_room(block.len())?;
        tail.copy_from_slice(block);
        Ok(())
    }

    /// Shifts in one block of raw 16-bit PCM, keeping the integer scale.
    pub fn push_pcm(&mut self, block: &[i16]) -> Result<()> {
        let tail = self.make_room(block.len())?;
        for (slot, &sample) in tail.iter_mut().zip(block) {
            *slot = f32::from(sample);
        }
        Ok(())
    }

    /// Current contents, oldest sample first.
    pub fn snapshot(&self) -> &[f32] {
        &self.samples
    }

    /// Drops the oldest block and returns the tail slots for the new one.
    fn make_room(&mut self, incoming: usize) -> Result<&mut [f32]> {
        if incoming != self.block_size {
            return Err(Error::BlockLength {
                expected: self.block_size,
                actual: incoming,
            });
        }
        let len = self.samples.len();
        if self.block_size < len {
            self.samples.copy_within(self.block_size.., 0);
        }
        Ok(&mut self.samples[len - self.block_size..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let buffer = SlidingBuffer::new(4, 3);
        assert_eq!(buffer.len(), 12);
        assert!(buffer.snapshot().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn push_shifts_left_and_appends() {
        let mut buffer = SlidingBuffer::new(3, 4);
        buffer.push(&[1.0, 2.0, 3.0]).unwrap();
        buffer.push(&[4.0, 5.0, 6.0]).unwrap();

        let before = buffer.snapshot().to_vec();
        let block = [7.0, 8.0, 9.0];
        buffer.push(&block).unwrap();
        let after = buffer.snapshot();

        let b = block.len();
        let l = after.len();
        assert_eq!(&after[l - b..], &block);
        assert_eq!(&after[..l - b], &before[b..]);
        assert_eq!(after, &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn oldest_samples_fall_off() {
        let mut buffer = SlidingBuffer::new(2, 2);
        for i in 0..5 {
            let v = i as f32;
            buffer.push(&[v, v]).unwrap();
        }
        assert_eq!(buffer.snapshot(), &[3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn pcm_keeps_integer_scale() {
        let mut buffer = SlidingBuffer::new(3, 2);
        buffer.push_pcm(&[i16::MIN, 0, i16::MAX]).unwrap();
        assert_eq!(buffer.snapshot(), &[0.0, 0.0, 0.0, -32768.0, 0.0, 32767.0]);
    }

    #[test]
    fn single_block_buffer_is_replaced() {
        let mut buffer = SlidingBuffer::new(2, 1);
        buffer.push(&[1.0, 2.0]).unwrap();
        buffer.push(&[3.0, 4.0]).unwrap();
        assert_eq!(buffer.snapshot(), &[3.0, 4.0]);
    }

    #[test]
    fn wrong_block_length_is_rejected() {
        let mut buffer = SlidingBuffer::new(4, 2);
        let err = buffer.push(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::BlockLength {
                expected: 4,
                actual: 2
            }
        ));
        // A rejected block leaves the history untouched.
        assert!(buffer.snapshot().iter().all(|&s| s == 0.0));
    }
}
