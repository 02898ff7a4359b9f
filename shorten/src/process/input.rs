//! Pending input between decode calls.

use anyhow::{Result, bail};
use log::trace;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::BufferError;

pub const DEFAULT_FRAME_SIZE: usize = 1024;
pub const MIN_FRAME_SIZE: usize = 16;

/// Bytes received but not yet consumed, plus the bit offset into the first
/// of them where parsing resumes.
///
/// The buffer accepts input up to a working frame size and only hands out a
/// reader once that much is available or the caller flushes.
#[derive(Debug)]
pub struct InputBuffer {
    data: Vec<u8>,
    start: usize,
    frame_size: usize,
    bit_offset: u32,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_SIZE)
    }
}

impl InputBuffer {
    pub fn new(frame_size: usize) -> Self {
        Self {
            data: Vec::new(),
            start: 0,
            frame_size: frame_size.max(MIN_FRAME_SIZE),
            bit_offset: 0,
        }
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.data.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn bit_offset(&self) -> u32 {
        self.bit_offset
    }

    /// Appends as much of `input` as fits below the working frame size and
    /// returns the number of bytes taken.
    pub fn append(&mut self, input: &[u8]) -> Result<usize> {
        let take = input.len().min(self.frame_size.saturating_sub(self.len()));
        if take == 0 {
            return Ok(0);
        }

        if self.data.len() + take > self.data.capacity() && self.start > 0 {
            self.data.drain(..self.start);
            self.start = 0;
        }

        self.data
            .try_reserve(take)
            .map_err(|_| BufferError::Allocation {
                what: "bitstream buffer",
                requested: self.data.len() + take,
            })?;
        self.data.extend_from_slice(&input[..take]);

        Ok(take)
    }

    /// Whether a decode pass may run.
    pub fn is_ready(&self, flush: bool) -> bool {
        flush || self.len() >= self.frame_size
    }

    /// Reader over the pending bytes, positioned at the resume offset.
    pub fn reader(&self) -> Result<BsIoSliceReader<'_>> {
        let mut reader = BsIoSliceReader::from_slice(&self.data[self.start..]);
        reader.skip_n(self.bit_offset)?;
        Ok(reader)
    }

    /// Drops the bytes fully read by a pass that ended at bit `position` of
    /// the pending data. The remaining bits become the resume offset.
    pub fn consume(&mut self, position: u64) -> Result<usize> {
        let bytes = (position / 8) as usize;
        if bytes > self.len() {
            let available = self.len();
            self.clear();
            bail!(BufferError::Overread(bytes - available));
        }

        self.start += bytes;
        self.bit_offset = (position % 8) as u32;
        if self.start == self.data.len() {
            self.data.clear();
            self.start = 0;
        }

        trace!(
            "consumed {bytes} bytes, {} pending, resume at bit {}",
            self.len(),
            self.bit_offset
        );

        Ok(bytes)
    }

    /// Doubles the working frame size after a pass ran out of data.
    pub fn grow(&mut self) {
        self.frame_size = self.frame_size.saturating_mul(2);
        trace!("working frame size now {}", self.frame_size);
    }

    /// Drops all pending input.
    pub fn clear(&mut self) {
        self.data.clear();
        self.start = 0;
        self.bit_offset = 0;
    }
}
