//! Per-channel prediction context.

use anyhow::Result;

use crate::utils::errors::BufferError;

/// Decoded samples and running means of one channel.
///
/// The sample buffer holds `nwrap` samples carried over from the previous
/// block followed by the current block. Logical index `i` of the block lives
/// at `nwrap + i`, so indices down to `-nwrap` address the carried-over
/// context.
#[derive(Debug, Clone)]
pub struct ChannelHistory {
    decoded: Vec<i32>,
    nwrap: usize,
    means: Vec<i32>,
}

impl ChannelHistory {
    pub fn new(nwrap: usize, block_size: usize, nmean: i32, initial_mean: i32) -> Result<Self> {
        let len = nwrap + block_size;
        let mut decoded = Vec::new();
        decoded
            .try_reserve_exact(len)
            .map_err(|_| BufferError::Allocation {
                what: "decoded samples",
                requested: len,
            })?;
        decoded.resize(len, 0);

        let nmeans = nmean.max(1) as usize;
        let mut means = Vec::new();
        means
            .try_reserve_exact(nmeans)
            .map_err(|_| BufferError::Allocation {
                what: "mean history",
                requested: nmeans,
            })?;
        means.resize(nmeans, initial_mean);

        Ok(Self {
            decoded,
            nwrap,
            means,
        })
    }

    #[inline(always)]
    pub fn nwrap(&self) -> usize {
        self.nwrap
    }

    /// Whole buffer, carried-over context first. Block sample `i` is at
    /// `nwrap() + i`.
    #[inline(always)]
    pub fn samples_mut(&mut self) -> &mut [i32] {
        &mut self.decoded
    }

    /// Sample at logical index `i`, `-nwrap <= i < block_size`.
    #[inline(always)]
    pub fn at(&self, i: isize) -> i32 {
        self.decoded[(self.nwrap as isize + i) as usize]
    }

    pub fn block(&self, block_size: usize) -> &[i32] {
        &self.decoded[self.nwrap..self.nwrap + block_size]
    }

    pub fn block_mut(&mut self, block_size: usize) -> &mut [i32] {
        &mut self.decoded[self.nwrap..self.nwrap + block_size]
    }

    pub fn means(&self) -> &[i32] {
        &self.means
    }

    /// Offset subtracted from the prediction, estimated from the means of
    /// previous blocks.
    pub fn coffset(&self, version: u8, nmean: i32, bitshift: u32) -> i32 {
        if nmean == 0 {
            return self.means[0];
        }

        let mut sum: i32 = if version < 2 { 0 } else { nmean / 2 };
        for mean in self.means.iter().take(nmean.max(0) as usize) {
            sum = sum.wrapping_add(*mean);
        }

        let coffset = sum.wrapping_div(nmean);
        if version >= 2 {
            coffset >> bitshift.min(1)
        } else {
            coffset
        }
    }

    /// Pushes the mean of the just decoded block, dropping the oldest one.
    pub fn update_means(&mut self, version: u8, nmean: i32, block_size: usize, bitshift: u32) {
        if nmean <= 0 {
            return;
        }

        let bias = if version < 2 { 0 } else { (block_size / 2) as i32 };
        let sum = self
            .block(block_size)
            .iter()
            .fold(bias, |acc, s| acc.wrapping_add(*s));
        let mean = sum.wrapping_div(block_size as i32);

        let nmean = nmean as usize;
        self.means.copy_within(1..nmean, 0);
        self.means[nmean - 1] = if version < 2 {
            mean
        } else {
            mean.wrapping_shl(bitshift)
        };
    }

    /// Carries the last `nwrap` samples of the block over as context for the
    /// next one.
    pub fn wrap(&mut self, block_size: usize) {
        self.decoded
            .copy_within(block_size..block_size + self.nwrap, 0);
    }

    /// Restores the low bits removed by the encoder.
    pub fn apply_bitshift(&mut self, block_size: usize, bitshift: u32) {
        if bitshift == 0 {
            return;
        }

        for sample in self.block_mut(block_size) {
            *sample = sample.wrapping_shl(bitshift);
        }
    }
}
