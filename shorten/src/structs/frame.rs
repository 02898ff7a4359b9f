use anyhow::Result;

use crate::structs::channel::ChannelHistory;
use crate::utils::errors::BufferError;

/// One block of interleaved 16-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub channels: usize,

    /// Samples per channel.
    pub block_size: usize,

    /// Interleaved samples, `samples[i * channels + c]`.
    pub samples: Vec<i16>,
}

impl DecodedFrame {
    /// Interleaves the current block of every channel, saturating each
    /// sample to the 16-bit range.
    pub fn interleave(history: &[ChannelHistory], block_size: usize) -> Result<Self> {
        let channels = history.len();
        let len = channels * block_size;

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|_| BufferError::Allocation {
                what: "output frame",
                requested: len,
            })?;

        let blocks: Vec<&[i32]> = history.iter().map(|h| h.block(block_size)).collect();
        for i in 0..block_size {
            for block in &blocks {
                samples.push(clip_i16(block[i]));
            }
        }

        Ok(Self {
            channels,
            block_size,
            samples,
        })
    }

    /// Samples of channel `c` in order.
    pub fn channel(&self, c: usize) -> impl Iterator<Item = i16> + '_ {
        self.samples.iter().skip(c).step_by(self.channels.max(1)).copied()
    }
}

#[inline(always)]
fn clip_i16(sample: i32) -> i16 {
    sample.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[test]
fn test_interleave_saturates() {
    let mut left = ChannelHistory::new(3, 3, 0, 0).unwrap();
    left.block_mut(3).copy_from_slice(&[1, 40000, -3]);
    let mut right = ChannelHistory::new(3, 3, 0, 0).unwrap();
    right.block_mut(3).copy_from_slice(&[-1, -40000, 32767]);

    let frame = DecodedFrame::interleave(&[left, right], 3).unwrap();

    assert_eq!(frame.channels, 2);
    assert_eq!(frame.block_size, 3);
    assert_eq!(frame.samples, [1, -1, 32767, -32768, -3, 32767]);
    assert_eq!(frame.channel(1).collect::<Vec<_>>(), [-1, -32768, 32767]);
}

#[test]
fn test_interleave_shrunk_block() {
    let mut mono = ChannelHistory::new(3, 4, 0, 0).unwrap();
    mono.block_mut(4).copy_from_slice(&[5, 6, 7, 8]);

    let frame = DecodedFrame::interleave(&[mono], 2).unwrap();
    assert_eq!(frame.samples, [5, 6]);
}
