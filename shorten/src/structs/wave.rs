//! Canonical WAVE header embedded in the leading verbatim block.
//!
//! Only the `fmt ` sub-chunk is consulted; the remaining RIFF structure is
//! skipped.

use std::io::{self, SeekFrom};

use anyhow::{Result, bail};
use bitstream_io::{BitRead, BitReader, LittleEndian};
use log::{debug, info};

use crate::utils::errors::WaveError;

pub const WAVE_FORMAT_PCM: u16 = 0x0001;

const RIFF_TAG: u32 = u32::from_le_bytes(*b"RIFF");
const WAVE_TAG: u32 = u32::from_le_bytes(*b"WAVE");
const FMT_TAG: u32 = u32::from_le_bytes(*b"fmt ");

/// Minimum length of a PCM `fmt ` sub-chunk.
const FMT_CHUNK_SIZE: u32 = 16;

/// PCM parameters taken from the embedded WAVE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

type LeReader<'a> = BitReader<io::Cursor<&'a [u8]>, LittleEndian>;

impl WaveFormat {
    pub fn parse(header: &[u8]) -> Result<Self> {
        let reader: &mut LeReader = &mut BitReader::new(io::Cursor::new(header));

        if read_le32(reader)? != RIFF_TAG {
            bail!(WaveError::MissingRiffTag);
        }

        skip_bytes(reader, 4)?; // chunk size

        if read_le32(reader)? != WAVE_TAG {
            bail!(WaveError::MissingWaveTag);
        }

        let len = loop {
            let (Ok(tag), Ok(len)) = (read_le32(reader), read_le32(reader)) else {
                bail!(WaveError::MissingFmtChunk);
            };

            if tag == FMT_TAG {
                break len;
            }

            debug!("Skipping {len} byte sub-chunk {:?}", tag.to_le_bytes());
            skip_bytes(reader, len as u64)?;
        };

        if len < FMT_CHUNK_SIZE {
            bail!(WaveError::FmtChunkTooShort(len));
        }

        let wave_format = read_le16(reader)?;
        if wave_format != WAVE_FORMAT_PCM {
            bail!(WaveError::UnsupportedFormat(wave_format));
        }

        skip_bytes(reader, 2)?; // channels, already known from the stream header
        let sample_rate = read_le32(reader)?;
        skip_bytes(reader, 4)?; // byte rate
        skip_bytes(reader, 2)?; // block align
        let bits_per_sample = read_le16(reader)?;

        if bits_per_sample != 16 {
            bail!(WaveError::UnsupportedBitsPerSample(bits_per_sample));
        }

        if len > FMT_CHUNK_SIZE {
            info!("{} header bytes unparsed", len - FMT_CHUNK_SIZE);
        }

        Ok(Self {
            sample_rate,
            bits_per_sample,
        })
    }
}

fn read_le32(reader: &mut LeReader) -> Result<u32, WaveError> {
    reader
        .read_unsigned_var::<u32>(32)
        .map_err(|_| WaveError::MissingFmtChunk)
}

fn read_le16(reader: &mut LeReader) -> Result<u16, WaveError> {
    reader
        .read_unsigned_var::<u16>(16)
        .map_err(|_| WaveError::MissingFmtChunk)
}

fn skip_bytes(reader: &mut LeReader, n: u64) -> Result<(), WaveError> {
    reader
        .seek_bits(SeekFrom::Current((n as i64) << 3))
        .map(|_| ())
        .map_err(|_| WaveError::MissingFmtChunk)
}
