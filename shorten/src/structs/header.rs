//! Shorten stream header.
//!
//! The header carries the magic, the format revision, the global stream
//! parameters and a leading verbatim block holding the original WAVE
//! header, from which the sample rate and sample width are taken.

use std::fmt::Display;

use anyhow::{Result, bail};
use log::debug;

use crate::log_or_err;
use crate::process::decode::DecoderState;
use crate::structs::command::{Command, FNSIZE, VERBATIM_BYTE_SIZE, VERBATIM_CKSIZE_SIZE};
use crate::structs::wave::WaveFormat;
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

pub const MAGIC: u32 = u32::from_be_bytes(*b"ajkg");

pub const MAX_CHANNELS: u32 = 8;
pub const MAX_BLOCKSIZE: u32 = 65535;
pub const DEFAULT_BLOCK_SIZE: u32 = 256;

/// Highest format revision the decoder was written against.
pub const MAX_KNOWN_VERSION: u8 = 2;

/// Minimum number of history samples kept per channel.
pub const NWRAP: usize = 3;

pub const TYPESIZE: u32 = 4;
pub const CHANSIZE: u32 = 0;
pub const NSKIPSIZE: u32 = 1;
pub const NMEANSIZE: u32 = 0;

pub const CANONICAL_HEADER_SIZE: u32 = 44;
pub const OUT_BUFFER_SIZE: u32 = 16384;

/// Bias added to every QLPC prediction sum in streams with version > 1.
pub const V2LPCQOFFSET: i32 = 1 << 5;

/// Rice parameter hint for block sizes: `log2(DEFAULT_BLOCK_SIZE)`.
pub fn block_size_hint(block_size: u32) -> u32 {
    block_size.max(1).ilog2()
}

/// Internal sample representation of the compressed audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    /// Signed 16-bit, high byte first.
    S16HL,
    /// Signed 16-bit, low byte first.
    S16LH,
}

impl SampleType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            3 => Some(SampleType::S16HL),
            5 => Some(SampleType::S16LH),
            _ => None,
        }
    }

    /// Initial value of every running-mean slot.
    pub fn initial_mean(self) -> i32 {
        match self {
            SampleType::S16HL | SampleType::S16LH => 0,
        }
    }
}

impl Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleType::S16HL => write!(f, "signed 16-bit big-endian"),
            SampleType::S16LH => write!(f, "signed 16-bit little-endian"),
        }
    }
}

/// Global stream parameters, available once the header has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub version: u8,
    pub sample_type: SampleType,
    pub channels: usize,
    pub block_size: usize,
    pub max_lpc_order: u32,
    /// Number of past block means averaged for the offset, -1 when the
    /// stream predates running means.
    pub nmean: i32,
    pub nwrap: usize,
    pub lpcqoffset: i32,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Raw WAVE header carried in the leading verbatim block.
    pub verbatim_header: Vec<u8>,
}

impl StreamInfo {
    pub fn read(state: &DecoderState, reader: &mut BsIoSliceReader) -> Result<Self> {
        let magic: u32 = reader.get_n(32)?;
        if magic != MAGIC {
            bail!(HeaderError::InvalidMagic(magic));
        }

        let version: u8 = reader.get_n(8)?;

        let type_code = reader.get_adaptive(version, TYPESIZE)?;

        let channels = reader.get_adaptive(version, CHANSIZE)?;
        if channels == 0 {
            bail!(HeaderError::NoChannels);
        }
        if channels > MAX_CHANNELS {
            bail!(HeaderError::TooManyChannels(channels));
        }

        let mut block_size = DEFAULT_BLOCK_SIZE;
        let mut max_lpc_order = 0;
        let mut nmean = -1;

        if version > 0 {
            block_size = reader.get_adaptive(version, block_size_hint(DEFAULT_BLOCK_SIZE))?;
            if block_size == 0 || block_size > MAX_BLOCKSIZE {
                bail!(HeaderError::InvalidBlockSize(block_size));
            }

            max_lpc_order = reader.get_adaptive(version, crate::structs::command::LPCQSIZE)?;

            let value = reader.get_adaptive(version, NMEANSIZE)?;
            if value >= u32::MAX / 4 {
                bail!(HeaderError::NmeanTooLarge(value));
            }
            nmean = value as i32;

            let skip_bytes = reader.get_adaptive(version, NSKIPSIZE)?;
            for _ in 0..skip_bytes {
                reader.skip_n(8)?;
            }
        }

        let nwrap = NWRAP.max(max_lpc_order as usize);
        if (block_size as u64 + nwrap as u64) >= (u32::MAX / 4) as u64 {
            bail!(HeaderError::HistoryTooLarge(block_size as u64 + nwrap as u64));
        }

        let Some(sample_type) = SampleType::from_code(type_code) else {
            bail!(HeaderError::UnknownAudioType(type_code));
        };

        let lpcqoffset = if version > 1 { V2LPCQOFFSET } else { 0 };

        if Command::from_code(reader.get_rice(FNSIZE)?) != Some(Command::Verbatim) {
            bail!(HeaderError::MissingVerbatimHeader);
        }

        let header_size = reader.get_rice(VERBATIM_CKSIZE_SIZE)?;
        if !(CANONICAL_HEADER_SIZE..OUT_BUFFER_SIZE).contains(&header_size) {
            bail!(HeaderError::InvalidHeaderSize(header_size));
        }

        let mut verbatim_header = Vec::with_capacity(header_size as usize);
        for _ in 0..header_size {
            verbatim_header.push(reader.get_rice(VERBATIM_BYTE_SIZE)? as u8);
        }

        let wave = WaveFormat::parse(&verbatim_header)?;

        // raised only for a complete header so a retried parse reports it once
        if version > MAX_KNOWN_VERSION {
            log_or_err!(
                state,
                log::Level::Warn,
                HeaderError::UnexpectedVersion(version)
            );
        }

        debug!(
            "Shorten v{version}: {sample_type}, {channels} channels, block size {block_size}, \
             max LPC order {max_lpc_order}, nmean {nmean}, {} Hz",
            wave.sample_rate
        );

        Ok(Self {
            version,
            sample_type,
            channels: channels as usize,
            block_size: block_size as usize,
            max_lpc_order,
            nmean,
            nwrap,
            lpcqoffset,
            sample_rate: wave.sample_rate,
            bits_per_sample: wave.bits_per_sample,
            verbatim_header,
        })
    }
}
