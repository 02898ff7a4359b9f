use anyhow::{Result, bail};
use log::{debug, trace};

use crate::log_or_err;
use crate::process::input::{DEFAULT_FRAME_SIZE, InputBuffer};
use crate::structs::channel::ChannelHistory;
use crate::structs::command::{
    BITSHIFTSIZE, Command, ENERGYSIZE, MIN_COMMAND_BITS, VERBATIM_BYTE_SIZE, VERBATIM_CKSIZE_SIZE,
};
use crate::structs::frame::DecodedFrame;
use crate::structs::header::{MAX_BLOCKSIZE, StreamInfo, block_size_hint};
use crate::structs::predictor::Predictor;
use crate::utils::bitstream_io::{BsIoSliceReader, is_overread};
use crate::utils::errors::{BufferError, CommandError, DecodeError};

/// Largest bitshift for which the sample shift is defined.
pub const MAX_BITSHIFT: u32 = 31;

/// Decoder configuration.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Initial working frame size in bytes. Input is buffered up to this
    /// amount before a pass runs; it doubles whenever a single command
    /// does not fit.
    pub initial_frame_size: usize,

    /// Level at which validation findings become errors.
    pub fail_level: log::Level,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            initial_frame_size: DEFAULT_FRAME_SIZE,
            fail_level: log::Level::Error,
        }
    }
}

/// Outcome of a single [`Decoder::decode`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Input was buffered; nothing was decoded.
    NeedMoreInput,
    /// A pass ran but did not complete a block.
    NoFrame,
    /// One block of all channels was decoded.
    Frame(DecodedFrame),
    /// The stream has ended; input is discarded.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutput {
    /// Bytes taken from the input slice of this call. The rest must be
    /// offered again.
    pub consumed: usize,
    pub status: DecodeStatus,
}

/// Incremental Shorten decoder.
///
/// Feed byte chunks in stream order with `decode(Some(chunk))` and finish
/// with `decode(None)` until it reports [`DecodeStatus::Finished`]. At most
/// one frame is produced per call.
#[derive(Debug)]
pub struct Decoder {
    state: DecoderState,
    input: InputBuffer,
    config: DecoderConfig,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::with_config(DecoderConfig::default())
    }
}

impl Decoder {
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            state: DecoderState::new(config.fail_level),
            input: InputBuffer::new(config.initial_frame_size),
            config,
        }
    }

    /// Decodes the next piece of the stream.
    ///
    /// `None` flushes: whatever is buffered is decoded without waiting for
    /// more input. Any error leaves the decoder failed until [`reset`](Self::reset).
    pub fn decode(&mut self, input: Option<&[u8]>) -> Result<DecodeOutput> {
        if self.state.failed {
            bail!(DecodeError::Failed);
        }

        if self.state.quit_received {
            return Ok(DecodeOutput {
                consumed: input.map_or(0, <[u8]>::len),
                status: DecodeStatus::Finished,
            });
        }

        let flush = input.is_none();
        let consumed = match self.input.append(input.unwrap_or_default()) {
            Ok(consumed) => consumed,
            Err(e) => return Err(self.fail(e)),
        };

        if !self.input.is_ready(flush) {
            return Ok(DecodeOutput {
                consumed,
                status: DecodeStatus::NeedMoreInput,
            });
        }

        match self.run_pass(flush) {
            Ok(status) => Ok(DecodeOutput { consumed, status }),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn run_pass(&mut self, flush: bool) -> Result<DecodeStatus> {
        let mut reader = self.input.reader()?;

        let status = if self.state.header_parsed {
            self.state.decode_block(&mut reader, flush)?
        } else {
            self.state.read_header(&mut reader, flush)?
        };

        let position = reader.position()?;
        self.input.consume(position)?;

        if status == DecodeStatus::NeedMoreInput {
            self.input.grow();
        }

        Ok(status)
    }

    fn fail(&mut self, err: anyhow::Error) -> anyhow::Error {
        let err = if is_overread(&err) {
            BufferError::Truncated(self.input.len()).into()
        } else {
            err
        };

        self.input.clear();
        if !self.state.header_parsed {
            self.state.channels = 0;
        }
        self.state.failed = true;

        err
    }

    /// Returns the decoder to its initial state, keeping the configuration.
    pub fn reset(&mut self) {
        let fail_level = self.state.fail_level;
        self.state = DecoderState::new(fail_level);
        self.input = InputBuffer::new(self.config.initial_frame_size);
    }

    /// Sets the failure level for validation findings.
    ///
    /// - `log::Level::Error`: Only fail on Error level findings (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }

    /// Stream parameters, once the header has been decoded.
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.state.info.as_ref()
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Whether the stream has ended.
    pub fn is_finished(&self) -> bool {
        self.state.quit_received
    }

    /// Buffered bytes not yet consumed.
    pub fn pending_len(&self) -> usize {
        self.input.len()
    }

    pub fn frame_size(&self) -> usize {
        self.input.frame_size()
    }
}

#[derive(Debug)]
pub struct DecoderState {
    pub fail_level: log::Level,

    pub info: Option<StreamInfo>,
    pub channels: usize,
    pub block_size: usize,
    pub version: u8,
    pub nwrap: usize,
    pub nmean: i32,
    pub bitshift: u32,
    pub lpcqoffset: i32,

    /// Channel the next audio command decodes.
    pub current_channel: usize,
    pub header_parsed: bool,
    pub quit_received: bool,
    pub failed: bool,

    pub history: Vec<ChannelHistory>,
}

impl Default for DecoderState {
    fn default() -> Self {
        Self::new(log::Level::Error)
    }
}

impl DecoderState {
    pub fn new(fail_level: log::Level) -> Self {
        Self {
            fail_level,
            info: None,
            channels: 0,
            block_size: 0,
            version: 0,
            nwrap: 0,
            nmean: -1,
            bitshift: 0,
            lpcqoffset: 0,
            current_channel: 0,
            header_parsed: false,
            quit_received: false,
            failed: false,
            history: Vec::new(),
        }
    }

    fn read_header(&mut self, reader: &mut BsIoSliceReader, flush: bool) -> Result<DecodeStatus> {
        let start = reader.position()?;

        let info = match StreamInfo::read(self, reader) {
            Ok(info) => info,
            Err(e) if !flush && is_overread(&e) => {
                reader.rewind_to(start)?;
                return Ok(DecodeStatus::NeedMoreInput);
            }
            Err(e) => return Err(e),
        };

        let mut history = Vec::with_capacity(info.channels);
        for _ in 0..info.channels {
            history.push(ChannelHistory::new(
                info.nwrap,
                info.block_size,
                info.nmean,
                info.sample_type.initial_mean(),
            )?);
        }

        self.channels = info.channels;
        self.block_size = info.block_size;
        self.version = info.version;
        self.nwrap = info.nwrap;
        self.nmean = info.nmean;
        self.lpcqoffset = info.lpcqoffset;
        self.bitshift = 0;
        self.current_channel = 0;
        self.history = history;
        self.info = Some(info);
        self.header_parsed = true;

        Ok(DecodeStatus::NoFrame)
    }

    /// Runs commands until a block is complete, the stream ends or the
    /// buffered data runs out.
    fn decode_block(&mut self, reader: &mut BsIoSliceReader, flush: bool) -> Result<DecodeStatus> {
        loop {
            let available = reader.available()?;
            if available < MIN_COMMAND_BITS {
                if flush {
                    return self.end_in_tail(reader, available);
                }
                return Ok(DecodeStatus::NoFrame);
            }

            let start = reader.position()?;
            let cmd = match Command::read(reader) {
                Ok(cmd) => Ok(cmd),
                // only padding left
                Err(e) if flush && is_overread(&e) => return self.end_without_quit(available),
                Err(e) => Err(e),
            };

            match cmd.and_then(|cmd| self.execute(cmd, reader)) {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) if !flush && is_overread(&e) => {
                    trace!("command at bit {start} needs more input");
                    reader.rewind_to(start)?;
                    return Ok(DecodeStatus::NeedMoreInput);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Handles the final bits of a flushed stream, too few for any command
    /// but QUIT, which is only four bits long.
    fn end_in_tail(
        &mut self,
        reader: &mut BsIoSliceReader,
        available: u64,
    ) -> Result<DecodeStatus> {
        let start = reader.position()?;
        if let Ok(Command::Quit) = Command::read(reader) {
            debug!("Quit command received");
            self.quit_received = true;
            return Ok(DecodeStatus::NoFrame);
        }

        reader.rewind_to(start)?;
        self.end_without_quit(available)
    }

    fn end_without_quit(&mut self, available: u64) -> Result<DecodeStatus> {
        log_or_err!(self, log::Level::Warn, DecodeError::MissingQuit(available));
        self.quit_received = true;
        Ok(DecodeStatus::NoFrame)
    }

    /// Executes one command. Returns the status that ends the pass, if any.
    fn execute(
        &mut self,
        cmd: Command,
        reader: &mut BsIoSliceReader,
    ) -> Result<Option<DecodeStatus>> {
        trace!("{cmd} on channel {}", self.current_channel);

        if cmd.is_audio() {
            return self.decode_channel(cmd, reader);
        }

        match cmd {
            Command::Verbatim => {
                let len = reader.get_rice(VERBATIM_CKSIZE_SIZE)?;
                for _ in 0..len {
                    reader.get_rice(VERBATIM_BYTE_SIZE)?;
                }
                debug!("Skipped {len} byte verbatim block");
                Ok(None)
            }
            Command::BitShift => {
                let bitshift = reader.get_rice(BITSHIFTSIZE)?;
                if bitshift > MAX_BITSHIFT {
                    bail!(CommandError::InvalidBitShift(bitshift));
                }
                if bitshift != self.bitshift {
                    debug!("Bitshift {} -> {bitshift}", self.bitshift);
                }
                self.bitshift = bitshift;
                Ok(None)
            }
            Command::BlockSize => {
                let hint = block_size_hint(self.block_size as u32);
                let block_size = reader.get_adaptive(self.version, hint)?;
                if block_size as usize > self.block_size {
                    bail!(CommandError::BlockSizeIncrease {
                        current: self.block_size,
                        requested: block_size,
                    });
                }
                if block_size == 0 || block_size > MAX_BLOCKSIZE {
                    bail!(CommandError::InvalidBlockSize(block_size));
                }
                debug!("Block size {} -> {block_size}", self.block_size);
                self.block_size = block_size as usize;
                Ok(Some(DecodeStatus::NoFrame))
            }
            Command::Quit => {
                debug!("Quit command received");
                self.quit_received = true;
                Ok(Some(DecodeStatus::NoFrame))
            }
            Command::Diff0
            | Command::Diff1
            | Command::Diff2
            | Command::Diff3
            | Command::Qlpc
            | Command::Zero => bail!(CommandError::UnknownCommand(cmd as u32)),
        }
    }

    fn decode_channel(
        &mut self,
        cmd: Command,
        reader: &mut BsIoSliceReader,
    ) -> Result<Option<DecodeStatus>> {
        let channel = self.current_channel;
        let block_size = self.block_size;

        let mut residual_size = 0;
        if cmd != Command::Zero {
            residual_size = reader.get_rice(ENERGYSIZE)? as i32;
            // version 0 encoders wrote the parameter of the signed code one too high
            if self.version == 0 {
                residual_size -= 1;
            }
        }

        let history = &mut self.history[channel];
        let coffset = history.coffset(self.version, self.nmean, self.bitshift);

        if cmd == Command::Zero {
            history.block_mut(block_size).fill(0);
        } else {
            let predictor = Predictor::read(reader, cmd, self.nwrap)?;
            predictor.decode_block(
                reader,
                history,
                block_size,
                residual_size,
                coffset,
                self.lpcqoffset,
            )?;
        }

        history.update_means(self.version, self.nmean, block_size, self.bitshift);
        history.wrap(block_size);
        history.apply_bitshift(block_size, self.bitshift);

        self.current_channel += 1;
        if self.current_channel < self.channels {
            return Ok(None);
        }

        self.current_channel = 0;
        let frame = DecodedFrame::interleave(&self.history, block_size)?;

        Ok(Some(DecodeStatus::Frame(frame)))
    }
}
