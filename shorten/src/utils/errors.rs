#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

/// Broad category of a decoder failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The bitstream is corrupt or not a Shorten stream.
    InvalidData,
    /// The stream is valid but uses a feature this decoder does not handle.
    Unsupported,
    /// A stream parameter is out of the range the decoder accepts.
    InvalidArgument,
    /// Decoder storage could not be allocated.
    OutOfMemory,
}

/// Classifies an error returned by [`Decoder::decode`](crate::process::decode::Decoder::decode).
///
/// Returns `None` for errors that did not originate in this crate.
pub fn classify(err: &anyhow::Error) -> Option<ErrorClass> {
    if let Some(e) = err.downcast_ref::<HeaderError>() {
        return Some(e.class());
    }
    if let Some(e) = err.downcast_ref::<WaveError>() {
        return Some(e.class());
    }
    if let Some(e) = err.downcast_ref::<CommandError>() {
        return Some(e.class());
    }
    if let Some(e) = err.downcast_ref::<PredictorError>() {
        return Some(e.class());
    }
    if let Some(e) = err.downcast_ref::<BufferError>() {
        return Some(e.class());
    }
    if let Some(e) = err.downcast_ref::<DecodeError>() {
        return Some(e.class());
    }
    if let Some(e) = err.downcast_ref::<std::io::Error>() {
        if e.kind() == std::io::ErrorKind::InvalidData {
            return Some(ErrorClass::InvalidData);
        }
    }

    None
}

#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("missing shorten magic 'ajkg', read {0:#010X}")]
    InvalidMagic(u32),

    #[error("unexpected stream version {0}")]
    UnexpectedVersion(u8),

    #[error("no channels reported")]
    NoChannels,

    #[error("too many channels: {0}")]
    TooManyChannels(u32),

    #[error("invalid or unsupported block size: {0}")]
    InvalidBlockSize(u32),

    #[error("nmean too large: {0}")]
    NmeanTooLarge(u32),

    #[error("channel history too large: {0} samples")]
    HistoryTooLarge(u64),

    #[error("unknown audio type {0}")]
    UnknownAudioType(u32),

    #[error("missing verbatim section at beginning of stream")]
    MissingVerbatimHeader,

    #[error("header is wrong size: {0}")]
    InvalidHeaderSize(u32),
}

impl HeaderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            HeaderError::InvalidBlockSize(_) => ErrorClass::InvalidArgument,
            _ => ErrorClass::InvalidData,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WaveError {
    #[error("missing RIFF tag")]
    MissingRiffTag,

    #[error("missing WAVE tag")]
    MissingWaveTag,

    #[error("missing fmt chunk")]
    MissingFmtChunk,

    #[error("fmt chunk was too short: {0} bytes")]
    FmtChunkTooShort(u32),

    #[error("unsupported wave format {0:#06X}")]
    UnsupportedFormat(u16),

    #[error("unsupported number of bits per sample: {0}")]
    UnsupportedBitsPerSample(u16),
}

impl WaveError {
    pub fn class(&self) -> ErrorClass {
        match self {
            WaveError::UnsupportedFormat(_) | WaveError::UnsupportedBitsPerSample(_) => {
                ErrorClass::Unsupported
            }
            _ => ErrorClass::InvalidData,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("unknown shorten function {0}")]
    UnknownCommand(u32),

    #[error("increasing block size is not supported: {current} -> {requested}")]
    BlockSizeIncrease { current: usize, requested: u32 },

    #[error("invalid or unsupported block size: {0}")]
    InvalidBlockSize(u32),

    #[error("bitshift out of range: {0}")]
    InvalidBitShift(u32),
}

impl CommandError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CommandError::UnknownCommand(_) | CommandError::InvalidBitShift(_) => {
                ErrorClass::InvalidData
            }
            CommandError::BlockSizeIncrease { .. } => ErrorClass::Unsupported,
            CommandError::InvalidBlockSize(_) => ErrorClass::InvalidArgument,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PredictorError {
    #[error("invalid pred_order {order}, nwrap is {nwrap}")]
    InvalidOrder { order: u32, nwrap: usize },
}

impl PredictorError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::InvalidArgument
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BufferError {
    #[error("error allocating {what}: {requested} elements")]
    Allocation { what: &'static str, requested: usize },

    #[error("overread: {0} bytes")]
    Overread(usize),

    #[error("stream truncated: read past the end of {0} pending bytes")]
    Truncated(usize),
}

impl BufferError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BufferError::Allocation { .. } => ErrorClass::OutOfMemory,
            BufferError::Overread(_) | BufferError::Truncated(_) => ErrorClass::InvalidData,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("stream ended without a quit command ({0} bits left over)")]
    MissingQuit(u64),

    #[error("decoder is in a failed state, reset required")]
    Failed,
}

impl DecodeError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::InvalidData
    }
}
