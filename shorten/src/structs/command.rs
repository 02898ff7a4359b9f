//! Shorten function codes.
//!
//! Every block in the bitstream starts with a function code transmitted as a
//! Rice code with [`FNSIZE`] mantissa bits. Audio commands decode one block of
//! samples for the current channel; the others adjust decoder state.

use std::fmt::Display;

use anyhow::{Result, bail};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::CommandError;

pub const FNSIZE: u32 = 2;
pub const ENERGYSIZE: u32 = 3;
pub const BITSHIFTSIZE: u32 = 2;
pub const LPCQSIZE: u32 = 2;
pub const LPCQUANT: u32 = 5;
pub const VERBATIM_CKSIZE_SIZE: u32 = 5;
pub const VERBATIM_BYTE_SIZE: u32 = 8;

/// Fewest bits that must remain before another command is attempted.
pub const MIN_COMMAND_BITS: u64 = 3 + FNSIZE as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Diff0 = 0,
    Diff1 = 1,
    Diff2 = 2,
    Diff3 = 3,
    Quit = 4,
    BlockSize = 5,
    BitShift = 6,
    Qlpc = 7,
    Zero = 8,
    Verbatim = 9,
}

const COMMANDS: [Command; 10] = [
    Command::Diff0,
    Command::Diff1,
    Command::Diff2,
    Command::Diff3,
    Command::Quit,
    Command::BlockSize,
    Command::BitShift,
    Command::Qlpc,
    Command::Zero,
    Command::Verbatim,
];

/// Whether a function code decodes audio for the current channel.
const IS_AUDIO_COMMAND: [bool; 10] = [
    true, true, true, true, false, false, false, true, true, false,
];

impl Command {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let code = reader.get_rice(FNSIZE)?;

        match Self::from_code(code) {
            Some(cmd) => Ok(cmd),
            None => bail!(CommandError::UnknownCommand(code)),
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        COMMANDS.get(code as usize).copied()
    }

    pub fn is_audio(self) -> bool {
        IS_AUDIO_COMMAND[self as usize]
    }

    /// Order of the fixed polynomial predictor, `None` for other commands.
    pub fn fixed_order(self) -> Option<usize> {
        match self {
            Command::Diff0 | Command::Diff1 | Command::Diff2 | Command::Diff3 => {
                Some(self as usize)
            }
            _ => None,
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Diff0 => "DIFF0",
            Command::Diff1 => "DIFF1",
            Command::Diff2 => "DIFF2",
            Command::Diff3 => "DIFF3",
            Command::Quit => "QUIT",
            Command::BlockSize => "BLOCKSIZE",
            Command::BitShift => "BITSHIFT",
            Command::Qlpc => "QLPC",
            Command::Zero => "ZERO",
            Command::Verbatim => "VERBATIM",
        };
        write!(f, "{name}")
    }
}

#[test]
fn test_command_table() {
    for (code, cmd) in COMMANDS.iter().enumerate() {
        assert_eq!(*cmd as usize, code);
        assert_eq!(Command::from_code(code as u32), Some(*cmd));
    }
    assert_eq!(Command::from_code(10), None);

    let audio: Vec<_> = COMMANDS.iter().filter(|c| c.is_audio()).collect();
    assert_eq!(
        audio,
        [
            &Command::Diff0,
            &Command::Diff1,
            &Command::Diff2,
            &Command::Diff3,
            &Command::Qlpc,
            &Command::Zero
        ]
    );

    assert_eq!(Command::Diff2.fixed_order(), Some(2));
    assert_eq!(Command::Qlpc.fixed_order(), None);
}

#[test]
fn test_unknown_command() {
    // rice(2) of 10: 00 1 10
    let data = [0b0011_0000];
    let mut reader = BsIoSliceReader::from_slice(&data);
    let err = Command::read(&mut reader).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CommandError>(),
        Some(CommandError::UnknownCommand(10))
    ));
}
