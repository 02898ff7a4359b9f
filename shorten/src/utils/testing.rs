//! Synthetic Shorten stream construction for unit tests.

use bitstream_io::{BigEndian, BitWrite, BitWriter};

use crate::structs::command::{
    BITSHIFTSIZE, Command, ENERGYSIZE, FNSIZE, LPCQSIZE, LPCQUANT, VERBATIM_BYTE_SIZE,
    VERBATIM_CKSIZE_SIZE,
};

pub const TYPE_S16HL: u32 = 3;
pub const TYPE_S16LH: u32 = 5;

/// Canonical 44-byte RIFF/WAVE header with an empty data chunk.
pub fn wave_header(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * block_align as u32;

    [
        b"RIFF".as_slice(),
        &36u32.to_le_bytes(),
        b"WAVE",
        b"fmt ",
        &16u32.to_le_bytes(),
        &1u16.to_le_bytes(),
        &channels.to_le_bytes(),
        &sample_rate.to_le_bytes(),
        &byte_rate.to_le_bytes(),
        &block_align.to_le_bytes(),
        &bits_per_sample.to_le_bytes(),
        b"data",
        &0u32.to_le_bytes(),
    ]
    .concat()
}

#[derive(Debug, Clone)]
pub struct StreamParams {
    pub version: u8,
    pub file_type: u32,
    pub channels: u32,
    pub block_size: u32,
    pub max_lpc_order: u32,
    pub nmean: u32,
    pub skip_bytes: u32,
    pub sample_rate: u32,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            version: 2,
            file_type: TYPE_S16HL,
            channels: 1,
            block_size: 256,
            max_lpc_order: 0,
            nmean: 4,
            skip_bytes: 0,
            sample_rate: 44100,
        }
    }
}

/// Encodes Shorten syntax elements MSB-first.
pub struct StreamWriter {
    bw: BitWriter<Vec<u8>, BigEndian>,
    version: u8,
}

impl StreamWriter {
    pub fn new(version: u8) -> Self {
        Self {
            bw: BitWriter::new(Vec::new()),
            version,
        }
    }

    pub fn bits(&mut self, n: u32, value: u32) -> &mut Self {
        for i in (0..n).rev() {
            self.bw.write_bit((value >> i) & 1 != 0).unwrap();
        }
        self
    }

    pub fn rice(&mut self, k: u32, value: u32) -> &mut Self {
        for _ in 0..(value >> k) {
            self.bw.write_bit(false).unwrap();
        }
        self.bw.write_bit(true).unwrap();
        self.bits(k, value & ((1u32 << k) - 1))
    }

    pub fn rice_signed(&mut self, k: i32, value: i32) -> &mut Self {
        let folded = if value >= 0 {
            (value as u32) << 1
        } else {
            ((!value) as u32) << 1 | 1
        };
        self.rice((k + 1) as u32, folded)
    }

    /// Adaptive unsigned value: the parameter is the bit length of `value`.
    pub fn uint(&mut self, k_hint: u32, value: u32) -> &mut Self {
        if self.version != 0 {
            let k = 32 - value.leading_zeros();
            self.rice(2, k).rice(k, value)
        } else {
            self.rice(k_hint, value)
        }
    }

    pub fn command(&mut self, cmd: Command) -> &mut Self {
        self.rice(FNSIZE, cmd as u32)
    }

    pub fn header(&mut self, params: &StreamParams) -> &mut Self {
        let wave = wave_header(params.sample_rate, params.channels as u16, 16);
        self.header_with_blob(params, &wave)
    }

    pub fn header_with_blob(&mut self, params: &StreamParams, blob: &[u8]) -> &mut Self {
        for byte in b"ajkg" {
            self.bits(8, *byte as u32);
        }
        self.bits(8, params.version as u32);
        self.uint(4, params.file_type).uint(0, params.channels);

        if params.version > 0 {
            self.uint(8, params.block_size)
                .uint(LPCQSIZE, params.max_lpc_order)
                .uint(0, params.nmean)
                .uint(1, params.skip_bytes);
            for _ in 0..params.skip_bytes {
                self.bits(8, 0xA5);
            }
        }

        self.verbatim(blob)
    }

    pub fn verbatim(&mut self, bytes: &[u8]) -> &mut Self {
        self.command(Command::Verbatim)
            .rice(VERBATIM_CKSIZE_SIZE, bytes.len() as u32);
        for byte in bytes {
            self.rice(VERBATIM_BYTE_SIZE, *byte as u32);
        }
        self
    }

    /// DIFF0..DIFF3 block with the given residuals.
    pub fn fixed(&mut self, order: u32, energy: u32, residuals: &[i32]) -> &mut Self {
        let cmd = Command::from_code(order).unwrap();
        self.command(cmd).rice(ENERGYSIZE, energy);
        self.residuals(energy, residuals)
    }

    pub fn qlpc(&mut self, energy: u32, coeffs: &[i32], residuals: &[i32]) -> &mut Self {
        self.command(Command::Qlpc)
            .rice(ENERGYSIZE, energy)
            .rice(LPCQSIZE, coeffs.len() as u32);
        for c in coeffs {
            self.rice_signed(LPCQUANT as i32, *c);
        }
        self.residuals(energy, residuals)
    }

    fn residuals(&mut self, energy: u32, residuals: &[i32]) -> &mut Self {
        let k = if self.version == 0 {
            energy as i32 - 1
        } else {
            energy as i32
        };
        for r in residuals {
            self.rice_signed(k, *r);
        }
        self
    }

    pub fn zero(&mut self) -> &mut Self {
        self.command(Command::Zero)
    }

    pub fn bitshift(&mut self, shift: u32) -> &mut Self {
        self.command(Command::BitShift).rice(BITSHIFTSIZE, shift)
    }

    pub fn block_size(&mut self, k_hint: u32, size: u32) -> &mut Self {
        self.command(Command::BlockSize).uint(k_hint, size)
    }

    pub fn quit(&mut self) -> &mut Self {
        self.command(Command::Quit)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        let mut bw = std::mem::replace(&mut self.bw, BitWriter::new(Vec::new()));
        bw.byte_align().unwrap();
        bw.into_writer()
    }
}

/// Header for `params` followed by nothing.
pub fn header_only(params: &StreamParams) -> Vec<u8> {
    StreamWriter::new(params.version).header(params).finish()
}

/// Frames decoded from [`EXAMPLE_DATA`](crate::process::EXAMPLE_DATA).
pub const EXAMPLE_FRAMES: [[i16; 32]; 3] = [
    [
        0, -15, -11, -23, -6, -39, -23, -26,
        -39, -13, -25, -25, -39, -11, -36, -18,
        -19, -25, -36, -5, -24, 22, -31, 47,
        -49, 35, -64, 46, -57, 64, -51, 71,
    ],
    [
        -62, 0, -79, 0, -114, 0, -134, 0,
        -166, 0, -200, 0, -228, 0, -267, 0,
        -292, 0, -330, 0, -352, 0, -375, 0,
        -383, 0, -400, 0, -431, 0, -445, 0,
    ],
    [
        -42, 34, -34, 120, -90, 264, -68, 464,
        -102, 710, -44, 984, -106, 1276, -42, 1556,
        -108, 1856, -36, 2174, -88, 2536, -52, 2964,
        -46, 3460, -60, 4040, -74, 4700, -56, 5476,
    ],
];
