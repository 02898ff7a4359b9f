//! Bitstream I/O utilities for Shorten parsing.
//!
//! Provides the bit-granular cursor over the pending input buffer and the
//! Rice/Golomb variable-length codes built on top of it.

use std::io;
use std::io::SeekFrom;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

/// Number of mantissa bits used to transmit the Rice parameter of an
/// adaptive unsigned value (streams with version > 0).
pub const ULONGSIZE: u32 = 2;

/// Largest Rice parameter accepted before a value is considered corrupt.
const MAX_RICE_PARAM: u32 = 31;

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            )),
            Err(e) => Err(e),
        }
    }

    /// Reads an unsigned Rice code with `k` mantissa bits.
    ///
    /// Zero bits are counted up to and including the terminating one bit
    /// (quotient `q`), then `k` bits of remainder `r` follow. The value is
    /// `q * 2^k + r`.
    #[inline(always)]
    pub fn get_rice(&mut self, k: u32) -> io::Result<u32> {
        if k > MAX_RICE_PARAM {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "get_rice({}): parameter out of range at {}",
                    k,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            ));
        }

        let mut q = 0u32;
        while !self.get()? {
            q = q.wrapping_add(1);
        }

        let r = if k > 0 { self.get_n::<u32>(k)? } else { 0 };

        Ok((q << k) | r)
    }

    /// Reads a signed Rice code.
    ///
    /// Shorten transmits signed values as an unsigned code with `k + 1`
    /// mantissa bits folded even/odd: 0, -1, 1, -2, 2, ...
    /// `k` may be -1, which leaves no mantissa bits at all.
    #[inline(always)]
    pub fn get_rice_signed(&mut self, k: i32) -> io::Result<i32> {
        let uvar = self.get_rice(k.saturating_add(1).max(0) as u32)?;

        if uvar & 1 != 0 {
            Ok(!((uvar >> 1) as i32))
        } else {
            Ok((uvar >> 1) as i32)
        }
    }

    /// Reads an unsigned value whose Rice parameter is itself transmitted.
    ///
    /// Version 0 streams have no parameter prefix and use `k` as given.
    #[inline(always)]
    pub fn get_adaptive(&mut self, version: u8, k: u32) -> io::Result<u32> {
        let k = if version != 0 {
            self.get_rice(ULONGSIZE)?
        } else {
            k
        };

        self.get_rice(k)
    }

    /// Moves the cursor to an absolute bit position previously obtained from
    /// [`position`](Self::position).
    #[inline(always)]
    pub fn rewind_to(&mut self, position: u64) -> io::Result<u64> {
        if position > self.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("rewind_to({position}): out of bounds bits"),
            ));
        }

        self.bs.seek_bits(SeekFrom::Start(position))
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs
            .position_in_bits()
            .map(|pos| self.len.saturating_sub(pos))
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        self.available().and_then(|avail| {
            if n as u64 > avail {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "skip_n: out of bounds bits",
                ))
            } else {
                self.bs.skip(n)
            }
        })
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

/// Returns `true` when the error means the cursor ran past the end of the
/// buffered input.
pub fn is_overread(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_n_basic() {
        // 0xA5 = 1010_0101, 0x3C = 0011_1100
        let mut reader = BsIoSliceReader::from_slice(&[0xA5, 0x3C]);
        assert_eq!(reader.get_n::<u32>(4).unwrap(), 0b1010);
        assert_eq!(reader.get_n::<u32>(4).unwrap(), 0b0101);
        assert_eq!(reader.get_n::<u32>(8).unwrap(), 0x3C);
        assert_eq!(reader.available().unwrap(), 0);
    }

    #[test]
    fn get_n_across_byte_boundary() {
        let mut reader = BsIoSliceReader::from_slice(&[0xFF, 0x00]);
        assert_eq!(reader.get_n::<u32>(5).unwrap(), 0b11111);
        assert_eq!(reader.get_n::<u32>(6).unwrap(), 0b111000);
        assert_eq!(reader.position().unwrap(), 11);
    }

    #[test]
    fn rice_k0_is_unary() {
        // 1 | 0001 | 000
        let mut reader = BsIoSliceReader::from_slice(&[0x88]);
        assert_eq!(reader.get_rice(0).unwrap(), 0);
        assert_eq!(reader.get_rice(0).unwrap(), 3);
    }

    #[test]
    fn rice_k2() {
        // 0_1_01 (5) | 1_10 (2) | 0
        let mut reader = BsIoSliceReader::from_slice(&[0x5C]);
        assert_eq!(reader.get_rice(2).unwrap(), 5);
        assert_eq!(reader.get_rice(2).unwrap(), 2);
    }

    #[test]
    fn rice_signed_folds_even_odd() {
        // k=0 reads 1 mantissa bit: 1_0 (0) | 1_1 (1) | 0_1_0 (2)
        let mut reader = BsIoSliceReader::from_slice(&[0xB4]);
        assert_eq!(reader.get_rice_signed(0).unwrap(), 0);
        assert_eq!(reader.get_rice_signed(0).unwrap(), -1);
        assert_eq!(reader.get_rice_signed(0).unwrap(), 1);
    }

    #[test]
    fn rice_signed_minus_one_parameter() {
        // No mantissa bits: 1 (0) | 01 (1 -> -1) | 001 (2 -> 1) | 0
        let mut reader = BsIoSliceReader::from_slice(&[0b1010_0100]);
        assert_eq!(reader.get_rice_signed(-1).unwrap(), 0);
        assert_eq!(reader.get_rice_signed(-1).unwrap(), -1);
        assert_eq!(reader.get_rice_signed(-1).unwrap(), 1);
    }

    #[test]
    fn adaptive_value() {
        // k via rice(2) = 3: 1_11, value via rice(3) = 5: 1_101
        let mut reader = BsIoSliceReader::from_slice(&[0xFA]);
        assert_eq!(reader.get_adaptive(2, 0).unwrap(), 5);

        // 1_00 (k = 0), 1 (value 0)
        let mut reader = BsIoSliceReader::from_slice(&[0x90]);
        assert_eq!(reader.get_adaptive(1, 7).unwrap(), 0);
    }

    #[test]
    fn adaptive_value_version0_uses_hint() {
        // Rice(2) of 5 directly: 0_1_01
        let mut reader = BsIoSliceReader::from_slice(&[0b0101_0000]);
        assert_eq!(reader.get_adaptive(0, 2).unwrap(), 5);
        assert_eq!(reader.position().unwrap(), 4);
    }

    #[test]
    fn stream_header_fields() {
        // type=5, channels=2, blocksize=256, maxnlpc=0, nmean=4, nskip=0
        let mut reader = BsIoSliceReader::from_slice(&[0xFB, 0xB1, 0x70, 0x09, 0xF9, 0x20]);
        let fields: Vec<u32> = (0..6)
            .map(|_| reader.get_adaptive(2, 0).unwrap())
            .collect();
        assert_eq!(fields, [5, 2, 256, 0, 4, 0]);
    }

    #[test]
    fn overread_is_detected() {
        let mut reader = BsIoSliceReader::from_slice(&[0x00]);
        let err = reader.get_rice(0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(is_overread(&anyhow::Error::from(err)));

        let mut reader = BsIoSliceReader::from_slice(&[0xFF]);
        assert!(reader.skip_n(9).is_err());
        assert!(reader.get_n::<u32>(9).is_err());
    }

    #[test]
    fn rewind_restores_position() {
        let mut reader = BsIoSliceReader::from_slice(&[0x5C]);
        let mark = reader.position().unwrap();
        assert_eq!(reader.get_rice(2).unwrap(), 5);
        reader.rewind_to(mark).unwrap();
        assert_eq!(reader.get_rice(2).unwrap(), 5);
        assert!(reader.rewind_to(9).is_err());
    }

    #[test]
    fn oversized_parameter_is_invalid_data() {
        let mut reader = BsIoSliceReader::from_slice(&[0xFF; 8]);
        let err = reader.get_rice(40).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
