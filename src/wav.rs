use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use crate::byteorder::WriteBytesLe;
use shnd_macros::{ToBytes, riff_chunk_id};

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const CANONICAL_HEADER_SIZE: u64 = 44;

pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.chunk_id())?;

        let chunk_data = self.chunk_data();
        let size = u32::try_from(chunk_data.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "RIFF chunk too large"))?;
        writer.write_all(&size.to_le_bytes())?;
        writer.write_all(&chunk_data)?;

        // word alignment
        if chunk_data.len() % 2 == 1 {
            writer.write_all(&[0])?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ToBytes)]
#[riff_chunk_id(b"fmt ")]
pub struct FormatChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatChunk {
    pub fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        let block_align = channels * (bits_per_sample / 8);
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample,
        }
    }
}

/// Canonical RIFF/WAVE writer for 16-bit PCM.
///
/// The header goes out with zero sizes; [`finish`](Self::finish) patches
/// the RIFF and data sizes once all samples are written.
pub struct WAVWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    format: FormatChunk,
    riff_size_position: u64,
    data_size_position: u64,
    data_written: u64,
}

impl<W: Write + Seek> WAVWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            format: FormatChunk::pcm(44100, 2, 16),
            riff_size_position: 0,
            data_size_position: 0,
            data_written: 0,
        }
    }

    pub fn configure_audio_format(&mut self, sample_rate: u32, channels: u16) -> io::Result<()> {
        if self.data_written > 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot change format after writing data",
            ));
        }

        self.format = FormatChunk::pcm(sample_rate, channels, 16);
        Ok(())
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(b"RIFF")?;
        self.riff_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?;
        self.writer.write_all(b"WAVE")?;

        self.format.write_all(&mut self.writer)?;

        self.writer.write_all(b"data")?;
        self.data_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?;

        Ok(())
    }

    /// Writes interleaved samples as 16-bit little-endian.
    pub fn write_pcm_16bit(&mut self, samples: &[i16]) -> io::Result<()> {
        let mut buffer = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            sample.write_le(&mut buffer);
        }
        self.writer.write_all(&buffer)?;
        self.data_written += buffer.len() as u64;
        Ok(())
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;

        let too_large =
            || io::Error::new(io::ErrorKind::InvalidData, "WAVE data exceeds the 4 GiB limit");
        let data_size = u32::try_from(self.data_written).map_err(|_| too_large())?;
        let riff_size = u32::try_from(self.data_written + CANONICAL_HEADER_SIZE - 8)
            .map_err(|_| too_large())?;

        let current_pos = self.writer.stream_position()?;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(current_pos))?;
        self.writer.flush()?;

        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_format_chunk_bytes() {
        let fmt = FormatChunk::pcm(44100, 2, 16);
        assert_eq!(fmt.byte_rate, 176_400);
        assert_eq!(fmt.block_align, 4);

        let mut out = Vec::new();
        fmt.write_all(&mut out).unwrap();
        assert_eq!(&out[0..4], b"fmt ");
        assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 16);
        assert_eq!(out.len(), 24);
        assert_eq!(&out[8..10], &[0x01, 0x00]);
        assert_eq!(&out[10..12], &[0x02, 0x00]);
    }

    #[test]
    fn test_wav_header_write() -> io::Result<()> {
        let mut writer = WAVWriter::new(Cursor::new(Vec::new()));
        writer.configure_audio_format(48000, 1)?;
        writer.write_header()?;
        writer.finish()?;

        let data = writer.into_inner()?.into_inner();
        assert_eq!(data.len() as u64, CANONICAL_HEADER_SIZE);
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(data[4..8].try_into().unwrap()), 36);
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(data[24..28].try_into().unwrap()), 48000);
        assert_eq!(&data[36..40], b"data");
        assert_eq!(u32::from_le_bytes(data[40..44].try_into().unwrap()), 0);

        Ok(())
    }

    #[test]
    fn test_wav_sample_write() -> io::Result<()> {
        let mut writer = WAVWriter::new(Cursor::new(Vec::new()));
        writer.configure_audio_format(44100, 2)?;
        writer.write_header()?;
        writer.write_pcm_16bit(&[1, -1, i16::MAX, i16::MIN])?;
        writer.finish()?;

        let data = writer.into_inner()?.into_inner();
        assert_eq!(data.len(), 52);
        assert_eq!(u32::from_le_bytes(data[4..8].try_into().unwrap()), 44);
        assert_eq!(u32::from_le_bytes(data[40..44].try_into().unwrap()), 8);
        assert_eq!(
            &data[44..],
            &[0x01, 0x00, 0xFF, 0xFF, 0xFF, 0x7F, 0x00, 0x80]
        );

        Ok(())
    }

    #[test]
    fn test_format_locked_after_data() -> io::Result<()> {
        let mut writer = WAVWriter::new(Cursor::new(Vec::new()));
        writer.write_header()?;
        writer.write_pcm_16bit(&[0, 0])?;
        assert!(writer.configure_audio_format(8000, 1).is_err());
        Ok(())
    }
}
