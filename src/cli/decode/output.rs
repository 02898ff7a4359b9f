use crate::wav::WAVWriter;
use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::super::command::AudioFormat;

/// Appends `expected_ext` unless the path already carries it.
pub fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match base_path.extension() {
        Some(existing_ext) if existing_ext == expected_ext => base_path.to_path_buf(),
        Some(_) => {
            let mut name = base_path.file_name().unwrap_or_default().to_os_string();
            name.push(".");
            name.push(expected_ext);
            base_path.with_file_name(name)
        }
        None => base_path.with_extension(expected_ext),
    }
}

pub enum AudioWriter {
    Pcm(BufWriter<File>),
    Wav(WAVWriter<File>),
}

impl AudioWriter {
    pub fn create(
        base_path: &Path,
        format: AudioFormat,
        sample_rate: u32,
        channel_count: u16,
    ) -> Result<(Self, PathBuf)> {
        let path = create_path_with_extension(base_path, format.extension());
        let writer = match format {
            AudioFormat::Pcm => Self::create_pcm(&path)?,
            AudioFormat::Wav => Self::create_wav(&path, sample_rate, channel_count)?,
        };
        Ok((writer, path))
    }

    pub fn create_pcm(path: &Path) -> Result<Self> {
        let pcm_writer = BufWriter::new(File::create(path)?);
        Ok(AudioWriter::Pcm(pcm_writer))
    }

    pub fn create_wav(path: &Path, sample_rate: u32, channel_count: u16) -> Result<Self> {
        let mut wav_writer = WAVWriter::new(File::create(path)?);
        wav_writer.configure_audio_format(sample_rate, channel_count)?;
        wav_writer.write_header()?;
        Ok(AudioWriter::Wav(wav_writer))
    }

    /// Writes interleaved samples as 16-bit little-endian.
    pub fn write_pcm_samples(&mut self, samples: &[i16]) -> Result<()> {
        match self {
            AudioWriter::Pcm(pcm_writer) => {
                for sample in samples {
                    pcm_writer.write_all(&sample.to_le_bytes())?;
                }
            }
            AudioWriter::Wav(wav_writer) => {
                wav_writer.write_pcm_16bit(samples)?;
            }
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        match self {
            AudioWriter::Pcm(pcm_writer) => {
                pcm_writer.flush()?;
            }
            AudioWriter::Wav(wav_writer) => {
                wav_writer.finish()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_appended_or_kept() {
        assert_eq!(
            create_path_with_extension(Path::new("out/track"), "wav"),
            PathBuf::from("out/track.wav")
        );
        assert_eq!(
            create_path_with_extension(Path::new("out/track.wav"), "wav"),
            PathBuf::from("out/track.wav")
        );
        assert_eq!(
            create_path_with_extension(Path::new("out/track.shn"), "pcm"),
            PathBuf::from("out/track.shn.pcm")
        );
    }

    #[test]
    fn writes_raw_pcm() {
        let path = std::env::temp_dir().join(format!("shnd-output-{}.pcm", std::process::id()));
        let mut writer = AudioWriter::create_pcm(&path).unwrap();
        writer.write_pcm_samples(&[0x0102, -2]).unwrap();
        writer.finish().unwrap();
        drop(writer);

        let data = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(data, [0x02, 0x01, 0xFE, 0xFF]);
    }
}
