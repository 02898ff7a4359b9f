use super::decoder_thread::DecoderEvent;
use super::output::AudioWriter;
use crate::cli::command::AudioFormat;
use crate::timestamp::{duration_secs, time_str};
use anyhow::{Result, bail};
use indicatif::ProgressBar;
use shorten::structs::frame::DecodedFrame;
use shorten::structs::header::StreamInfo;
use std::path::PathBuf;

pub struct FrameHandlerContext<'a> {
    pub base_path: &'a Option<PathBuf>,
    pub format: AudioFormat,
    pub pb: &'a Option<ProgressBar>,
    pub start_time: std::time::Instant,
}

#[derive(Default)]
pub struct DecodeHandler {
    pub audio_writer: Option<AudioWriter>,
    pub audio_path: Option<PathBuf>,
    pub stream_info: Option<StreamInfo>,
    pub decoded_frames: u64,
    pub decoded_samples: u64,
}

impl DecodeHandler {
    pub fn handle_event(&mut self, event: DecoderEvent, ctx: &FrameHandlerContext) -> Result<()> {
        match event {
            DecoderEvent::StreamInfo(info) => self.handle_stream_info(info, ctx),
            DecoderEvent::Frame(frame) => self.handle_decoded_frame(frame, ctx),
        }
    }

    fn handle_stream_info(&mut self, info: StreamInfo, ctx: &FrameHandlerContext) -> Result<()> {
        log::info!(
            "Stream: version {}, {}, {} ch, {} Hz, block size {}",
            info.version,
            info.sample_type,
            info.channels,
            info.sample_rate,
            info.block_size
        );

        if let Some(base_path) = ctx.base_path {
            let channels = u16::try_from(info.channels)?;
            let (writer, path) =
                AudioWriter::create(base_path, ctx.format, info.sample_rate, channels)?;
            log::info!("Writing audio to {}", path.display());
            self.audio_writer = Some(writer);
            self.audio_path = Some(path);
        }

        self.stream_info = Some(info);
        Ok(())
    }

    fn handle_decoded_frame(&mut self, frame: DecodedFrame, ctx: &FrameHandlerContext) -> Result<()> {
        let Some(info) = &self.stream_info else {
            bail!("decoded frame arrived before stream parameters");
        };
        let sample_rate = info.sample_rate;

        self.decoded_frames += 1;
        self.decoded_samples += frame.block_size as u64;

        if let Some(writer) = &mut self.audio_writer {
            writer.write_pcm_samples(&frame.samples)?;
        }

        self.update_progress_display(sample_rate, ctx.start_time, ctx.pb);
        Ok(())
    }

    fn update_progress_display(
        &self,
        sample_rate: u32,
        start_time: std::time::Instant,
        pb: &Option<ProgressBar>,
    ) {
        if self.decoded_frames.is_multiple_of(30) {
            if let Some(pb) = pb {
                let audio_duration_secs = duration_secs(self.decoded_samples, sample_rate);
                let realtime_multiplier = audio_duration_secs / start_time.elapsed().as_secs_f64();
                let time_str = time_str(audio_duration_secs);

                pb.set_message(format!(
                    "speed: {realtime_multiplier:.1}x | timestamp: {time_str}"
                ));
            }
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.stream_info.as_ref().map_or(0, |info| info.sample_rate)
    }

    pub fn finalize(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.audio_writer {
            writer.finish()?;
        }

        if let Some(path) = &self.audio_path {
            log::info!("Audio written to {}", path.display());
        }

        Ok(())
    }
}
