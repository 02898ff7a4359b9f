use super::processor::{decode_chunk, flush_decoder};
use crate::input::InputReader;
use anyhow::Result;
use indicatif::ProgressBar;
use shorten::process::decode::{DecodeStatus, Decoder};
use shorten::structs::frame::DecodedFrame;
use shorten::structs::header::StreamInfo;
use std::sync::mpsc;
use std::thread;

pub enum DecoderEvent {
    /// Sent once, before the first frame.
    StreamInfo(StreamInfo),
    Frame(DecodedFrame),
}

pub struct DecoderThreadConfig {
    pub input_path: std::path::PathBuf,
    pub chunk_size: usize,
    pub tx: mpsc::Sender<Result<DecoderEvent>>,
    pub pb_clone: Option<ProgressBar>,
    pub decoder: Decoder,
}

pub fn spawn_decoder_thread(config: DecoderThreadConfig) -> thread::JoinHandle<Result<()>> {
    thread::spawn(move || -> Result<()> {
        let tx = config.tx.clone();
        if let Err(e) = run_decoder(config) {
            let _ = tx.send(Err(e));
        }
        Ok(())
    })
}

fn run_decoder(config: DecoderThreadConfig) -> Result<()> {
    let DecoderThreadConfig {
        input_path,
        chunk_size,
        tx,
        pb_clone,
        mut decoder,
    } = config;

    let mut info_sent = false;
    let mut frame_count = 0u64;
    let mut bytes_read = 0u64;

    let mut on_status = |decoder: &Decoder, status: DecodeStatus| -> Result<bool> {
        if !info_sent {
            if let Some(info) = decoder.stream_info() {
                info_sent = true;
                if tx.send(Ok(DecoderEvent::StreamInfo(info.clone()))).is_err() {
                    return Ok(false);
                }
            }
        }

        if let DecodeStatus::Frame(frame) = status {
            frame_count += 1;
            if tx.send(Ok(DecoderEvent::Frame(frame))).is_err() {
                return Ok(false);
            }
        }

        Ok(true)
    };

    let mut input_reader = InputReader::new(&input_path)?;
    let mut finished = false;

    input_reader.process_chunks(chunk_size, |chunk| {
        bytes_read += chunk.len() as u64;
        if let Some(pb) = &pb_clone {
            pb.set_position(bytes_read);
        }

        let more = decode_chunk(&mut decoder, chunk, &mut on_status)?;
        finished = !more;
        Ok(more)
    })?;

    if !finished {
        flush_decoder(&mut decoder, &mut on_status)?;
    }

    log::info!("Processing complete: {frame_count} frames from {bytes_read} bytes");
    Ok(())
}
