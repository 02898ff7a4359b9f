use super::decoder_thread::{DecoderThreadConfig, spawn_decoder_thread};
use super::handler::{DecodeHandler, FrameHandlerContext};
use super::progress::{create_progress_bar, finish_style};
use crate::cli::command::{Cli, DecodeArgs};
use crate::input::InputReader;
use crate::timestamp::{duration_secs, time_str};
use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar};
use shorten::process::decode::{Decoder, DecoderConfig};
use std::sync::mpsc;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Decoding Shorten stream: {} (strict mode: {})",
        args.input.display(),
        cli.strict
    );

    let base_path = args.output_path.clone();
    match base_path {
        Some(ref path) => log::info!("Output path specified: {}", path.display()),
        None => log::info!("No output path specified, decoding without writing audio"),
    }

    let total_bytes = if args.input.as_os_str() == "-" {
        log::debug!("Input size unknown for pipe input");
        None
    } else {
        InputReader::new(&args.input)?.total_size()
    };

    let pb = if let Some(multi) = multi {
        Some(create_progress_bar(multi, total_bytes)?)
    } else {
        None
    };

    let (tx, rx) = mpsc::channel();

    let decoder = Decoder::with_config(DecoderConfig {
        fail_level: cli.fail_level(),
        ..Default::default()
    });

    let decode_thread = spawn_decoder_thread(DecoderThreadConfig {
        input_path: args.input.clone(),
        chunk_size: args.chunk_size,
        tx,
        pb_clone: pb.clone(),
        decoder,
    });

    let mut handler = DecodeHandler::default();
    let start_time = std::time::Instant::now();
    let ctx = FrameHandlerContext {
        base_path: &base_path,
        format: args.format,
        pb: &pb,
        start_time,
    };

    while let Ok(result) = rx.recv() {
        match result {
            Ok(event) => handler.handle_event(event, &ctx)?,
            Err(e) => {
                if let Some(pb) = &pb {
                    pb.finish_with_message("decode failed");
                }
                return Err(e);
            }
        }
    }

    handler.finalize()?;

    match decode_thread.join() {
        Ok(Ok(())) => {
            finalize_progress_bar(&pb, total_bytes.is_some(), &handler, start_time);
            log::info!(
                "Decoded {} frames, {} samples per channel ({})",
                handler.decoded_frames,
                handler.decoded_samples,
                time_str(duration_secs(handler.decoded_samples, handler.sample_rate()))
            );
        }
        Ok(Err(e)) => {
            if let Some(pb) = &pb {
                pb.finish_with_message("decode failed");
            }
            return Err(e);
        }
        Err(_) => {
            if let Some(pb) = &pb {
                pb.finish_with_message("decode thread panicked");
            }
            return Err(anyhow::anyhow!("Decode thread panicked"));
        }
    }

    Ok(())
}

fn finalize_progress_bar(
    pb: &Option<ProgressBar>,
    known_size: bool,
    handler: &DecodeHandler,
    start_time: std::time::Instant,
) {
    if let Some(pb) = pb {
        let audio_duration_secs = duration_secs(handler.decoded_samples, handler.sample_rate());
        let realtime_multiplier = audio_duration_secs / start_time.elapsed().as_secs_f64();
        let final_time_str = time_str(audio_duration_secs);

        pb.set_style(finish_style(known_size));
        pb.finish_with_message(format!(
            "speed: {realtime_multiplier:.1}x | timestamp: {final_time_str}"
        ));
    }
}
