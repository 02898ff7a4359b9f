use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{Cli, InfoArgs};
use super::decode::processor::{decode_chunk, flush_decoder};
use crate::input::InputReader;
use crate::timestamp::{duration_secs, time_str};
use shorten::process::decode::{DecodeStatus, Decoder, DecoderConfig};
use shorten::structs::header::StreamInfo;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing Shorten stream: {}", args.input.display());

    let input_reader = InputReader::new(&args.input)?;
    let header_only = input_reader.is_pipe();
    if header_only {
        log::info!("Pipe input: reporting header fields only");
    }

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb.set_message("Analyzing blocks...");
            Some(pb)
        }
        None => None,
    };

    let report = analyze_stream(input_reader, cli.fail_level(), header_only, 64 * 1024);

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    match report? {
        Some(report) if args.yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
        Some(report) => display_report(&report),
        None => {
            println!("No Shorten header found in the input.");
            println!("This doesn't appear to be a valid Shorten stream.");
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StreamReport {
    pub version: u8,
    pub sample_type: String,
    pub channels: usize,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub block_size: usize,
    pub max_lpc_order: u32,
    pub nmean: i32,
    pub verbatim_header_bytes: usize,
    pub input_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<StreamTotals>,
}

#[derive(Debug, Serialize)]
pub struct StreamTotals {
    pub blocks: u64,
    pub samples_per_channel: u64,
    pub duration: String,
}

impl StreamReport {
    fn from_stream_info(info: &StreamInfo) -> Self {
        Self {
            version: info.version,
            sample_type: info.sample_type.to_string(),
            channels: info.channels,
            sample_rate: info.sample_rate,
            bits_per_sample: info.bits_per_sample,
            block_size: info.block_size,
            max_lpc_order: info.max_lpc_order,
            nmean: info.nmean,
            verbatim_header_bytes: info.verbatim_header.len(),
            input_bytes: 0,
            totals: None,
        }
    }
}

/// Decodes `input_reader` far enough to report on it: the header alone when
/// `header_only`, otherwise the whole stream so blocks can be counted.
pub fn analyze_stream(
    mut input_reader: InputReader,
    fail_level: log::Level,
    header_only: bool,
    chunk_size: usize,
) -> Result<Option<StreamReport>> {
    let mut decoder = Decoder::with_config(DecoderConfig {
        fail_level,
        ..Default::default()
    });

    let mut blocks = 0u64;
    let mut samples = 0u64;
    let mut input_bytes = 0u64;
    let mut stopped = false;

    let mut on_status = |decoder: &Decoder, status: DecodeStatus| -> Result<bool> {
        if header_only && decoder.stream_info().is_some() {
            return Ok(false);
        }
        if let DecodeStatus::Frame(frame) = status {
            blocks += 1;
            samples += frame.block_size as u64;
        }
        Ok(true)
    };

    input_reader.process_chunks(chunk_size, |chunk| {
        input_bytes += chunk.len() as u64;
        let more = decode_chunk(&mut decoder, chunk, &mut on_status)?;
        stopped = !more;
        Ok(more)
    })?;

    if !stopped {
        flush_decoder(&mut decoder, &mut on_status)?;
    }

    let Some(info) = decoder.stream_info() else {
        return Ok(None);
    };

    let mut report = StreamReport::from_stream_info(info);
    report.input_bytes = input_bytes;
    if !header_only {
        report.totals = Some(StreamTotals {
            blocks,
            samples_per_channel: samples,
            duration: time_str(duration_secs(samples, info.sample_rate)),
        });
    }

    Ok(Some(report))
}

fn display_report(report: &StreamReport) {
    println!();
    println!("Shorten Stream Information");
    println!("==========================");
    println!();
    println!("  Format version            {}", report.version);
    println!("  Sample type               {}", report.sample_type);
    println!("  Channels                  {}", report.channels);
    println!("  Sampling rate             {} Hz", report.sample_rate);
    println!("  Bits per sample           {}", report.bits_per_sample);
    println!("  Block size                {}", report.block_size);
    println!("  Max LPC order             {}", report.max_lpc_order);
    println!("  Running mean blocks       {}", report.nmean);
    println!("  WAVE header               {} bytes", report.verbatim_header_bytes);
    println!();

    if let Some(totals) = &report.totals {
        println!("Analysis Summary");
        println!("  Blocks decoded            {}", totals.blocks);
        println!("  Samples per channel       {}", totals.samples_per_channel);
        println!("  Duration                  {}", totals.duration);

        let size_kb = report.input_bytes as f64 / 1000.0;
        println!("  Size                      {size_kb:.2} kB ({} bytes)", report.input_bytes);

        let secs = duration_secs(totals.samples_per_channel, report.sample_rate);
        if secs > 0.0 {
            let avg_kbps = report.input_bytes as f64 * 8.0 / secs / 1000.0;
            println!("  Average data rate         {avg_kbps:.1} kbps");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorten::process::EXAMPLE_DATA;
    use std::io::Cursor;

    #[test]
    fn reports_whole_stream() {
        let reader = InputReader::from_reader(Cursor::new(EXAMPLE_DATA));
        let report = analyze_stream(reader, log::Level::Error, false, 5)
            .unwrap()
            .unwrap();

        assert_eq!(report.version, 2);
        assert_eq!(report.channels, 2);
        assert_eq!(report.sample_rate, 44100);
        assert_eq!(report.bits_per_sample, 16);
        assert_eq!(report.block_size, 16);
        assert_eq!(report.max_lpc_order, 2);
        assert_eq!(report.nmean, 4);
        assert_eq!(report.verbatim_header_bytes, 44);
        assert_eq!(report.input_bytes, EXAMPLE_DATA.len() as u64);

        let totals = report.totals.unwrap();
        assert_eq!(totals.blocks, 3);
        assert_eq!(totals.samples_per_channel, 48);
        assert_eq!(totals.duration, "00:00:00.001");
    }

    #[test]
    fn header_only_skips_totals() {
        let reader = InputReader::from_reader(Cursor::new(EXAMPLE_DATA));
        let report = analyze_stream(reader, log::Level::Error, true, 1024)
            .unwrap()
            .unwrap();
        assert_eq!(report.channels, 2);
        assert!(report.totals.is_none());

        let yaml = serde_yaml_ng::to_string(&report).unwrap();
        assert!(yaml.contains("sample_rate: 44100"));
        assert!(!yaml.contains("totals"));
    }

    #[test]
    fn garbage_is_an_error() {
        let reader = InputReader::from_reader(Cursor::new(&b"RIFF not shorten at all"[..]));
        assert!(analyze_stream(reader, log::Level::Error, false, 1024).is_err());
    }
}
