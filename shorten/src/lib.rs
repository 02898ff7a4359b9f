#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Incremental decoder for Shorten lossless audio bitstreams.
//!
//! ### Bitstream Organization
//!
//! **Header**: The `ajkg` magic, a version byte and the global stream
//! parameters, followed by a verbatim block carrying the original WAVE header.
//! **Body**: A sequence of commands. Audio commands decode one block of one
//! channel; the others skip verbatim data, change the bitshift or block
//! size, or end the stream.
//!
//! ### Prediction
//!
//! - Fixed polynomial predictors of order 0 to 3
//! - Quantized LPC with coefficients transmitted per block
//! - Offset correction from a running mean of previous blocks
//!
//! ### Resumable Parsing
//!
//! Input may arrive in chunks of any size. Parsing stops at command
//! boundaries when the buffered data runs out and resumes at the same bit on
//! the next call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shorten::process::{EXAMPLE_DATA, decode::{DecodeStatus, Decoder}};
//!
//! let mut decoder = Decoder::default();
//! let mut rest = EXAMPLE_DATA;
//!
//! // Push bitstream data, re-offering whatever was not consumed
//! while !rest.is_empty() {
//!     let out = decoder.decode(Some(rest))?;
//!     rest = &rest[out.consumed..];
//!     if let DecodeStatus::Frame(frame) = out.status {
//!         let pcm_samples = &frame.samples;
//!     }
//! }
//!
//! // Flush until the stream ends
//! loop {
//!     match decoder.decode(None)?.status {
//!         DecodeStatus::Frame(frame) => {
//!             let pcm_samples = &frame.samples;
//!         }
//!         DecodeStatus::Finished => break,
//!         _ => {}
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Decoding of Shorten bitstreams.
///
/// 1. **Buffering** ([`process::input`]): Accumulates input across calls.
///
/// 2. **Decoding** ([`process::decode`]): Header parsing and the command
///    interpreter.
pub mod process;

/// Data structures representing Shorten format components.
///
/// - **Stream Header** ([`structs::header`]): Global stream parameters
/// - **WAVE Header** ([`structs::wave`]): Embedded PCM format
/// - **Commands** ([`structs::command`]): Function codes
/// - **Channel History** ([`structs::channel`]): Prediction context and means
/// - **Predictors** ([`structs::predictor`]): Fixed and QLPC prediction
/// - **Frames** ([`structs::frame`]): Interleaved output
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading and Rice codes
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
