use anyhow::Result;
use shorten::process::decode::{DecodeStatus, Decoder};

/// Runs `decoder` over one input chunk, re-offering the unconsumed tail
/// until the decoder has taken all of it and asks for more.
///
/// `on_status` sees every status the decoder reports and returns
/// `Ok(false)` to stop. Returns `Ok(false)` once decoding should stop, either
/// because the stream finished or the callback asked to.
pub fn decode_chunk<F>(decoder: &mut Decoder, chunk: &[u8], mut on_status: F) -> Result<bool>
where
    F: FnMut(&Decoder, DecodeStatus) -> Result<bool>,
{
    let mut offset = 0;

    loop {
        let output = decoder.decode(Some(&chunk[offset..]))?;
        offset += output.consumed;

        let waiting = output.status == DecodeStatus::NeedMoreInput;
        let finished = output.status == DecodeStatus::Finished;

        if !on_status(decoder, output.status)? || finished {
            return Ok(false);
        }

        if waiting && offset == chunk.len() {
            return Ok(true);
        }
    }
}

/// Flushes `decoder` at end of input until the stream reports finished.
pub fn flush_decoder<F>(decoder: &mut Decoder, mut on_status: F) -> Result<()>
where
    F: FnMut(&Decoder, DecodeStatus) -> Result<bool>,
{
    loop {
        let output = decoder.decode(None)?;
        let finished = output.status == DecodeStatus::Finished;

        if !on_status(decoder, output.status)? || finished {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorten::process::EXAMPLE_DATA;
    use shorten::process::decode::DecoderConfig;
    use shorten::structs::frame::DecodedFrame;

    fn collect(chunk_size: usize, initial_frame_size: usize) -> Vec<DecodedFrame> {
        let mut decoder = Decoder::with_config(DecoderConfig {
            initial_frame_size,
            ..Default::default()
        });
        let mut frames = Vec::new();
        let mut keep = |_: &Decoder, status: DecodeStatus| -> Result<bool> {
            if let DecodeStatus::Frame(frame) = status {
                frames.push(frame);
            }
            Ok(true)
        };

        for chunk in EXAMPLE_DATA.chunks(chunk_size) {
            if !decode_chunk(&mut decoder, chunk, &mut keep).unwrap() {
                break;
            }
        }
        flush_decoder(&mut decoder, &mut keep).unwrap();

        assert!(decoder.is_finished());
        frames
    }

    #[test]
    fn chunking_does_not_change_output() {
        let whole = collect(EXAMPLE_DATA.len(), 1024);
        assert_eq!(whole.len(), 3);
        assert!(whole.iter().all(|f| f.channels == 2 && f.block_size == 16));

        for chunk_size in [1, 3, 7, 64] {
            assert_eq!(collect(chunk_size, 16), whole);
        }
    }

    #[test]
    fn callback_stops_decoding() {
        let mut decoder = Decoder::with_config(DecoderConfig {
            initial_frame_size: 16,
            ..Default::default()
        });
        let mut frames = 0;
        let mut first_only = |_: &Decoder, status: DecodeStatus| -> Result<bool> {
            if matches!(status, DecodeStatus::Frame(_)) {
                frames += 1;
            }
            Ok(frames < 1)
        };

        if decode_chunk(&mut decoder, EXAMPLE_DATA, &mut first_only).unwrap() {
            flush_decoder(&mut decoder, &mut first_only).unwrap();
        }

        assert_eq!(frames, 1);
        assert!(!decoder.is_finished());
    }
}
