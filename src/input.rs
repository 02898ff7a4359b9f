use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::Result;

/// Byte source for the decoder: a file, or stdin when the path is `-`.
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
    total_size: Option<u64>,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let is_pipe = input_path.as_ref().as_os_str() == "-";

        if is_pipe {
            return Ok(Self {
                reader: Box::new(io::stdin().lock()),
                is_pipe,
                total_size: None,
            });
        }

        let file = File::open(input_path)?;
        let total_size = file.metadata().ok().map(|m| m.len());

        Ok(Self {
            reader: Box::new(BufReader::new(file)),
            is_pipe,
            total_size,
        })
    }

    #[cfg(test)]
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            is_pipe: false,
            total_size: None,
        }
    }

    /// Returns the number of bytes read, 0 at EOF.
    pub fn read_chunk(&mut self, buffer: &mut [u8]) -> Result<usize> {
        loop {
            match self.reader.read(buffer) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Size of the input in bytes, when it is a regular file.
    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    /// Feeds the input to `callback` in chunks of at most `chunk_size` bytes.
    /// The callback returns `Ok(false)` to stop early.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        let mut buffer = vec![0u8; chunk_size.max(1)];

        loop {
            let bytes_read = self.read_chunk(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            if !callback(&buffer[..bytes_read])? {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn chunks_cover_the_input() {
        let data: Vec<u8> = (0..=200).collect();
        let mut reader = InputReader::from_reader(Cursor::new(data.clone()));

        let mut sizes = Vec::new();
        let mut collected = Vec::new();
        reader
            .process_chunks(64, |chunk| {
                sizes.push(chunk.len());
                collected.extend_from_slice(chunk);
                Ok(true)
            })
            .unwrap();

        assert_eq!(collected, data);
        assert!(sizes.iter().all(|&n| n <= 64));
        assert!(!reader.is_pipe());
        assert_eq!(reader.total_size(), None);
    }

    #[test]
    fn callback_can_stop_early() {
        let mut reader = InputReader::from_reader(Cursor::new(vec![0u8; 100]));
        let mut calls = 0;
        reader
            .process_chunks(10, |_| {
                calls += 1;
                Ok(calls < 3)
            })
            .unwrap();
        assert_eq!(calls, 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(InputReader::new("/nonexistent/input.shn").is_err());
    }
}
