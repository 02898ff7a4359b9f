pub mod bitstream_io;
pub mod errors;

#[cfg(test)]
pub(crate) mod testing;
