/// Incremental decoding of a Shorten bitstream.
///
/// Provides the [`Decoder`](decode::Decoder), which accepts byte chunks of
/// any size and returns one interleaved [`DecodedFrame`](crate::structs::frame::DecodedFrame)
/// per completed block.
pub mod decode;

/// Buffering of input between decode calls.
pub mod input;

/// Two channel stream with a block size of 16 using every predictor, a zero
/// block and a bitshift change.
pub const EXAMPLE_DATA: &[u8] = &[
    0x61, 0x6A, 0x6B, 0x67, 0x02, 0xFB, 0xB2, 0xE1, 0xB7, 0xC9, 0x2A, 0xCA,
    0x95, 0x26, 0x8D, 0x46, 0x92, 0x40, 0x20, 0x10, 0x0A, 0xBD, 0x06, 0xAD,
    0x45, 0xB3, 0x5B, 0x6E, 0x92, 0x08, 0x84, 0x02, 0x01, 0x00, 0x80, 0xC0,
    0x20, 0x50, 0x0A, 0x26, 0xB2, 0x01, 0x00, 0x88, 0x6C, 0x60, 0x50, 0x08,
    0x24, 0x02, 0x21, 0x00, 0xB2, 0x58, 0x6E, 0x96, 0x18, 0x04, 0x02, 0x01,
    0x00, 0xB7, 0x05, 0x74, 0x45, 0xF7, 0x1B, 0xB1, 0x22, 0x2C, 0x74, 0x9B,
    0xBE, 0xE3, 0xDE, 0x50, 0xA6, 0xFE, 0x5D, 0x7B, 0xC4, 0x48, 0x33, 0xB3,
    0x06, 0x09, 0x11, 0x20, 0x4B, 0x5A, 0xC8, 0xEC, 0x9B, 0xCB, 0xCF, 0x8A,
    0xB8, 0xC9, 0x08, 0xBC, 0x8B, 0x64, 0x88, 0xD6, 0x59, 0x03, 0x1F, 0xB3,
    0x6F, 0x3E, 0x40, 0x89, 0x6E, 0xAC, 0xE7, 0xA0, 0x97, 0xB2, 0x49, 0x5A,
    0x39, 0x47, 0x2E, 0x90, 0x8B, 0x4B, 0x49, 0x09, 0x94, 0x40,
];
