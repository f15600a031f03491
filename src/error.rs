//! The closed error taxonomy returned by every fallible stage of the decoder.
//!
//! There is exactly one error type for the whole pipeline. Nothing in this crate
//! panics on malformed input; a bad byte anywhere turns into one of these variants
//! and short-circuits the decode.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("input ended mid-field (needed {needed} more byte(s))")]
    Truncated { needed: usize },

    #[error("PNG signature check failed")]
    BadSignature,

    #[error("chunk length {0} exceeds the maximum permitted by the spec")]
    BadChunkLength(u32),

    #[error("chunk type code `{0}` is not a valid PNG chunk identifier")]
    InvalidChunk(String),

    #[error("CRC mismatch in `{chunk}` chunk: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        chunk: String,
        stored: u32,
        computed: u32,
    },

    #[error("chunk ordering violation: {0}")]
    BadChunkOrder(String),

    #[error("invalid IHDR: {0}")]
    BadHeader(String),

    #[error("image dimensions {width}x{height} exceed the configured maximum of {max}")]
    ImageTooLarge { width: u32, height: u32, max: u32 },

    #[error("DEFLATE decompression failed: {0}")]
    DecompressFailed(String),

    #[error("scanline filter type {0} is not one of None/Sub/Up/Average/Paeth")]
    BadFilter(u8),

    #[error("palette index {index} is out of range for a palette of {len} entries")]
    PaletteIndex { index: usize, len: usize },

    #[error("invalid PLTE chunk: {0}")]
    BadPalette(String),
}
