//! A PNG decoder core: chunk framing, CRC verification, zlib inflation,
//! scanline unfiltering, Adam7 de-interlacing and sample unpacking, producing
//! a dense grid of RGB(A) pixels from raw file bytes.
//!
//! ```no_run
//! let bytes = std::fs::read("image.png").unwrap();
//! let grid = png_core::decode(&bytes).unwrap();
//! println!("{}x{} pixels, format {:?}", grid.width, grid.height, grid.format);
//! ```

mod bits;
mod chunk;
mod crc;
mod cursor;
mod decoder;
mod error;
mod filter;
mod header;
mod inflate;
mod interlace;
mod palette;
mod pixel;

pub use decoder::{decode, decode_with_options, DecodeOptions};
pub use error::{DecodeError, Result};
pub use header::{ColourType, ImageHeader};
pub use palette::Palette;
pub use pixel::{Pixel, PixelFormat, PixelGrid};
