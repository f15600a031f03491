//! The sample unpacker: turns a raster byte stream into a dense grid of
//! 16-bit-per-channel pixels, plus the handful of helpers (`PixelGrid`,
//! `PixelFormat`, packing, alpha padding) downstream GPU-upload code needs.
//!
//! The original C++ this behaviour is modelled on dispatched through a
//! base-class hierarchy (`Image` subclasses per colour type, with a virtual
//! call in the hot per-pixel loop). Colour type and bit depth are closed,
//! known-at-header-parse-time alternatives, so a match on a plain enum does
//! the same job without the indirection.

use crate::bits::{get_sample, normalise_to_8bit};
use crate::error::{DecodeError, Result};
use crate::header::{ColourType, ImageHeader};
use crate::palette::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgb16,
    Rgba8,
    Rgba16,
}

impl PixelFormat {
    pub fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba8 | PixelFormat::Rgba16)
    }

    /// Bytes contributed by one channel on the wire: 1 for the `*8` formats,
    /// 2 for the `*16` formats.
    pub fn channel_byte_size(self) -> usize {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => 1,
            PixelFormat::Rgb16 | PixelFormat::Rgba16 => 2,
        }
    }

    pub fn channel_count(self) -> usize {
        if self.has_alpha() {
            4
        } else {
            3
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.channel_count() * self.channel_byte_size()
    }
}

fn output_format(colour_type: ColourType, bit_depth: u8) -> PixelFormat {
    match (colour_type, bit_depth) {
        (ColourType::Greyscale, 16) => PixelFormat::Rgb16,
        (ColourType::Greyscale, _) => PixelFormat::Rgb8,
        (ColourType::Truecolour, 16) => PixelFormat::Rgb16,
        (ColourType::Truecolour, _) => PixelFormat::Rgb8,
        // Indexed alpha (tRNS) is out of scope; always plain RGB8.
        (ColourType::Indexed, _) => PixelFormat::Rgb8,
        (ColourType::GreyscaleAlpha, 16) => PixelFormat::Rgba16,
        (ColourType::GreyscaleAlpha, _) => PixelFormat::Rgba8,
        (ColourType::TruecolourAlpha, 16) => PixelFormat::Rgba16,
        (ColourType::TruecolourAlpha, _) => PixelFormat::Rgba8,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Converts the pixel store into a tightly packed `width * height *
    /// bytes_per_pixel` buffer suitable for a GPU staging upload: row-major,
    /// channels in R, G, B, (A) order, big-endian-on-the-wire values
    /// truncated or kept per the format's channel width.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let bpp = self.format.bytes_per_pixel();
        let mut out = Vec::with_capacity(self.pixels.len() * bpp);
        let channel_bytes = self.format.channel_byte_size();
        let has_alpha = self.format.has_alpha();

        for pixel in &self.pixels {
            for channel in [pixel.r, pixel.g, pixel.b] {
                push_channel(&mut out, channel, channel_bytes);
            }
            if has_alpha {
                push_channel(&mut out, pixel.a, channel_bytes);
            }
        }
        out
    }

    /// Converts an RGB grid into the matching RGBA grid, inserting an opaque
    /// alpha channel (max value for the channel width). A no-op format-wise
    /// if the grid already carries alpha.
    pub fn add_alpha_channel(mut self) -> PixelGrid {
        let (new_format, max_alpha) = match self.format {
            PixelFormat::Rgb8 => (PixelFormat::Rgba8, 0xFFu16),
            PixelFormat::Rgb16 => (PixelFormat::Rgba16, 0xFFFFu16),
            PixelFormat::Rgba8 | PixelFormat::Rgba16 => return self,
        };
        for pixel in &mut self.pixels {
            pixel.a = max_alpha;
        }
        self.format = new_format;
        self
    }
}

fn push_channel(out: &mut Vec<u8>, value: u16, channel_bytes: usize) {
    if channel_bytes == 1 {
        out.push(value as u8);
    } else {
        out.extend_from_slice(&value.to_be_bytes());
    }
}

/// Unpacks a fully deinterlaced raster byte stream into a [`PixelGrid`].
/// `raster` must be exactly `height * header.row_byte_length(width)` bytes -
/// the *deinterlaced* buffer, never the raw per-pass interlaced one.
pub fn unpack(raster: &[u8], header: &ImageHeader, palette: Option<&Palette>) -> Result<PixelGrid> {
    let format = output_format(header.colour_type, header.bit_depth);
    let stride = header.row_byte_length(header.width);
    let width = header.width as usize;
    let height = header.height as usize;
    let bit_depth = header.bit_depth;

    if raster.len() < stride * height {
        return Err(DecodeError::Truncated {
            needed: stride * height - raster.len(),
        });
    }

    let mut pixels = Vec::with_capacity(width * height);

    for y in 0..height {
        let row = &raster[y * stride..(y + 1) * stride];
        for x in 0..width {
            let pixel = match header.colour_type {
                ColourType::Truecolour | ColourType::TruecolourAlpha => {
                    let channel = |i: usize| get_sample(row, bit_depth, x * channels(header.colour_type) + i);
                    Pixel {
                        r: channel(0),
                        g: channel(1),
                        b: channel(2),
                        a: if header.colour_type == ColourType::TruecolourAlpha {
                            channel(3)
                        } else {
                            0
                        },
                    }
                }
                ColourType::Greyscale => {
                    let v = get_sample(row, bit_depth, x);
                    let v = if bit_depth < 8 {
                        normalise_to_8bit(v, bit_depth) as u16
                    } else {
                        v
                    };
                    Pixel { r: v, g: v, b: v, a: 0 }
                }
                ColourType::GreyscaleAlpha => {
                    let grey = get_sample(row, bit_depth, x * 2);
                    let alpha = get_sample(row, bit_depth, x * 2 + 1);
                    Pixel { r: grey, g: grey, b: grey, a: alpha }
                }
                ColourType::Indexed => {
                    let index = get_sample(row, bit_depth, x) as usize;
                    let palette = palette.ok_or_else(|| {
                        DecodeError::BadChunkOrder(
                            "indexed-colour image decoded with no palette".into(),
                        )
                    })?;
                    let rgb = palette.get(index)?;
                    Pixel {
                        r: rgb[0] as u16,
                        g: rgb[1] as u16,
                        b: rgb[2] as u16,
                        a: 0,
                    }
                }
            };
            pixels.push(pixel);
        }
    }

    Ok(PixelGrid {
        width: header.width,
        height: header.height,
        format,
        pixels,
    })
}

fn channels(colour_type: ColourType) -> usize {
    match colour_type {
        ColourType::Greyscale | ColourType::Indexed => 1,
        ColourType::GreyscaleAlpha => 2,
        ColourType::Truecolour => 3,
        ColourType::TruecolourAlpha => 4,
    }
}


#[cfg(test)]
impl Palette {
    pub fn from_test_entries(entries: Vec<[u8; 3]>) -> Palette {
        let mut payload = Vec::new();
        for e in &entries {
            payload.extend_from_slice(e);
        }
        crate::palette::parse_plte(&payload, ColourType::Indexed, 8).unwrap()
    }
}
