//! The pipeline driver: chains inflate → reconstruct → deinterlace → unpack
//! once the chunk reader has handed over a parsed header, optional palette,
//! and the concatenated `IDAT` payload. Any stage failing short-circuits the
//! whole decode - no partial pixel grid is ever returned.

use log::warn;

use crate::chunk::read_chunks;
use crate::error::Result;
use crate::filter::reconstruct_pass;
use crate::inflate::inflate;
use crate::interlace::deinterlace;
use crate::pixel::{unpack, PixelGrid};

/// The single tunable described for dimension limits: requests for images
/// wider or taller than this fail with `ImageTooLarge` rather than being
/// decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_dimension: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_dimension: 16384,
        }
    }
}

/// Decodes a PNG byte stream using the default [`DecodeOptions`].
pub fn decode(data: &[u8]) -> Result<PixelGrid> {
    decode_with_options(data, DecodeOptions::default())
}

/// Decodes a PNG byte stream, applying the given options. This is the one
/// entry point that owns the whole pipeline: signature → chunks → inflate →
/// reconstruct → deinterlace → unpack.
pub fn decode_with_options(data: &[u8], options: DecodeOptions) -> Result<PixelGrid> {
    decode_inner(data, options).map_err(|e| {
        warn!("decode failed: {e}");
        e
    })
}

fn decode_inner(data: &[u8], options: DecodeOptions) -> Result<PixelGrid> {
    let parsed = read_chunks(data)?;
    parsed.header.validate_dimensions(options.max_dimension)?;

    let filtered = inflate(&parsed.idat)?;

    let raster = if parsed.header.interlaced {
        deinterlace(&filtered, &parsed.header)?
    } else {
        let stride = parsed.header.row_byte_length(parsed.header.width);
        reconstruct_pass(
            &filtered,
            stride,
            parsed.header.height as usize,
            parsed.header.bytes_per_pixel(),
        )?
    };

    unpack(&raster, &parsed.header, parsed.palette.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc32;
    use crate::filter::filter_row;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn push_chunk(buf: &mut Vec<u8>, type_code: &[u8; 4], payload: &[u8]) {
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        let mut crc_input = type_code.to_vec();
        crc_input.extend_from_slice(payload);
        buf.extend_from_slice(&crc_input);
        buf.extend_from_slice(&crc32(&crc_input).to_be_bytes());
    }

    fn ihdr(width: u32, height: u32, bit_depth: u8, colour_type: u8, interlace: u8) -> Vec<u8> {
        let mut v = Vec::with_capacity(13);
        v.extend_from_slice(&width.to_be_bytes());
        v.extend_from_slice(&height.to_be_bytes());
        v.extend_from_slice(&[bit_depth, colour_type, 0, 0, interlace]);
        v
    }

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn none_filtered_scanlines(rows: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        for row in rows {
            out.push(0);
            out.extend_from_slice(&filter_row(0, row, &[], 1));
        }
        out
    }

    fn build_png(
        width: u32,
        height: u32,
        bit_depth: u8,
        colour_type: u8,
        interlace: u8,
        palette: Option<&[[u8; 3]]>,
        scanlines: &[u8],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIGNATURE);
        push_chunk(&mut buf, b"IHDR", &ihdr(width, height, bit_depth, colour_type, interlace));
        if let Some(entries) = palette {
            let mut payload = Vec::new();
            for e in entries {
                payload.extend_from_slice(e);
            }
            push_chunk(&mut buf, b"PLTE", &payload);
        }
        let compressed = zlib_compress(scanlines);
        push_chunk(&mut buf, b"IDAT", &compressed);
        push_chunk(&mut buf, b"IEND", &[]);
        buf
    }

    #[test]
    fn two_pixel_truecolour_8bit_decodes_end_to_end() {
        let rows = vec![vec![255u8, 0, 0, 0, 255, 0]];
        let scanlines = none_filtered_scanlines(&rows);
        let png = build_png(2, 1, 8, 2, 0, None, &scanlines);

        let grid = decode(&png).unwrap();
        assert_eq!(grid.format, crate::pixel::PixelFormat::Rgb8);
        assert_eq!(grid.get(0, 0), crate::pixel::Pixel { r: 255, g: 0, b: 0, a: 0 });
        assert_eq!(grid.get(1, 0), crate::pixel::Pixel { r: 0, g: 255, b: 0, a: 0 });
    }

    #[test]
    fn one_pixel_greyscale_1bit_decodes_end_to_end() {
        let rows = vec![vec![0b1000_0000u8]];
        let scanlines = none_filtered_scanlines(&rows);
        let png = build_png(1, 1, 1, 0, 0, None, &scanlines);

        let grid = decode(&png).unwrap();
        assert_eq!(grid.format, crate::pixel::PixelFormat::Rgb8);
        assert_eq!(
            grid.get(0, 0),
            crate::pixel::Pixel { r: 255, g: 255, b: 255, a: 0 }
        );
    }

    #[test]
    fn indexed_checkerboard_resolves_through_the_whole_pipeline() {
        let mut rows = Vec::new();
        for y in 0..8u32 {
            let mut row = Vec::new();
            let mut nibble_hi = None;
            for x in 0..8u32 {
                let idx: u8 = if (x + y) % 2 == 0 { 0 } else { 1 };
                match nibble_hi {
                    None => nibble_hi = Some(idx),
                    Some(hi) => {
                        row.push((hi << 4) | idx);
                        nibble_hi = None;
                    }
                }
            }
            rows.push(row);
        }
        let scanlines = none_filtered_scanlines(&rows);
        let palette = [[255u8, 0, 0], [0u8, 0, 255]];
        let png = build_png(8, 8, 4, 3, 0, Some(&palette), &scanlines);

        let grid = decode(&png).unwrap();
        assert_eq!(grid.format, crate::pixel::PixelFormat::Rgb8);
        for y in 0..8u32 {
            for x in 0..8u32 {
                let p = grid.get(x, y);
                let expected = if (x + y) % 2 == 0 { [255, 0, 0] } else { [0, 0, 255] };
                assert_eq!([p.r as u8, p.g as u8, p.b as u8], expected, "at ({x},{y})");
            }
        }
    }

    #[test]
    fn paeth_filtered_truecolour_rows_decode_correctly() {
        let rows: Vec<Vec<u8>> = vec![
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90],
            vec![11, 21, 31, 41, 51, 61, 71, 81, 91],
            vec![12, 22, 32, 42, 52, 62, 72, 82, 92],
        ];
        let mut scanlines = Vec::new();
        let mut prev: Vec<u8> = Vec::new();
        for row in &rows {
            let filtered = filter_row(4, row, &prev, 3);
            scanlines.push(4);
            scanlines.extend_from_slice(&filtered);
            prev = row.clone();
        }
        let png = build_png(3, 3, 8, 2, 0, None, &scanlines);

        let grid = decode(&png).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for x in 0..3usize {
                let p = grid.get(x as u32, y as u32);
                assert_eq!(
                    [p.r as u8, p.g as u8, p.b as u8],
                    [row[x * 3], row[x * 3 + 1], row[x * 3 + 2]]
                );
            }
        }
    }

    #[test]
    fn crc_corrupted_ihdr_is_rejected() {
        let rows = vec![vec![1u8, 2, 3]];
        let scanlines = none_filtered_scanlines(&rows);
        let mut png = build_png(1, 1, 8, 2, 0, None, &scanlines);
        let ihdr_payload_start = SIGNATURE.len() + 4 + 4;
        png[ihdr_payload_start] ^= 0xFF;
        assert!(matches!(
            decode(&png),
            Err(crate::error::DecodeError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn trailing_data_after_iend_is_rejected() {
        let rows = vec![vec![1u8, 2, 3]];
        let scanlines = none_filtered_scanlines(&rows);
        let mut png = build_png(1, 1, 8, 2, 0, None, &scanlines);
        png.push(0xAA);
        assert!(matches!(
            decode(&png),
            Err(crate::error::DecodeError::BadChunkOrder(_))
        ));
    }

    #[test]
    fn missing_plte_for_indexed_colour_is_rejected() {
        let rows = vec![vec![0u8]];
        let scanlines = none_filtered_scanlines(&rows);
        let png = build_png(1, 1, 8, 3, 0, None, &scanlines);
        assert!(matches!(
            decode(&png),
            Err(crate::error::DecodeError::BadChunkOrder(_))
        ));
    }

    #[test]
    fn oversized_image_is_rejected_by_options() {
        let rows = vec![vec![1u8, 2, 3]];
        let scanlines = none_filtered_scanlines(&rows);
        let png = build_png(1, 1, 8, 2, 0, None, &scanlines);
        let options = DecodeOptions { max_dimension: 0 };
        assert!(matches!(
            decode_with_options(&png, options),
            Err(crate::error::DecodeError::ImageTooLarge { .. })
        ));
    }
}
