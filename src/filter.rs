//! Inverts PNG's five per-row filters (None, Sub, Up, Average, Paeth) to turn
//! the filtered stream back into raw scanline bytes.
//!
//! "Previous row" here always means the previous row *of the pass currently
//! being reconstructed* - for an interlaced image that is emphatically not the
//! previous row of the final raster, which is the single most common source of
//! Adam7 bugs (see the module doc on [`crate::interlace`]).

use crate::error::{DecodeError, Result};

/// The Paeth predictor: picks whichever of `a`, `b`, `c` is closest to
/// `a + b - c`, breaking ties in favour of `a`, then `b`.
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

/// Reconstructs one pass worth of scanlines: `filtered` is `rows` scanlines,
/// each `1 + stride` bytes (filter-type byte, then `stride` data bytes).
/// Returns `rows * stride` unfiltered bytes, in row-major order, with the
/// filter-type bytes stripped.
pub fn reconstruct_pass(filtered: &[u8], stride: usize, rows: usize, bpp: usize) -> Result<Vec<u8>> {
    let row_record_len = 1 + stride;
    let expected_len = row_record_len * rows;
    if filtered.len() < expected_len {
        return Err(DecodeError::Truncated {
            needed: expected_len - filtered.len(),
        });
    }

    let mut out = vec![0u8; stride * rows];

    for row in 0..rows {
        let record = &filtered[row * row_record_len..(row + 1) * row_record_len];
        let filter_type = record[0];
        let src = &record[1..];
        let out_start = row * stride;

        for x in 0..stride {
            let a = if x >= bpp { out[out_start + x - bpp] } else { 0 };
            let b = if row > 0 {
                out[out_start - stride + x]
            } else {
                0
            };
            let c = if row > 0 && x >= bpp {
                out[out_start - stride + x - bpp]
            } else {
                0
            };

            let recon = match filter_type {
                0 => src[x],
                1 => src[x].wrapping_add(a),
                2 => src[x].wrapping_add(b),
                3 => src[x].wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => src[x].wrapping_add(paeth_predictor(a, b, c)),
                other => return Err(DecodeError::BadFilter(other)),
            };
            out[out_start + x] = recon;
        }
    }

    Ok(out)
}

/// Forward (encode-direction) filters, used only by the test suite to assert
/// the filter round-trip property and to build synthetic fixtures. Not
/// reachable from the public decode API.
pub fn filter_row(filter_type: u8, row: &[u8], prev: &[u8], bpp: usize) -> Vec<u8> {
    let stride = row.len();
    let mut out = vec![0u8; stride];
    for x in 0..stride {
        let a = if x >= bpp { row[x - bpp] } else { 0 };
        let b = if prev.is_empty() { 0 } else { prev[x] };
        let c = if x >= bpp && !prev.is_empty() {
            prev[x - bpp]
        } else {
            0
        };

        out[x] = match filter_type {
            0 => row[x],
            1 => row[x].wrapping_sub(a),
            2 => row[x].wrapping_sub(b),
            3 => row[x].wrapping_sub(((a as u16 + b as u16) / 2) as u8),
            4 => row[x].wrapping_sub(paeth_predictor(a, b, c)),
            other => panic!("unsupported filter type {other} in test-only forward filter"),
        };
    }
    out
}
