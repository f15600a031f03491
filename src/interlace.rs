//! Adam7 de-interlacing: scatters the seven interlace passes back into raster
//! order. For non-interlaced images this whole stage is the identity and the
//! pipeline driver skips it entirely.
//!
//! Each pass is itself "just" a smaller image: it gets filter-reconstructed
//! with [`crate::filter::reconstruct_pass`] using its own stride and its own
//! row history, completely independent of the other passes and of the final
//! raster's row layout. Only after a pass is fully reconstructed do its pixels
//! get scattered into the destination raster.

use crate::bits::{get_sample, set_sample};
use crate::error::{DecodeError, Result};
use crate::filter::reconstruct_pass;
use crate::header::ImageHeader;

struct Adam7Pass {
    x_start: u32,
    y_start: u32,
    x_step: u32,
    y_step: u32,
}

const PASSES: [Adam7Pass; 7] = [
    Adam7Pass { x_start: 0, y_start: 0, x_step: 8, y_step: 8 },
    Adam7Pass { x_start: 4, y_start: 0, x_step: 8, y_step: 8 },
    Adam7Pass { x_start: 0, y_start: 4, x_step: 4, y_step: 8 },
    Adam7Pass { x_start: 2, y_start: 0, x_step: 4, y_step: 4 },
    Adam7Pass { x_start: 0, y_start: 2, x_step: 2, y_step: 4 },
    Adam7Pass { x_start: 1, y_start: 0, x_step: 2, y_step: 2 },
    Adam7Pass { x_start: 0, y_start: 1, x_step: 1, y_step: 2 },
];

fn ceil_div(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

/// Pixel dimensions of a pass's sub-image, or `None` if the pass contributes
/// no pixels at all (e.g. a 1-pixel-wide image has no columns for pass 2).
fn pass_dimensions(pass: &Adam7Pass, width: u32, height: u32) -> Option<(u32, u32)> {
    if pass.x_start >= width || pass.y_start >= height {
        return None;
    }
    let pass_width = ceil_div(width - pass.x_start, pass.x_step);
    let pass_height = ceil_div(height - pass.y_start, pass.y_step);
    Some((pass_width, pass_height))
}

pub fn deinterlace(filtered: &[u8], header: &ImageHeader) -> Result<Vec<u8>> {
    let bits_per_pixel = header.bits_per_pixel();
    let bpp = header.bytes_per_pixel();
    let final_stride = header.row_byte_length(header.width);
    let mut raster = vec![0u8; final_stride * header.height as usize];

    let mut offset = 0usize;

    for pass in &PASSES {
        let Some((pass_width, pass_height)) = pass_dimensions(pass, header.width, header.height)
        else {
            continue;
        };
        if pass_width == 0 || pass_height == 0 {
            continue;
        }

        let pass_stride = header.row_byte_length(pass_width);
        let record_len = 1 + pass_stride;
        let pass_len = record_len * pass_height as usize;

        if offset + pass_len > filtered.len() {
            return Err(DecodeError::Truncated {
                needed: offset + pass_len - filtered.len(),
            });
        }
        let pass_filtered = &filtered[offset..offset + pass_len];
        let pass_bytes = reconstruct_pass(pass_filtered, pass_stride, pass_height as usize, bpp)?;
        offset += pass_len;

        for j in 0..pass_height {
            let dest_row = (pass.y_start + j * pass.y_step) as usize;
            let src_row = &pass_bytes[(j as usize) * pass_stride..(j as usize + 1) * pass_stride];
            let dest_row_bytes =
                &mut raster[dest_row * final_stride..(dest_row + 1) * final_stride];

            for i in 0..pass_width {
                let dest_col = (pass.x_start + i * pass.x_step) as usize;

                if bits_per_pixel >= 8 {
                    let src_start = i as usize * bpp;
                    let dest_start = dest_col * bpp;
                    dest_row_bytes[dest_start..dest_start + bpp]
                        .copy_from_slice(&src_row[src_start..src_start + bpp]);
                } else {
                    let value = get_sample(src_row, header.bit_depth, i as usize);
                    set_sample(dest_row_bytes, header.bit_depth, dest_col, value);
                }
            }
        }
    }

    Ok(raster)
}
