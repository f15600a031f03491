//! IHDR parsing: dimensions, the five-field format descriptor, and the derived
//! per-pixel sample layout the rest of the pipeline is built around.

use crate::error::{DecodeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourType {
    Greyscale,
    Truecolour,
    Indexed,
    GreyscaleAlpha,
    TruecolourAlpha,
}

impl ColourType {
    fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(ColourType::Greyscale),
            2 => Ok(ColourType::Truecolour),
            3 => Ok(ColourType::Indexed),
            4 => Ok(ColourType::GreyscaleAlpha),
            6 => Ok(ColourType::TruecolourAlpha),
            other => Err(DecodeError::BadHeader(format!(
                "colour type {other} is not one of 0, 2, 3, 4, 6"
            ))),
        }
    }

    /// Number of samples contributed by one pixel, before bit-depth scaling.
    pub fn samples_per_pixel(self) -> u32 {
        match self {
            ColourType::Greyscale => 1,
            ColourType::Truecolour => 3,
            ColourType::Indexed => 1,
            ColourType::GreyscaleAlpha => 2,
            ColourType::TruecolourAlpha => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            ColourType::GreyscaleAlpha | ColourType::TruecolourAlpha
        )
    }

    fn allowed_bit_depths(self) -> &'static [u8] {
        match self {
            ColourType::Greyscale => &[1, 2, 4, 8, 16],
            ColourType::Indexed => &[1, 2, 4, 8],
            ColourType::Truecolour
            | ColourType::GreyscaleAlpha
            | ColourType::TruecolourAlpha => &[8, 16],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub colour_type: ColourType,
    pub interlaced: bool,
}

impl ImageHeader {
    /// Bits contributed by one full pixel (all channels, no rounding).
    pub fn bits_per_pixel(&self) -> u32 {
        self.colour_type.samples_per_pixel() * self.bit_depth as u32
    }

    /// Filter-reconstruction neighbour stride: bytes covering one pixel,
    /// rounded up to at least 1.
    pub fn bytes_per_pixel(&self) -> usize {
        ((self.bits_per_pixel() + 7) / 8).max(1) as usize
    }

    /// Byte length of one scanline (excluding the filter-type byte) at the
    /// given pixel width.
    pub fn row_byte_length(&self, width: u32) -> usize {
        let bits = width as u64 * self.bits_per_pixel() as u64;
        ((bits + 7) / 8) as usize
    }

    pub fn validate_dimensions(&self, max_dimension: u32) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DecodeError::BadHeader(
                "width and height must both be at least 1".into(),
            ));
        }
        if self.width > 0x7FFF_FFFF || self.height > 0x7FFF_FFFF {
            return Err(DecodeError::BadHeader(
                "width and height must fit in 31 bits per the PNG spec".into(),
            ));
        }
        if self.width > max_dimension || self.height > max_dimension {
            return Err(DecodeError::ImageTooLarge {
                width: self.width,
                height: self.height,
                max: max_dimension,
            });
        }
        Ok(())
    }
}

/// Parses a 13-byte IHDR payload. Dimension caps are checked separately by
/// [`ImageHeader::validate_dimensions`] once the caller's [`crate::DecodeOptions`]
/// is known.
pub fn parse_ihdr(payload: &[u8]) -> Result<ImageHeader> {
    if payload.len() != 13 {
        return Err(DecodeError::BadHeader(format!(
            "IHDR payload must be 13 bytes, got {}",
            payload.len()
        )));
    }

    let width = u32::from_be_bytes(payload[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(payload[4..8].try_into().unwrap());
    let bit_depth = payload[8];
    let colour_type = ColourType::from_raw(payload[9])?;
    let compression_method = payload[10];
    let filter_method = payload[11];
    let interlace_method = payload[12];

    if !colour_type.allowed_bit_depths().contains(&bit_depth) {
        return Err(DecodeError::BadHeader(format!(
            "bit depth {bit_depth} is not valid for this colour type"
        )));
    }
    if compression_method != 0 {
        return Err(DecodeError::BadHeader(format!(
            "unsupported compression method {compression_method}"
        )));
    }
    if filter_method != 0 {
        return Err(DecodeError::BadHeader(format!(
            "unsupported filter method {filter_method}"
        )));
    }
    let interlaced = match interlace_method {
        0 => false,
        1 => true,
        other => {
            return Err(DecodeError::BadHeader(format!(
                "unsupported interlace method {other}"
            )))
        }
    };

    Ok(ImageHeader {
        width,
        height,
        bit_depth,
        colour_type,
        interlaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ihdr_payload(width: u32, height: u32, bit_depth: u8, colour_type: u8, interlace: u8) -> Vec<u8> {
        let mut v = Vec::with_capacity(13);
        v.extend_from_slice(&width.to_be_bytes());
        v.extend_from_slice(&height.to_be_bytes());
        v.push(bit_depth);
        v.push(colour_type);
        v.push(0); // compression method
        v.push(0); // filter method
        v.push(interlace);
        v
    }

    #[test]
    fn parses_well_formed_truecolour_header() {
        let h = parse_ihdr(&ihdr_payload(2, 1, 8, 2, 0)).unwrap();
        assert_eq!(h.width, 2);
        assert_eq!(h.height, 1);
        assert_eq!(h.colour_type, ColourType::Truecolour);
        assert_eq!(h.bytes_per_pixel(), 3);
        assert_eq!(h.row_byte_length(2), 6);
        assert!(!h.interlaced);
    }

    #[test]
    fn rejects_bad_colour_type_bit_depth_combo() {
        // Colour type 3 (indexed) does not allow bit depth 16.
        assert!(parse_ihdr(&ihdr_payload(1, 1, 16, 3, 0)).is_err());
    }

    #[test]
    fn rejects_wrong_length_payload() {
        assert!(parse_ihdr(&[0; 12]).is_err());
    }

    #[test]
    fn rejects_nonzero_compression_method() {
        let mut payload = ihdr_payload(1, 1, 8, 0, 0);
        payload[10] = 1;
        assert!(parse_ihdr(&payload).is_err());
    }

    #[test]
    fn sub_byte_greyscale_bytes_per_pixel_rounds_up_to_one() {
        let h = parse_ihdr(&ihdr_payload(8, 1, 2, 0, 0)).unwrap();
        assert_eq!(h.bytes_per_pixel(), 1);
        assert_eq!(h.row_byte_length(8), 2);
    }

    #[test]
    fn dimension_cap_is_enforced_against_configured_max() {
        let h = parse_ihdr(&ihdr_payload(20000, 1, 8, 0, 0)).unwrap();
        assert!(matches!(
            h.validate_dimensions(16384),
            Err(DecodeError::ImageTooLarge { .. })
        ));
        assert!(h.validate_dimensions(20000).is_ok());
    }
}
