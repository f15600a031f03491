//! The chunk reader: iterates length-prefixed chunks, classifies each by its
//! four-ASCII type code, enforces PNG's ordering invariants, and dispatches the
//! four critical chunk kinds (IHDR, PLTE, IDAT, IEND) to their parsers.

use log::{debug, trace};

use crate::crc::crc32;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::header::{parse_ihdr, ColourType, ImageHeader};
use crate::palette::{parse_plte, Palette};

const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const SIGNATURE_XOR_CHECK: u8 = 0xC7;
const MAX_CHUNK_LENGTH: u32 = (1 << 31) - 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CriticalKind {
    Ihdr,
    Plte,
    Idat,
    Iend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    Critical(CriticalKind),
    Unknown,
}

fn classify(type_code: [u8; 4]) -> Result<ChunkKind> {
    if !type_code.iter().all(|b| b.is_ascii_alphabetic()) {
        return Err(invalid_chunk(type_code));
    }
    // Reserved bit (third letter): must be upper-case, mirroring the PNG
    // spec's reserved-bit convention.
    if !type_code[2].is_ascii_uppercase() {
        return Err(invalid_chunk(type_code));
    }
    match &type_code {
        b"IHDR" => Ok(ChunkKind::Critical(CriticalKind::Ihdr)),
        b"PLTE" => Ok(ChunkKind::Critical(CriticalKind::Plte)),
        b"IDAT" => Ok(ChunkKind::Critical(CriticalKind::Idat)),
        b"IEND" => Ok(ChunkKind::Critical(CriticalKind::Iend)),
        _ if type_code[0].is_ascii_lowercase() || type_code[1].is_ascii_lowercase() => {
            Ok(ChunkKind::Unknown)
        }
        // Looks critical (ancillary bit says "critical") but isn't one of the
        // four recognised types: cannot be safely skipped.
        _ => Err(invalid_chunk(type_code)),
    }
}

fn invalid_chunk(type_code: [u8; 4]) -> DecodeError {
    DecodeError::InvalidChunk(String::from_utf8_lossy(&type_code).into_owned())
}

fn type_code_str(type_code: [u8; 4]) -> String {
    String::from_utf8_lossy(&type_code).into_owned()
}

/// Everything the chunk reader assembles before the pipeline driver takes over:
/// the parsed header, an optional palette, and the concatenated `IDAT` payload.
pub struct ParsedChunks {
    pub header: ImageHeader,
    pub palette: Option<Palette>,
    pub idat: Vec<u8>,
}

/// Verifies the 8-byte PNG signature via the XOR-checksum scheme and advances
/// the cursor past it.
fn verify_signature(cursor: &mut ByteCursor) -> Result<()> {
    let bytes = cursor.consume(8)?;
    let check = bytes.iter().fold(0u8, |acc, b| acc ^ b);
    if bytes != SIGNATURE || check != SIGNATURE_XOR_CHECK {
        return Err(DecodeError::BadSignature);
    }
    Ok(())
}

pub fn read_chunks(data: &[u8]) -> Result<ParsedChunks> {
    let mut cursor = ByteCursor::new(data);
    verify_signature(&mut cursor)?;

    let mut header: Option<ImageHeader> = None;
    let mut palette: Option<Palette> = None;
    let mut idat: Vec<u8> = Vec::new();
    let mut seen_ihdr = false;
    let mut seen_plte = false;
    let mut seen_iend = false;
    let mut in_idat_run = false;
    let mut chunk_index = 0usize;

    while !seen_iend {
        if cursor.remaining() == 0 {
            return Err(DecodeError::Truncated { needed: 1 });
        }

        let length = cursor.read_u32_be()?;
        if length > MAX_CHUNK_LENGTH {
            return Err(DecodeError::BadChunkLength(length));
        }

        // CRC covers type + payload, which starts right after the length field.
        let crc_input = cursor.peek(4 + length as usize)?;
        let type_code: [u8; 4] = crc_input[0..4].try_into().unwrap();
        let payload = &crc_input[4..];
        let stored_crc = {
            // Stored CRC sits after type + payload; peek far enough to read it
            // without double-consuming what we already peeked.
            let crc_bytes = {
                let start = cursor.position() + 4 + length as usize;
                let total = data.len();
                if start + 4 > total {
                    return Err(DecodeError::Truncated {
                        needed: start + 4 - total,
                    });
                }
                &data[start..start + 4]
            };
            u32::from_be_bytes(crc_bytes.try_into().unwrap())
        };

        let computed_crc = crc32(crc_input);
        if computed_crc != stored_crc {
            return Err(DecodeError::CrcMismatch {
                chunk: type_code_str(type_code),
                stored: stored_crc,
                computed: computed_crc,
            });
        }

        // Now actually advance the cursor past type + payload + crc. The
        // slices peeked above already borrow these same bytes.
        cursor.consume(4 + length as usize + 4)?;

        let kind = classify(type_code)?;

        if chunk_index == 0 && !matches!(kind, ChunkKind::Critical(CriticalKind::Ihdr)) {
            return Err(DecodeError::BadChunkOrder(
                "the first chunk in the file must be IHDR".into(),
            ));
        }

        match kind {
            ChunkKind::Unknown => {
                trace!("skipping ancillary chunk `{}`", type_code_str(type_code));
                if in_idat_run {
                    return Err(DecodeError::BadChunkOrder(
                        "IDAT chunks must be contiguous".into(),
                    ));
                }
            }
            ChunkKind::Critical(CriticalKind::Ihdr) => {
                if seen_ihdr {
                    return Err(DecodeError::BadChunkOrder(
                        "duplicate IHDR chunk".into(),
                    ));
                }
                let parsed = parse_ihdr(payload)?;
                debug!(
                    "IHDR: {}x{} bit_depth={} colour_type={:?} interlaced={}",
                    parsed.width, parsed.height, parsed.bit_depth, parsed.colour_type, parsed.interlaced
                );
                seen_ihdr = true;
                header = Some(parsed);
            }
            ChunkKind::Critical(CriticalKind::Plte) => {
                let header_ref = header.as_ref().ok_or_else(|| {
                    DecodeError::BadChunkOrder("PLTE encountered before IHDR".into())
                })?;
                if seen_plte {
                    return Err(DecodeError::BadChunkOrder(
                        "duplicate PLTE chunk".into(),
                    ));
                }
                if matches!(
                    header_ref.colour_type,
                    ColourType::Greyscale | ColourType::GreyscaleAlpha
                ) {
                    return Err(DecodeError::BadChunkOrder(
                        "PLTE is forbidden for greyscale colour types".into(),
                    ));
                }
                if !idat.is_empty() || in_idat_run {
                    return Err(DecodeError::BadChunkOrder(
                        "PLTE must appear before IDAT".into(),
                    ));
                }
                let parsed = parse_plte(payload, header_ref.colour_type, header_ref.bit_depth)?;
                debug!("PLTE: {} entries", parsed.len());
                seen_plte = true;
                palette = Some(parsed);
            }
            ChunkKind::Critical(CriticalKind::Idat) => {
                let header_ref = header.as_ref().ok_or_else(|| {
                    DecodeError::BadChunkOrder("IDAT encountered before IHDR".into())
                })?;
                if header_ref.colour_type == ColourType::Indexed && !seen_plte {
                    return Err(DecodeError::BadChunkOrder(
                        "PLTE is mandatory before IDAT for indexed-colour images".into(),
                    ));
                }
                idat.extend_from_slice(payload);
                in_idat_run = true;
            }
            ChunkKind::Critical(CriticalKind::Iend) => {
                seen_iend = true;
            }
        }

        if !matches!(kind, ChunkKind::Critical(CriticalKind::Idat)) {
            in_idat_run = false;
        }

        chunk_index += 1;
    }

    if cursor.remaining() != 0 {
        return Err(DecodeError::BadChunkOrder(
            "trailing data after IEND".into(),
        ));
    }

    let header = header.ok_or_else(|| DecodeError::BadChunkOrder("no IHDR chunk found".into()))?;
    debug!(
        "accumulated {} bytes across all IDAT chunks",
        idat.len()
    );

    Ok(ParsedChunks {
        header,
        palette,
        idat,
    })
}
