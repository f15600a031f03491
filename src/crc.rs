//! CRC-32 as used by the PNG chunk format: polynomial `0xEDB88320` (reflected),
//! the standard zlib/PNG variant.
//!
//! The 256-entry table is built once and shared read-only across every decode
//! call in the process (a `OnceLock`), rather than recomputed per file or tied
//! to a single decoder instance - it depends on nothing but the fixed
//! polynomial, so there is nothing gained from keeping one copy per decode.

use std::sync::OnceLock;

const POLY: u32 = 0xEDB88320;

static TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn table() -> &'static [u32; 256] {
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (n, slot) in table.iter_mut().enumerate() {
            let mut c = n as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 { POLY ^ (c >> 1) } else { c >> 1 };
            }
            *slot = c;
        }
        table
    })
}

/// CRC-32 over `bytes`, covering exactly the bytes given - callers are
/// responsible for passing `type || payload`, never the length or the stored
/// CRC itself.
pub fn crc32(bytes: &[u8]) -> u32 {
    let table = table();
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = table[index] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}
