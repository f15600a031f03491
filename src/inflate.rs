//! Drives `flate2`'s streaming zlib inflater over the concatenated `IDAT`
//! payload, producing the filtered stream.

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::debug;

use crate::error::{DecodeError, Result};

const SLIDING_BUFFER_SIZE: usize = 64 * 1024;

pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    let mut buf = [0u8; SLIDING_BUFFER_SIZE];

    loop {
        let n = decoder
            .read(&mut buf)
            .map_err(|e| DecodeError::DecompressFailed(e.to_string()))?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }

    debug!(
        "inflated {} compressed byte(s) into {} filtered byte(s)",
        compressed.len(),
        out.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn round_trips_through_zlib() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let compressed = zlib_compress(&original);
        let decompressed = inflate(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn garbage_input_is_a_typed_error() {
        assert!(matches!(
            inflate(&[0xFF, 0xFF, 0xFF, 0xFF]),
            Err(DecodeError::DecompressFailed(_))
        ));
    }
}
