//! Block compression seam for sealed pages and metadata blobs.

use ntkv_result::{Error, Result};

/// Compresses and decompresses whole blobs. A compressed blob whose size
/// equals the uncompressed size is stored raw; the reader detects that by
/// size equality, so `compress` must never return an output at least as
/// large as its input unless it IS the input.
pub trait BlockCodec: Send + Sync {
    /// Compress `src` at the given level; `0` stores raw.
    fn compress(&self, src: &[u8], level: i32) -> Result<Vec<u8>>;

    /// Decompress `src` into exactly `expected_len` bytes.
    fn decompress(&self, src: &[u8], expected_len: usize) -> Result<Vec<u8>>;
}

/// Default codec backed by zstd.
#[derive(Default)]
pub struct ZstdCodec;

impl BlockCodec for ZstdCodec {
    fn compress(&self, src: &[u8], level: i32) -> Result<Vec<u8>> {
        if level == 0 {
            return Ok(src.to_vec());
        }
        let out = zstd::bulk::compress(src, level)?;
        if out.len() >= src.len() {
            // Not worth it; store raw.
            Ok(src.to_vec())
        } else {
            Ok(out)
        }
    }

    fn decompress(&self, src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        if src.len() == expected_len {
            return Ok(src.to_vec());
        }
        let out = zstd::bulk::decompress(src, expected_len)?;
        if out.len() != expected_len {
            return Err(Error::Internal(format!(
                "decompressed {} bytes, expected {}",
                out.len(),
                expected_len
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressible_data_roundtrips() {
        let codec = ZstdCodec;
        let src = vec![7u8; 4096];
        let zipped = codec.compress(&src, 3).unwrap();
        assert!(zipped.len() < src.len());
        assert_eq!(codec.decompress(&zipped, src.len()).unwrap(), src);
    }

    #[test]
    fn level_zero_stores_raw() {
        let codec = ZstdCodec;
        let src = b"small".to_vec();
        let zipped = codec.compress(&src, 0).unwrap();
        assert_eq!(zipped, src);
        assert_eq!(codec.decompress(&zipped, src.len()).unwrap(), src);
    }

    #[test]
    fn incompressible_data_is_stored_raw() {
        let codec = ZstdCodec;
        // Tiny inputs always grow under zstd framing.
        let src = b"x".to_vec();
        let zipped = codec.compress(&src, 19).unwrap();
        assert_eq!(zipped, src);
    }
}
