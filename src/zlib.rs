//! zlib (RFC 1950) framing around the raw deflate codec.

use simd_adler32::Adler32;

use crate::{
    compress::{Compressor, DeflateOptions},
    decompress::{DecompressionError, Decompressor, InflateOptions},
};

/// CMF/FLG pair for deflate with a 32K window and the "fastest" level hint.
const ZLIB_HEADER: [u8; 2] = [0x78, 0x01];

fn adler32(data: &[u8]) -> u32 {
    let mut checksum = Adler32::new();
    checksum.write(data);
    checksum.finish()
}

/// Compress `input` into a zlib stream with the default deflate options.
pub fn compress_to_vec_zlib(input: &[u8]) -> Vec<u8> {
    compress_to_vec_zlib_with(input, DeflateOptions::default())
}

/// Compress `input` into a zlib stream.
pub fn compress_to_vec_zlib_with(input: &[u8], options: DeflateOptions) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() / 2 + 16);
    output.extend_from_slice(&ZLIB_HEADER);

    let mut output = Compressor::new(input, options)
        .with_output(output, ZLIB_HEADER.len())
        .compress();
    output.extend_from_slice(&adler32(input).to_be_bytes());
    output
}

/// Decompress a zlib stream and verify its checksum.
///
/// Streams that need a preset dictionary are rejected with
/// [`DecompressionError::BadZlibHeader`].
pub fn decompress_to_vec_zlib(input: &[u8]) -> Result<Vec<u8>, DecompressionError> {
    if input.len() < 2 {
        return Err(DecompressionError::InsufficientInput);
    }
    let header = [input[0], input[1]];
    if header[0] & 0x0f != 0x08
        || header[0] >> 4 > 7
        || u16::from_be_bytes(header) % 31 != 0
        || header[1] & 0x20 != 0
    {
        return Err(DecompressionError::BadZlibHeader);
    }

    let mut decompressor = Decompressor::new(
        input,
        InflateOptions {
            index: ZLIB_HEADER.len(),
            ..Default::default()
        },
    );
    let output = decompressor.decompress()?;

    let end = decompressor.input_index();
    let trailer = input
        .get(end..end + 4)
        .ok_or(DecompressionError::InsufficientInput)?;
    let checksum = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if checksum != adler32(&output) {
        return Err(DecompressionError::WrongChecksum);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompressionType;
    use rand::Rng;

    #[test]
    fn roundtrip() {
        let mut rng = rand::thread_rng();
        let text: Vec<u8> = (0..50_000).map(|_| b"zlib "[rng.gen_range(0..5)]).collect();
        for data in [Vec::new(), b"Hello world!".to_vec(), text] {
            for &compression_type in &[
                CompressionType::None,
                CompressionType::Fixed,
                CompressionType::Dynamic,
            ] {
                let options = DeflateOptions {
                    compression_type,
                    lazy_threshold: 0,
                };
                let compressed = compress_to_vec_zlib_with(&data, options);
                assert_eq!(&compressed[..2], &ZLIB_HEADER);
                assert_eq!(decompress_to_vec_zlib(&compressed).unwrap(), data);
                assert_eq!(
                    miniz_oxide::inflate::decompress_to_vec_zlib(&compressed).unwrap(),
                    data
                );
            }
        }
    }

    #[test]
    fn miniz_streams() {
        let data = b"a zlib stream written by another encoder".repeat(20);
        for level in [1, 6, 10] {
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&data, level);
            assert_eq!(decompress_to_vec_zlib(&compressed).unwrap(), data);
        }
    }

    #[test]
    fn known_checksum() {
        assert_eq!(adler32(b""), 1);
        assert_eq!(adler32(b"Wikipedia"), 0x11e6_0398);
    }

    #[test]
    fn wrong_checksum() {
        let mut compressed = compress_to_vec_zlib(b"checksummed");
        let last = compressed.len() - 1;
        compressed[last] ^= 1;
        assert_eq!(
            decompress_to_vec_zlib(&compressed),
            Err(DecompressionError::WrongChecksum)
        );
    }

    #[test]
    fn bad_headers() {
        let compressed = compress_to_vec_zlib(b"header");
        for header in [[0x79, 0x01], [0x88, 0x01], [0x78, 0x02], [0x78, 0x20]] {
            let mut input = compressed.clone();
            input[..2].copy_from_slice(&header);
            assert_eq!(
                decompress_to_vec_zlib(&input),
                Err(DecompressionError::BadZlibHeader),
                "{:x?}",
                header
            );
        }
    }

    #[test]
    fn truncated() {
        let compressed = compress_to_vec_zlib(b"truncated");
        for end in 0..compressed.len() {
            assert_eq!(
                decompress_to_vec_zlib(&compressed[..end]),
                Err(DecompressionError::InsufficientInput)
            );
        }
    }
}
