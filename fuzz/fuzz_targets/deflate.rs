#![no_main]
use libfuzzer_sys::fuzz_target;
use rawflate::{CompressionType, DeflateOptions};
use std::io::{Cursor, Read};

fuzz_target!(|input: (bool, u16, Vec<u8>)| {
    let (fixed, lazy_threshold, data) = input;
    let options = DeflateOptions {
        compression_type: if fixed {
            CompressionType::Fixed
        } else {
            CompressionType::Dynamic
        },
        lazy_threshold: lazy_threshold % 259,
    };
    let compressed = rawflate::compress_to_vec_zlib_with(&data, options);

    let mut decompressed = Vec::new();
    flate2::bufread::ZlibDecoder::new(Cursor::new(&compressed))
        .read_to_end(&mut decompressed)
        .unwrap();
    assert_eq!(decompressed, data);
    assert_eq!(rawflate::decompress_to_vec_zlib(&compressed).unwrap(), data);
});
