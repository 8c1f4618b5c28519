#![no_main]
use libfuzzer_sys::fuzz_target;
use rawflate::{CompressionType, DeflateOptions};
use std::io::{Cursor, Read};

fuzz_target!(|data: Vec<u8>| {
    let options = DeflateOptions {
        compression_type: CompressionType::None,
        ..Default::default()
    };
    let compressed = rawflate::compress_to_vec_with(&data, options);

    let mut decompressed = Vec::new();
    flate2::bufread::DeflateDecoder::new(Cursor::new(&compressed))
        .read_to_end(&mut decompressed)
        .unwrap();
    assert_eq!(decompressed, data);

    // Five header bytes per block of up to 65535 bytes, and one block for empty input.
    let blocks = ((data.len() + 65534) / 65535).max(1);
    assert_eq!(compressed.len(), data.len() + 5 * blocks);
});
