#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate miniz_oxide;

use rawflate::{BufferType, Decompressor, InflateOptions};

fuzz_target!(|input: (u8, bool, Vec<u8>)| {
    let (compression_level, block, data) = input;
    let compressed = miniz_oxide::deflate::compress_to_vec(&data, compression_level);

    let options = InflateOptions {
        buffer_type: if block {
            BufferType::Block
        } else {
            BufferType::Adaptive
        },
        ..Default::default()
    };
    let decompressed = Decompressor::new(&compressed, options)
        .decompress()
        .expect("Decompression failed!");
    assert_eq!(data, decompressed);
});
