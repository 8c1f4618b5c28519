//! This fuzz target tests that feeding the streaming decompressor one byte at a time produces the
//! same output as decompressing in one call.

#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate miniz_oxide;

fuzz_target!(|input: (u8, Vec<u8>)| {
    let compression_level = input.0;
    let data = input.1;
    let compressed = miniz_oxide::deflate::compress_to_vec(&data, compression_level);

    let mut decompressed = Vec::new();
    let mut decoder = rawflate::StreamDecompressor::default();
    for byte in &compressed {
        decompressed.extend(
            decoder
                .decompress(Some(std::slice::from_ref(byte)))
                .expect("Decompression failed!"),
        );
    }

    assert!(decoder.is_done());
    assert_eq!(data, decompressed);
    assert_eq!(decoder.get_bytes(), &decompressed[..]);
});
