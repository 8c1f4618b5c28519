//! This fuzz target tests that decompressing a byte slice always produces the same output as
//! decompressing in two steps.

#![no_main]
#[macro_use]
extern crate libfuzzer_sys;

use rawflate::DecompressionError;

fuzz_target!(|input: (Vec<u8>, Vec<u8>)| {
    let joined = input.0.iter().chain(&input.1).copied().collect::<Vec<u8>>();
    let full_output = rawflate::decompress_to_vec(&joined);

    let split_output: Result<_, DecompressionError> = (|| {
        let mut decoder = rawflate::StreamDecompressor::default();
        let mut output = decoder.decompress(Some(&input.0))?;
        output.extend(decoder.decompress(Some(&input.1))?);
        if !decoder.is_done() {
            return Err(DecompressionError::InsufficientInput);
        }
        Ok(output)
    })();

    assert_eq!(full_output, split_output);
});
