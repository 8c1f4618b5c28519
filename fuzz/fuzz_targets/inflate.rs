#![no_main]
use libfuzzer_sys::fuzz_target;
use miniz_oxide::inflate::TINFLStatus;
use rawflate::DecompressionError;

fuzz_target!(|input: &[u8]| {
    match rawflate::decompress_to_vec(input) {
        Ok(decompressed) => {
            let reference = match miniz_oxide::inflate::decompress_to_vec(input) {
                Ok(reference) => reference,
                Err(r) => panic!("rawflate succeeded, miniz_oxide: {:?}", r),
            };
            assert_eq!(decompressed, reference);
        }
        // miniz_oxide accepts some incomplete codes that are rejected here.
        Err(DecompressionError::BadCodeLengthHuffmanTree)
        | Err(DecompressionError::BadLiteralLengthHuffmanTree)
        | Err(DecompressionError::BadDistanceHuffmanTree)
        | Err(DecompressionError::InvalidLiteralLengthCode)
        | Err(DecompressionError::InvalidDistanceCode) => {}
        Err(err) => match miniz_oxide::inflate::decompress_to_vec(input) {
            Err(r)
                if r.status == TINFLStatus::Failed
                    || r.status == TINFLStatus::FailedCannotMakeProgress => {}
            r => panic!("rawflate: {:?}, miniz_oxide: {:?}", err, r),
        },
    }
});
