//! Raw deflate (RFC 1951) compression and decompression.
//!
//! The encoder writes a whole in-memory input as stored blocks or as a single block coded with
//! either the fixed Huffman codes or codes built for the input. Matches are found with hash
//! chains over a 32 KiB window, optionally with lazy matching.
//!
//! Two decoders are provided:
//!
//! - [`Decompressor`] decodes a complete stream that is already in memory.
//! - [`StreamDecompressor`] accepts the stream in arbitrary pieces and returns output as soon as
//!   it can be decoded.
//!
//! Both decoders accept any valid deflate stream, including ones with many blocks of mixed types.
//! Small helpers for the zlib container are included as well.
//!
//! ```
//! use rawflate::{compress_to_vec, decompress_to_vec};
//!
//! let data = b"Hello, Hello, Hello, world!";
//! let compressed = compress_to_vec(data);
//! assert_eq!(decompress_to_vec(&compressed).unwrap(), data);
//! ```
#![forbid(unsafe_code)]

mod compress;
mod decompress;
mod huffman;
mod tables;
mod zlib;

pub use compress::{
    compress_to_vec, compress_to_vec_with, CompressionType, Compressor, DeflateOptions,
};
pub use decompress::{
    decompress_to_vec, BufferType, DecompressionError, Decompressor, InflateOptions,
    StreamDecompressor,
};
pub use zlib::{compress_to_vec_zlib, compress_to_vec_zlib_with, decompress_to_vec_zlib};
