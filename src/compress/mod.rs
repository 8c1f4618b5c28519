mod bitstream;
mod bitwriter;
mod heap;
mod matchfinder;
mod parse;

use bitwriter::BitWriter;
use parse::LazyParser;

const STORED_BLOCK_MAX_SIZE: usize = u16::MAX as usize;
pub(crate) const WINDOW_SIZE: usize = 32768;
pub(crate) const MIN_MATCH: usize = 3;
pub(crate) const MAX_MATCH: usize = 258;

/// Block type used to encode the input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// Stored blocks, no compression.
    None,
    /// A single block coded with the Huffman tables defined by RFC 1951.
    Fixed,
    /// A single block coded with Huffman tables built for the input.
    #[default]
    Dynamic,
}

/// Settings for a [`Compressor`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeflateOptions {
    pub compression_type: CompressionType,
    /// Matches shorter than this are deferred by one byte to see if a longer match follows.
    /// Zero disables lazy matching.
    pub lazy_threshold: u16,
}

/// Compressor that produces a raw deflate stream for an in-memory input.
///
/// ```
/// use rawflate::{CompressionType, Compressor, DeflateOptions};
///
/// let options = DeflateOptions {
///     compression_type: CompressionType::Fixed,
///     ..Default::default()
/// };
/// let compressed = Compressor::new(b"hello hello hello", options).compress();
/// assert!(!compressed.is_empty());
/// ```
pub struct Compressor<'a> {
    input: &'a [u8],
    options: DeflateOptions,
    output: Vec<u8>,
    output_index: usize,
}

impl<'a> Compressor<'a> {
    pub fn new(input: &'a [u8], options: DeflateOptions) -> Self {
        Self {
            input,
            options,
            output: Vec::new(),
            output_index: 0,
        }
    }

    /// Write the stream into `output` starting at `output_index`.
    ///
    /// The first `output_index` bytes of `output` are returned unchanged at the start of the
    /// result, which lets callers reserve room for a container header.
    pub fn with_output(mut self, output: Vec<u8>, output_index: usize) -> Self {
        self.output = output;
        self.output_index = output_index;
        self
    }

    /// Compress the whole input and return the output buffer.
    pub fn compress(self) -> Vec<u8> {
        log::debug!(
            "compressing {} bytes with {:?}",
            self.input.len(),
            self.options.compression_type
        );

        match self.options.compression_type {
            CompressionType::None => self.compress_stored(),
            CompressionType::Fixed => {
                let block = LazyParser::new(self.options.lazy_threshold).parse(self.input);
                let mut writer = BitWriter::new(self.output, self.output_index);
                bitstream::write_fixed_block(&mut writer, &block.symbols);
                writer.finish()
            }
            CompressionType::Dynamic => {
                let block = LazyParser::new(self.options.lazy_threshold).parse(self.input);
                let mut writer = BitWriter::new(self.output, self.output_index);
                bitstream::write_dynamic_block(
                    &mut writer,
                    &block.symbols,
                    &block.frequencies,
                    &block.dist_frequencies,
                );
                writer.finish()
            }
        }
    }

    /// Emit the input as stored blocks of at most 65535 bytes each.
    fn compress_stored(self) -> Vec<u8> {
        let mut output = self.output;
        output.resize(self.output_index, 0);
        output.reserve(self.input.len() + 5 * (self.input.len() / STORED_BLOCK_MAX_SIZE + 1));

        let mut chunks = self.input.chunks(STORED_BLOCK_MAX_SIZE).peekable();
        if chunks.peek().is_none() {
            // Empty input still needs a final block.
            output.extend_from_slice(&[1, 0, 0, 0xff, 0xff]);
            return output;
        }

        while let Some(chunk) = chunks.next() {
            let bfinal = chunks.peek().is_none();
            // BFINAL and BTYPE=00, then padding to the byte boundary.
            output.push(bfinal as u8);
            output.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
            output.extend_from_slice(&(!(chunk.len() as u16)).to_le_bytes());
            output.extend_from_slice(chunk);
        }
        output
    }
}

/// Compresses the given data into a raw deflate stream with the default options.
pub fn compress_to_vec(input: &[u8]) -> Vec<u8> {
    Compressor::new(input, DeflateOptions::default()).compress()
}

/// Compresses the given data into a raw deflate stream with the given options.
pub fn compress_to_vec_with(input: &[u8], options: DeflateOptions) -> Vec<u8> {
    Compressor::new(input, options).compress()
}
