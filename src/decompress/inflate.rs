use std::mem;

use crate::{
    decompress::{
        bitreader::BitReader,
        buffer::{BufferType, GrowthHint, OutputBuffer},
        read_block_header, read_dynamic_tables, read_length_distance, read_stored_header,
        BlockType, DecompressionError,
    },
    huffman::HuffmanTable,
};

/// Longest run of bytes a single symbol can produce.
const MAX_MATCH: usize = 258;

/// Settings for a [`Decompressor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateOptions {
    /// Index of the first byte of the deflate stream within the input.
    pub index: usize,
    /// Initial size of the output buffer, or the block size for [`BufferType::Block`].
    pub buffer_size: usize,
    pub buffer_type: BufferType,
    /// Release unused capacity of the returned buffer.
    pub resize: bool,
}

impl Default for InflateOptions {
    fn default() -> Self {
        Self {
            index: 0,
            buffer_size: 0x8000,
            buffer_type: BufferType::default(),
            resize: false,
        }
    }
}

/// Decoder for a complete raw deflate stream held in memory.
///
/// ```
/// use rawflate::{compress_to_vec, Decompressor, InflateOptions};
///
/// let mut input = compress_to_vec(b"hello hello hello");
/// input.extend_from_slice(b"trailer");
///
/// let mut decompressor = Decompressor::new(&input, InflateOptions::default());
/// assert_eq!(decompressor.decompress().unwrap(), b"hello hello hello");
/// assert_eq!(&input[decompressor.input_index()..], b"trailer");
/// ```
pub struct Decompressor<'a> {
    input: &'a [u8],
    reader: BitReader,
    output: OutputBuffer,
    resize: bool,
    done: bool,
}

impl<'a> Decompressor<'a> {
    pub fn new(input: &'a [u8], options: InflateOptions) -> Self {
        Self {
            input,
            reader: BitReader::new(options.index),
            output: OutputBuffer::new(options.buffer_type, options.buffer_size),
            resize: options.resize,
            done: false,
        }
    }

    /// Decode blocks until the end of the final block and return the decompressed data.
    ///
    /// Fails with [`DecompressionError::InsufficientInput`] if the input ends first.
    pub fn decompress(&mut self) -> Result<Vec<u8>, DecompressionError> {
        while !self.done {
            let (bfinal, block_type) = read_block_header(&mut self.reader, self.input)?;
            match block_type {
                BlockType::Stored => self.stored_block()?,
                BlockType::Fixed => {
                    let litlen_table = HuffmanTable::fixed_litlen();
                    let dist_table = HuffmanTable::fixed_dist();
                    self.huffman_block(&litlen_table, &dist_table)?;
                }
                BlockType::Dynamic => {
                    let (litlen_table, dist_table) =
                        read_dynamic_tables(&mut self.reader, self.input)?;
                    self.huffman_block(&litlen_table, &dist_table)?;
                }
            }
            self.done = bfinal;
        }

        self.reader.rewind_whole_bytes();
        log::debug!("finished deflate stream at input index {}", self.reader.ip);

        let output = mem::replace(&mut self.output, OutputBuffer::new(BufferType::Adaptive, 0));
        Ok(output.finish(self.resize))
    }

    /// Index of the first input byte after the deflate stream.
    ///
    /// Only meaningful once [`decompress`](Self::decompress) has succeeded.
    pub fn input_index(&self) -> usize {
        self.reader.ip
    }

    fn growth_hint(&self, min_code_length: u8, fix_ratio: Option<usize>) -> GrowthHint {
        GrowthHint {
            input_len: self.input.len(),
            ip: self.reader.ip,
            min_code_length,
            fix_ratio,
        }
    }

    fn stored_block(&mut self) -> Result<(), DecompressionError> {
        let len = read_stored_header(&mut self.reader, self.input)?;
        let bytes = self.reader.take_bytes(self.input, len);
        if bytes.len() < len {
            return Err(DecompressionError::InsufficientInput);
        }
        let hint = self.growth_hint(0, Some(2));
        self.output.extend_from_slice(bytes, hint);
        Ok(())
    }

    fn huffman_block(
        &mut self,
        litlen_table: &HuffmanTable,
        dist_table: &HuffmanTable,
    ) -> Result<(), DecompressionError> {
        let min_code_length = litlen_table.min_code_length();
        loop {
            let hint = self.growth_hint(min_code_length, None);
            self.output.reserve(MAX_MATCH, hint);

            let symbol = self.reader.read_code(
                self.input,
                litlen_table,
                DecompressionError::InvalidLiteralLengthCode,
            )?;
            match symbol {
                0..=255 => self.output.push(symbol as u8),
                256 => return Ok(()),
                _ => {
                    let (length, distance) =
                        read_length_distance(&mut self.reader, self.input, symbol, dist_table)?;
                    self.output.copy_match(length, distance)?;
                }
            }
        }
    }
}

/// Decompress a raw deflate stream with the default options.
pub fn decompress_to_vec(input: &[u8]) -> Result<Vec<u8>, DecompressionError> {
    Decompressor::new(input, InflateOptions::default()).decompress()
}
