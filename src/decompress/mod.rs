//! Raw deflate decoders.
//!
//! [`Decompressor`] decodes a complete stream in one call. [`StreamDecompressor`] accepts the
//! stream in pieces and produces output as soon as it can be decoded.
//!
//! Both share the block-level parsing below. Every parsing function reports running out of input
//! as [`DecompressionError::InsufficientInput`], which the one-shot decoder passes on and the
//! streaming decoder turns into a request for more input.

mod bitreader;
mod buffer;
mod inflate;
mod stream;

pub use buffer::BufferType;
pub use inflate::{decompress_to_vec, Decompressor, InflateOptions};
pub use stream::StreamDecompressor;

use bitreader::BitReader;

use crate::{
    huffman::HuffmanTable,
    tables::{
        CLCL_ORDER, DIST_SYM_TO_DIST_BASE, DIST_SYM_TO_DIST_EXTRA, LEN_SYM_TO_LEN_BASE,
        LEN_SYM_TO_LEN_EXTRA,
    },
};

/// An error encountered while decompressing a deflate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecompressionError {
    /// The input ended before the end of the final block.
    #[error("unexpected end of input")]
    InsufficientInput,
    /// A block header uses the reserved block type 3.
    #[error("invalid block type")]
    InvalidBlockType,
    /// The length of a stored block doesn't match its ones' complement.
    #[error("stored block length does not match its complement")]
    InvalidUncompressedBlockLength,
    /// A dynamic block declares more than 286 literal/length codes.
    #[error("too many literal/length codes")]
    InvalidHlit,
    /// A dynamic block declares more than 30 distance codes.
    #[error("too many distance codes")]
    InvalidHdist,
    /// A code length repeat has no previous length, or runs past the end of the table.
    #[error("invalid code length repeat")]
    InvalidCodeLengthRepeat,
    /// The code length code is over-subscribed or incomplete.
    #[error("invalid code length code")]
    BadCodeLengthHuffmanTree,
    /// The literal/length code is over-subscribed, incomplete, or lacks an end-of-block code.
    #[error("invalid literal/length code")]
    BadLiteralLengthHuffmanTree,
    /// The distance code is over-subscribed or incomplete.
    #[error("invalid distance code")]
    BadDistanceHuffmanTree,
    /// The input contains a literal/length symbol that is unused or reserved.
    #[error("invalid literal/length symbol")]
    InvalidLiteralLengthCode,
    /// The input contains a distance symbol that is unused or reserved.
    #[error("invalid distance symbol")]
    InvalidDistanceCode,
    /// A back-reference points before the start of the output.
    #[error("distance too far back")]
    DistanceTooFarBack,
    /// The zlib header is malformed or requests a preset dictionary.
    #[error("invalid zlib header")]
    BadZlibHeader,
    /// The Adler-32 checksum after a zlib stream doesn't match the decompressed data.
    #[error("wrong checksum")]
    WrongChecksum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockType {
    Stored,
    Fixed,
    Dynamic,
}

/// Read the 3-bit block header, returning the BFINAL flag and the block type.
pub(crate) fn read_block_header(
    reader: &mut BitReader,
    input: &[u8],
) -> Result<(bool, BlockType), DecompressionError> {
    let header = reader.read_bits(input, 3)?;
    let bfinal = header & 1 != 0;
    let block_type = match header >> 1 {
        0 => BlockType::Stored,
        1 => BlockType::Fixed,
        2 => BlockType::Dynamic,
        _ => return Err(DecompressionError::InvalidBlockType),
    };
    log::debug!("block header: {:?}, final: {}", block_type, bfinal);
    Ok((bfinal, block_type))
}

/// Skip to the byte boundary and read the LEN/NLEN pair of a stored block.
///
/// On success the reader holds no buffered bits, so the block contents can be taken from the
/// input directly.
pub(crate) fn read_stored_header(
    reader: &mut BitReader,
    input: &[u8],
) -> Result<usize, DecompressionError> {
    reader.align_to_byte();
    let len = reader.read_bits(input, 16)?;
    let nlen = reader.read_bits(input, 16)?;
    if len != !nlen & 0xffff {
        return Err(DecompressionError::InvalidUncompressedBlockLength);
    }
    reader.rewind_whole_bytes();
    Ok(len as usize)
}

/// Expand one code length symbol into `(length, repeat count)`.
///
/// `previous` is the last length written so far, needed by symbol 16.
fn code_length_run(
    symbol: u16,
    extra: u32,
    previous: Option<u8>,
) -> Result<(u8, usize), DecompressionError> {
    Ok(match symbol {
        0..=15 => (symbol as u8, 1),
        16 => (
            previous.ok_or(DecompressionError::InvalidCodeLengthRepeat)?,
            3 + extra as usize,
        ),
        17 => (0, 3 + extra as usize),
        _ => (0, 11 + extra as usize),
    })
}

/// Read the code tables at the start of a dynamic block.
pub(crate) fn read_dynamic_tables(
    reader: &mut BitReader,
    input: &[u8],
) -> Result<(HuffmanTable, HuffmanTable), DecompressionError> {
    let hlit = reader.read_bits(input, 5)? as usize + 257;
    let hdist = reader.read_bits(input, 5)? as usize + 1;
    let hclen = reader.read_bits(input, 4)? as usize + 4;
    if hlit > 286 {
        return Err(DecompressionError::InvalidHlit);
    }
    if hdist > 30 {
        return Err(DecompressionError::InvalidHdist);
    }

    let mut code_length_lengths = [0u8; 19];
    for &symbol in &CLCL_ORDER[..hclen] {
        code_length_lengths[symbol] = reader.read_bits(input, 3)? as u8;
    }
    let code_length_table = HuffmanTable::new(&code_length_lengths)
        .ok_or(DecompressionError::BadCodeLengthHuffmanTree)?;

    let total = hlit + hdist;
    let mut lengths = [0u8; 286 + 30];
    let mut previous = None;
    let mut i = 0;
    while i < total {
        let symbol = reader.read_code(
            input,
            &code_length_table,
            DecompressionError::BadCodeLengthHuffmanTree,
        )?;
        let extra = match symbol {
            16 => reader.read_bits(input, 2)?,
            17 => reader.read_bits(input, 3)?,
            18 => reader.read_bits(input, 7)?,
            _ => 0,
        };

        let (length, count) = code_length_run(symbol, extra, previous)?;
        if i + count > total {
            return Err(DecompressionError::InvalidCodeLengthRepeat);
        }
        lengths[i..i + count].fill(length);
        i += count;
        previous = Some(length);
    }

    if lengths[256] == 0 {
        return Err(DecompressionError::BadLiteralLengthHuffmanTree);
    }
    let litlen_table = HuffmanTable::new(&lengths[..hlit])
        .ok_or(DecompressionError::BadLiteralLengthHuffmanTree)?;
    let dist_table = HuffmanTable::new(&lengths[hlit..total])
        .ok_or(DecompressionError::BadDistanceHuffmanTree)?;

    Ok((litlen_table, dist_table))
}

/// Read the rest of a back-reference after its length symbol, returning `(length, distance)`.
#[inline(always)]
pub(crate) fn read_length_distance(
    reader: &mut BitReader,
    input: &[u8],
    length_symbol: u16,
    dist_table: &HuffmanTable,
) -> Result<(usize, usize), DecompressionError> {
    if length_symbol > 285 {
        return Err(DecompressionError::InvalidLiteralLengthCode);
    }
    let index = length_symbol as usize - 257;
    let length = LEN_SYM_TO_LEN_BASE[index] as usize
        + reader.read_bits(input, LEN_SYM_TO_LEN_EXTRA[index])? as usize;

    let dist_symbol =
        reader.read_code(input, dist_table, DecompressionError::InvalidDistanceCode)? as usize;
    if dist_symbol >= 30 {
        return Err(DecompressionError::InvalidDistanceCode);
    }
    let distance = DIST_SYM_TO_DIST_BASE[dist_symbol] as usize
        + reader.read_bits(input, DIST_SYM_TO_DIST_EXTRA[dist_symbol])? as usize;

    Ok((length, distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_headers() {
        let mut reader = BitReader::new(0);
        assert_eq!(
            read_block_header(&mut reader, &[0b101]),
            Ok((true, BlockType::Dynamic))
        );
        assert_eq!(
            read_block_header(&mut reader, &[0b101]),
            Ok((false, BlockType::Stored))
        );

        let mut reader = BitReader::new(0);
        assert_eq!(
            read_block_header(&mut reader, &[0b111]),
            Err(DecompressionError::InvalidBlockType)
        );
    }

    #[test]
    fn stored_headers() {
        let mut reader = BitReader::new(0);
        let input = [0x01, 0x05, 0x00, 0xfa, 0xff, b'h'];
        read_block_header(&mut reader, &input).unwrap();
        assert_eq!(read_stored_header(&mut reader, &input), Ok(5));
        assert_eq!(reader.ip, 5);

        let mut reader = BitReader::new(0);
        let input = [0x01, 0x05, 0x00, 0xfa, 0xfe];
        read_block_header(&mut reader, &input).unwrap();
        assert_eq!(
            read_stored_header(&mut reader, &input),
            Err(DecompressionError::InvalidUncompressedBlockLength)
        );

        let mut reader = BitReader::new(0);
        let input = [0x01, 0x05, 0x00, 0xfa];
        read_block_header(&mut reader, &input).unwrap();
        assert_eq!(
            read_stored_header(&mut reader, &input),
            Err(DecompressionError::InsufficientInput)
        );
    }

    #[test]
    fn code_length_runs() {
        assert_eq!(code_length_run(7, 0, None), Ok((7, 1)));
        assert_eq!(code_length_run(16, 3, Some(7)), Ok((7, 6)));
        assert_eq!(code_length_run(17, 7, Some(7)), Ok((0, 10)));
        assert_eq!(code_length_run(18, 127, None), Ok((0, 138)));
        assert_eq!(
            code_length_run(16, 0, None),
            Err(DecompressionError::InvalidCodeLengthRepeat)
        );
    }

    #[test]
    fn dynamic_header_limits() {
        // HLIT = 30 + 257.
        let mut reader = BitReader::new(0);
        assert_eq!(
            read_dynamic_tables(&mut reader, &[0b0001_1110, 0, 0, 0]).err(),
            Some(DecompressionError::InvalidHlit)
        );

        // HDIST = 31 + 1.
        let mut reader = BitReader::new(0);
        assert_eq!(
            read_dynamic_tables(&mut reader, &[0b1110_0000, 0b0000_0011, 0, 0]).err(),
            Some(DecompressionError::InvalidHdist)
        );

        // All code length code lengths zero.
        let mut reader = BitReader::new(0);
        assert_eq!(
            read_dynamic_tables(&mut reader, &[0; 16]).err(),
            Some(DecompressionError::BadCodeLengthHuffmanTree)
        );
    }
}
