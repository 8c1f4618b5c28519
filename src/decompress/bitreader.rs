use crate::{decompress::DecompressionError, huffman::HuffmanTable};

/// LSB-first bit reader over a borrowed input buffer.
///
/// The reader is a small `Copy` value so that callers can snapshot it before an attempt and put
/// it back if the attempt runs out of input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BitReader {
    /// Index of the next input byte to load into the accumulator.
    pub ip: usize,
    bitsbuf: u32,
    bitsbuflen: u8,
}

impl BitReader {
    pub fn new(ip: usize) -> Self {
        Self {
            ip,
            bitsbuf: 0,
            bitsbuflen: 0,
        }
    }

    /// Load whole bytes until at least `nbits` bits are buffered or the input runs out.
    #[inline(always)]
    fn fill(&mut self, input: &[u8], nbits: u8) {
        while self.bitsbuflen < nbits && self.ip < input.len() {
            self.bitsbuf |= u32::from(input[self.ip]) << self.bitsbuflen;
            self.ip += 1;
            self.bitsbuflen += 8;
        }
    }

    /// Read `nbits` bits, with the first bit in the stream ending up as bit 0 of the result.
    ///
    /// Nothing is consumed if fewer than `nbits` bits are available.
    #[inline(always)]
    pub fn read_bits(&mut self, input: &[u8], nbits: u8) -> Result<u32, DecompressionError> {
        debug_assert!(nbits <= 24);
        self.fill(input, nbits);
        if self.bitsbuflen < nbits {
            return Err(DecompressionError::InsufficientInput);
        }

        let value = self.bitsbuf & ((1u32 << nbits) - 1);
        self.bitsbuf >>= nbits;
        self.bitsbuflen -= nbits;
        Ok(value)
    }

    /// Decode one symbol with `table`.
    ///
    /// Up to `max_code_length` bits are peeked, but only the length of the matched code is
    /// consumed. Close to the end of the input fewer bits may be available, which is fine as long
    /// as the code that matched is short enough to be fully present. Bits that match no code
    /// produce `invalid`.
    #[inline(always)]
    pub fn read_code(
        &mut self,
        input: &[u8],
        table: &HuffmanTable,
        invalid: DecompressionError,
    ) -> Result<u16, DecompressionError> {
        let max_code_length = table.max_code_length();
        if max_code_length == 0 {
            return Err(invalid);
        }
        self.fill(input, max_code_length);

        let entry = table.lookup(self.bitsbuf);
        let length = (entry >> 16) as u8;
        if length == 0 || length > self.bitsbuflen {
            return Err(if self.bitsbuflen >= max_code_length {
                invalid
            } else {
                DecompressionError::InsufficientInput
            });
        }

        self.bitsbuf >>= length;
        self.bitsbuflen -= length;
        Ok(entry as u16)
    }

    /// Discard the bits remaining in the current partial byte.
    pub fn align_to_byte(&mut self) {
        let drop = self.bitsbuflen % 8;
        self.bitsbuf >>= drop;
        self.bitsbuflen -= drop;
    }

    /// Give back whole bytes that were loaded into the accumulator but not consumed.
    ///
    /// Afterwards `ip` is the index of the first byte that no bit has been read from.
    pub fn rewind_whole_bytes(&mut self) {
        let whole = self.bitsbuflen / 8;
        self.ip -= whole as usize;
        self.bitsbuflen -= whole * 8;
        self.bitsbuf &= (1u32 << self.bitsbuflen) - 1;
    }

    /// Take up to `len` raw bytes from the input. The reader must be byte aligned.
    pub fn take_bytes<'a>(&mut self, input: &'a [u8], len: usize) -> &'a [u8] {
        debug_assert_eq!(self.bitsbuflen, 0);
        let start = self.ip.min(input.len());
        let end = start + len.min(input.len() - start);
        self.ip = end;
        &input[start..end]
    }

    /// Number of unconsumed bits held in the accumulator.
    #[cfg(test)]
    pub fn buffered_bits(&self) -> u8 {
        self.bitsbuflen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lsb_first() {
        let input = [0b1011_0101, 0b1111_0000, 0xab];
        let mut reader = BitReader::new(0);
        assert_eq!(reader.read_bits(&input, 1), Ok(1));
        assert_eq!(reader.read_bits(&input, 2), Ok(0b10));
        assert_eq!(reader.read_bits(&input, 9), Ok(0b0_0001_0110));
        assert_eq!(reader.read_bits(&input, 4), Ok(0b1111));
        assert_eq!(reader.read_bits(&input, 8), Ok(0xab));
        assert_eq!(
            reader.read_bits(&input, 1),
            Err(DecompressionError::InsufficientInput)
        );
    }

    #[test]
    fn short_read_keeps_bits() {
        let input = [0xff];
        let mut reader = BitReader::new(0);
        assert_eq!(
            reader.read_bits(&input, 9),
            Err(DecompressionError::InsufficientInput)
        );
        assert_eq!(reader.read_bits(&input, 8), Ok(0xff));
    }

    #[test]
    fn rewinds_unused_bytes() {
        let input = [1, 2, 3, 4];
        let mut reader = BitReader::new(0);
        reader.read_bits(&input, 3).unwrap();
        reader.fill(&input, 21);
        assert_eq!(reader.ip, 3);

        reader.rewind_whole_bytes();
        assert_eq!(reader.ip, 1);
        assert_eq!(reader.buffered_bits(), 5);

        reader.align_to_byte();
        assert_eq!(reader.buffered_bits(), 0);
        assert_eq!(reader.take_bytes(&input, 10), &[2, 3, 4]);
        assert_eq!(reader.ip, 4);
    }

    #[test]
    fn codes_near_end_of_input() {
        // Lengths 1, 2, 3, 3: symbol 0 is the single bit 0.
        let table = HuffmanTable::new(&[1, 2, 3, 3]).unwrap();
        let invalid = DecompressionError::InvalidLiteralLengthCode;

        // Eight codes of symbol 0 fit in one byte even though 3 bits are peeked each time.
        let input = [0];
        let mut reader = BitReader::new(0);
        for _ in 0..8 {
            assert_eq!(reader.read_code(&input, &table, invalid), Ok(0));
        }
        assert_eq!(
            reader.read_code(&input, &table, invalid),
            Err(DecompressionError::InsufficientInput)
        );

        // Symbol 3 is 111, which needs all three bits.
        let input = [0b0011_1111];
        let mut reader = BitReader::new(0);
        assert_eq!(reader.read_code(&input, &table, invalid), Ok(3));
        assert_eq!(reader.read_code(&input, &table, invalid), Ok(3));
        assert_eq!(reader.read_code(&input, &table, invalid), Ok(0));
        assert_eq!(reader.read_code(&input, &table, invalid), Ok(0));
        assert_eq!(
            reader.read_code(&input, &table, invalid),
            Err(DecompressionError::InsufficientInput)
        );
    }

    #[test]
    fn unused_code_is_invalid() {
        let table = HuffmanTable::new(&[0, 1]).unwrap();
        let invalid = DecompressionError::InvalidDistanceCode;
        let mut reader = BitReader::new(0);
        assert_eq!(reader.read_code(&[0b10], &table, invalid), Ok(1));
        assert_eq!(reader.read_code(&[0b10], &table, invalid), Err(invalid));

        let empty = HuffmanTable::new(&[0; 30]).unwrap();
        assert_eq!(reader.read_code(&[0], &empty, invalid), Err(invalid));
    }
}
