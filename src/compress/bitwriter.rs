use crate::tables::REVERSE_TABLE;

/// Size of the output buffer when the caller doesn't provide one.
const DEFAULT_BUFFER_SIZE: usize = 0x8000;

/// Packs bit fields into a byte buffer, least significant bit first.
///
/// Bits are shifted into `current` most significant bit first, and each completed byte is
/// mirrored through `REVERSE_TABLE` on its way into the buffer. The first bit written thus ends
/// up as the low bit of its byte, as deflate requires.
pub(super) struct BitWriter {
    buffer: Vec<u8>,
    index: usize,
    bitindex: u8,
    current: u8,
}

impl BitWriter {
    /// Create a writer that appends to `buffer` starting at byte `index`.
    ///
    /// Bytes before `index` are kept as-is; anything after it will be overwritten.
    pub fn new(mut buffer: Vec<u8>, index: usize) -> Self {
        let mut size = buffer.len().max(DEFAULT_BUFFER_SIZE);
        while size <= index {
            size *= 2;
        }
        buffer.resize(size, 0);

        Self {
            buffer,
            index,
            bitindex: 0,
            current: 0,
        }
    }

    /// Write the low `nbits` bits of `value`.
    ///
    /// Without `reverse`, bit 0 of `value` is written first, which is how deflate stores header
    /// fields and extra bits. With `reverse`, the bits are reversed first so the most significant
    /// bit is written first, which is how Huffman codes are stored.
    pub fn write_bits(&mut self, value: u32, nbits: u8, reverse: bool) {
        debug_assert!(nbits <= 32);
        if nbits == 0 {
            return;
        }

        // `current` is filled MSB-first, so the bit that must come out first goes in first.
        let value = if reverse {
            value & (u32::MAX >> (32 - nbits))
        } else {
            value.reverse_bits() >> (32 - nbits)
        };

        if nbits + self.bitindex < 8 {
            self.current = (self.current << nbits) | value as u8;
            self.bitindex += nbits;
            return;
        }

        for i in (0..nbits).rev() {
            self.current = (self.current << 1) | ((value >> i) & 1) as u8;
            self.bitindex += 1;
            if self.bitindex == 8 {
                self.push_byte();
            }
        }
    }

    fn push_byte(&mut self) {
        if self.index == self.buffer.len() {
            self.expand_buffer();
        }
        self.buffer[self.index] = REVERSE_TABLE[self.current as usize];
        self.index += 1;
        self.bitindex = 0;
        self.current = 0;
    }

    fn expand_buffer(&mut self) {
        let size = self.buffer.len() * 2;
        log::trace!("growing deflate output buffer {} -> {}", self.buffer.len(), size);
        self.buffer.resize(size, 0);
    }

    /// Pad the final partial byte with zeros and return everything written so far.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bitindex > 0 {
            self.current <<= 8 - self.bitindex;
            self.push_byte();
        }
        self.buffer.truncate(self.index);
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_first_packing() {
        let mut writer = BitWriter::new(Vec::new(), 0);
        writer.write_bits(0b1, 1, false);
        writer.write_bits(0b10, 2, false);
        writer.write_bits(0x3ff, 10, false);
        writer.write_bits(0, 3, false);
        assert_eq!(writer.finish(), vec![0b1111_1101, 0b0001_1111]);
    }

    #[test]
    fn reversed_codes() {
        // A 7-bit Huffman code 0b0000001 goes out MSB first.
        let mut writer = BitWriter::new(Vec::new(), 0);
        writer.write_bits(0b0000001, 7, true);
        writer.write_bits(0b1, 1, false);
        assert_eq!(writer.finish(), vec![0b1100_0000]);

        let mut writer = BitWriter::new(Vec::new(), 0);
        writer.write_bits(0b110, 3, true);
        assert_eq!(writer.finish(), vec![0b0000_0011]);
    }

    #[test]
    fn keeps_prefix_and_grows() {
        let mut writer = BitWriter::new(vec![0x78, 0x01], 2);
        for i in 0..100_000u32 {
            writer.write_bits(i & 0xff, 8, false);
        }
        let output = writer.finish();
        assert_eq!(output.len(), 100_002);
        assert_eq!(&output[..2], &[0x78, 0x01]);
        assert!(output[2..].iter().enumerate().all(|(i, &b)| b == i as u8));
    }
}
