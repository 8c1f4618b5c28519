use crate::tables::FIXED_LITLEN_LENGTHS;

/// Flat canonical Huffman decoding table.
///
/// Each of the `2^max_code_length` entries holds `(length << 16) | symbol` for the code whose
/// bit-reversed value is congruent to the entry index modulo `2^length`. Entries left at zero
/// belong to no code.
#[derive(Debug, Clone)]
pub(crate) struct HuffmanTable {
    table: Vec<u32>,
    max_code_length: u8,
    min_code_length: u8,
}

impl HuffmanTable {
    /// Build a decoding table from a list of code lengths indexed by symbol.
    ///
    /// Returns `None` if the lengths over-subscribe the code space, or leave part of it unused.
    /// Two incomplete codes are still accepted because encoders emit them: a single code of
    /// length one, and a code with no symbols at all.
    pub fn new(lengths: &[u8]) -> Option<Self> {
        // Count the number of symbols with each code length.
        let mut histogram = [0u32; 16];
        for &length in lengths {
            histogram[length as usize] += 1;
        }
        histogram[0] = 0;

        let max_code_length = (1..16).rev().find(|&l| histogram[l] > 0).unwrap_or(0) as u8;
        let min_code_length = (1..16).find(|&l| histogram[l] > 0).unwrap_or(0) as u8;

        // Check that the provided lengths form a valid Huffman tree.
        let mut codespace_left = 1i64;
        for &count in &histogram[1..] {
            codespace_left = (codespace_left << 1) - i64::from(count);
            if codespace_left < 0 {
                return None;
            }
        }
        let used: u32 = histogram.iter().sum();
        if codespace_left > 0 && used > 0 && !(used == 1 && histogram[1] == 1) {
            return None;
        }

        let size = 1usize << max_code_length;
        let mut table = vec![0u32; size];

        let mut code = 0u32;
        for bit_length in 1..=max_code_length {
            for (symbol, _) in lengths
                .iter()
                .enumerate()
                .filter(|&(_, &length)| length == bit_length)
            {
                let reversed = code.reverse_bits() >> (32 - u32::from(bit_length));
                let value = (u32::from(bit_length) << 16) | symbol as u32;

                let mut j = reversed as usize;
                while j < size {
                    table[j] = value;
                    j += 1 << bit_length;
                }
                code += 1;
            }
            code <<= 1;
        }

        Some(Self {
            table,
            max_code_length,
            min_code_length,
        })
    }

    /// Table for the fixed literal/length code.
    pub fn fixed_litlen() -> Self {
        Self::new(&FIXED_LITLEN_LENGTHS).expect("fixed code is complete")
    }

    /// Table for the fixed distance code.
    ///
    /// Symbols 30 and 31 take part in the code so that it is complete, but never occur in valid
    /// data.
    pub fn fixed_dist() -> Self {
        Self::new(&[5; 32]).expect("fixed code is complete")
    }

    /// Look up the `(length << 16) | symbol` entry for the low `max_code_length` bits of `bits`.
    #[inline(always)]
    pub fn lookup(&self, bits: u32) -> u32 {
        self.table[(bits as usize) & (self.table.len() - 1)]
    }

    pub fn max_code_length(&self) -> u8 {
        self.max_code_length
    }

    /// Shortest code length in use, or zero for a table without symbols.
    pub fn min_code_length(&self) -> u8 {
        self.min_code_length
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[u32] {
        &self.table
    }
}
