//! Constant tables from RFC 1951.

/// Transmission order of the code length code lengths in a dynamic block header.
pub(crate) const CLCL_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Base length for each length symbol (257..=285).
pub(crate) const LEN_SYM_TO_LEN_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Number of extra bits for each length symbol (257..=285).
pub(crate) const LEN_SYM_TO_LEN_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base distance for each distance symbol.
pub(crate) const DIST_SYM_TO_DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Number of extra bits for each distance symbol.
pub(crate) const DIST_SYM_TO_DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Length symbol for each match length, indexed by `length - 3`.
pub(crate) const LENGTH_TO_SYMBOL: [u16; 256] = compute_length_table(true);

/// Number of extra bits for each match length, indexed by `length - 3`.
pub(crate) const LENGTH_TO_LEN_EXTRA: [u16; 256] = compute_length_table(false);

/// Code lengths of the fixed literal/length code (BTYPE=01).
pub(crate) const FIXED_LITLEN_LENGTHS: [u8; 288] = compute_fixed_litlen_lengths();

/// Code lengths of the fixed distance code (BTYPE=01).
pub(crate) const FIXED_DIST_LENGTHS: [u8; 30] = [5; 30];

/// Bit-reversed value of every byte.
pub(crate) const REVERSE_TABLE: [u8; 256] = compute_reverse_table();

// Length 258 is covered by both symbol 284 (with extra bits 31) and symbol 285. The later symbol
// wins, matching what every other encoder emits.
const fn compute_length_table(symbols: bool) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut sym = 0;
    while sym < LEN_SYM_TO_LEN_BASE.len() {
        let base = LEN_SYM_TO_LEN_BASE[sym] as usize - 3;
        let extra = LEN_SYM_TO_LEN_EXTRA[sym];
        let mut j = 0;
        while j < (1 << extra) && base + j < 256 {
            table[base + j] = if symbols {
                257 + sym as u16
            } else {
                extra as u16
            };
            j += 1;
        }
        sym += 1;
    }
    table
}

const fn compute_fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    let mut i = 0;
    while i < 288 {
        lengths[i] = match i {
            0..=143 => 8,
            144..=255 => 9,
            256..=279 => 7,
            _ => 8,
        };
        i += 1;
    }
    lengths
}

const fn compute_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
}
