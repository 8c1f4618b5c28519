//! Methods for encoding the deflate bitstream.

use crate::{
    compress::{bitwriter::BitWriter, heap::Heap},
    tables::{
        CLCL_ORDER, DIST_SYM_TO_DIST_BASE, DIST_SYM_TO_DIST_EXTRA, FIXED_DIST_LENGTHS,
        FIXED_LITLEN_LENGTHS, LENGTH_TO_LEN_EXTRA, LENGTH_TO_SYMBOL, LEN_SYM_TO_LEN_BASE,
    },
};

/// Maximum code length of the literal/length code.
const LITLEN_LENGTH_LIMIT: u8 = 15;
/// Maximum code length used for the distance code.
const DIST_LENGTH_LIMIT: u8 = 7;
/// Maximum code length of the code length code, fixed by the 3-bit header fields.
const CODE_LENGTH_LENGTH_LIMIT: u8 = 7;

pub(crate) fn distance_to_dist_sym(distance: u16) -> u8 {
    const LOOKUP: [u8; 16] = [0, 1, 2, 3, 4, 4, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7];
    if distance <= 16 {
        return LOOKUP[distance as usize - 1];
    }

    let mut dist_sym = 29;
    while dist_sym > 0 && distance < DIST_SYM_TO_DIST_BASE[dist_sym as usize] {
        dist_sym -= 1;
    }
    dist_sym
}

/// One entry of the LZ77 token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Symbol {
    Literal(u8),
    EndOfBlock,
    /// A match, already split into the symbols and extra bits that encode it.
    Backref {
        length_sym: u16,
        length_extra: u16,
        length_extra_bits: u8,
        dist_sym: u8,
        dist_extra: u16,
        dist_extra_bits: u8,
    },
}

impl Symbol {
    pub fn backref(length: u16, distance: u16) -> Self {
        debug_assert!((3..=258).contains(&length));
        debug_assert!((1..=32768).contains(&distance));

        let length_sym = LENGTH_TO_SYMBOL[length as usize - 3];
        let dist_sym = distance_to_dist_sym(distance);
        Symbol::Backref {
            length_sym,
            length_extra: length - LEN_SYM_TO_LEN_BASE[length_sym as usize - 257],
            length_extra_bits: LENGTH_TO_LEN_EXTRA[length as usize - 3] as u8,
            dist_sym,
            dist_extra: distance - DIST_SYM_TO_DIST_BASE[dist_sym as usize],
            dist_extra_bits: DIST_SYM_TO_DIST_EXTRA[dist_sym as usize],
        }
    }

    #[cfg(test)]
    pub fn decode_backref(&self) -> Option<(u16, u16)> {
        match *self {
            Symbol::Backref {
                length_sym,
                length_extra,
                dist_sym,
                dist_extra,
                ..
            } => Some((
                LEN_SYM_TO_LEN_BASE[length_sym as usize - 257] + length_extra,
                DIST_SYM_TO_DIST_BASE[dist_sym as usize] + dist_extra,
            )),
            _ => None,
        }
    }
}

/// Compute optimal code lengths no longer than `limit` for the given symbol frequencies.
///
/// Symbols with zero frequency get length zero. A lone used symbol gets length one so that the
/// code can still be transmitted. Otherwise the result is a complete prefix code.
pub(crate) fn compute_code_lengths(frequencies: &[u32], limit: u8) -> Vec<u8> {
    let mut lengths = vec![0; frequencies.len()];

    let mut heap = Heap::with_capacity(frequencies.len());
    for (i, &frequency) in frequencies.iter().enumerate() {
        if frequency > 0 {
            heap.push(i as u16, frequency);
        }
    }

    if heap.len() <= 1 {
        if let Some((symbol, _)) = heap.pop() {
            lengths[symbol as usize] = 1;
        }
        return lengths;
    }
    assert!(heap.len() <= 1 << limit);

    // Heaviest symbols first.
    let mut symbols = Vec::with_capacity(heap.len());
    let mut weights = Vec::with_capacity(heap.len());
    while let Some((symbol, frequency)) = heap.pop() {
        symbols.push(symbol);
        weights.push(u64::from(frequency));
    }

    for (symbol, length) in symbols.into_iter().zip(package_merge(&weights, limit)) {
        lengths[symbol as usize] = length;
    }
    lengths
}

/// Reverse package-merge over `weights` sorted heaviest first.
///
/// Every symbol starts at length `limit`. Levels are then filled from the bottom up, and each
/// level that must give up one unit of code space removes the cheapest item on it, which either
/// shortens a leaf by one or, for a package, recursively shortens the two items it was made from.
fn package_merge(weights: &[u64], limit: u8) -> Vec<u8> {
    let n = weights.len();
    let limit = limit as usize;

    let mut code_lengths = vec![limit as u8; n];
    let mut minimum_cost = vec![0usize; limit];
    let mut flag = vec![false; limit];

    let mut excess = (1usize << limit) - n;
    let half = 1usize << (limit - 1);
    minimum_cost[limit - 1] = n;
    for j in 0..limit {
        if excess >= half {
            flag[j] = true;
            excess -= half;
        }
        excess <<= 1;
        if j + 2 <= limit {
            minimum_cost[limit - 2 - j] = minimum_cost[limit - 1 - j] / 2 + n;
        }
    }
    minimum_cost[0] = flag[0] as usize;
    for j in 1..limit {
        minimum_cost[j] = minimum_cost[j].min(2 * minimum_cost[j - 1] + flag[j] as usize);
    }

    // `kind` holds the symbol an item was made from, or `n` for a package.
    let mut value: Vec<Vec<u64>> = minimum_cost.iter().map(|&c| vec![0; c]).collect();
    let mut kind: Vec<Vec<usize>> = minimum_cost.iter().map(|&c| vec![0; c]).collect();
    for t in 0..minimum_cost[limit - 1] {
        value[limit - 1][t] = weights[t];
        kind[limit - 1][t] = t;
    }

    let mut position = vec![0usize; limit];
    if flag[limit - 1] {
        code_lengths[0] -= 1;
        position[limit - 1] += 1;
    }

    for j in (0..limit - 1).rev() {
        let mut i = 0;
        let mut next = position[j + 1];
        for t in 0..minimum_cost[j] {
            let package = if next + 1 < value[j + 1].len() {
                Some(value[j + 1][next] + value[j + 1][next + 1])
            } else {
                None
            };
            match package {
                Some(weight) if i >= n || weight > weights[i] => {
                    value[j][t] = weight;
                    kind[j][t] = n;
                    next += 2;
                }
                _ => {
                    value[j][t] = weights[i];
                    kind[j][t] = i;
                    i += 1;
                }
            }
        }

        position[j] = 0;
        if flag[j] {
            take_package(&kind, &mut position, &mut code_lengths, j);
        }
    }

    code_lengths
}

fn take_package(kind: &[Vec<usize>], position: &mut [usize], code_lengths: &mut [u8], j: usize) {
    let item = kind[j][position[j]];
    if item == code_lengths.len() {
        take_package(kind, position, code_lengths, j + 1);
        take_package(kind, position, code_lengths, j + 1);
    } else {
        code_lengths[item] -= 1;
    }
    position[j] += 1;
}

/// Assign canonical codes to the given lengths. Codes are returned MSB-first.
pub(crate) fn compute_codes(lengths: &[u8]) -> Vec<u16> {
    let mut count = [0u32; 16];
    for &length in lengths {
        count[length as usize] += 1;
    }
    count[0] = 0;

    let mut next_code = [0u32; 16];
    let mut code = 0;
    for length in 1..16 {
        code = (code + count[length - 1]) << 1;
        next_code[length] = code;
    }

    lengths
        .iter()
        .map(|&length| {
            if length == 0 {
                return 0;
            }
            let code = next_code[length as usize];
            next_code[length as usize] += 1;
            code as u16
        })
        .collect()
}

/// Run-length encode a sequence of code lengths with the code length alphabet.
///
/// Returns `(symbol, extra bits value)` pairs along with the frequency of each of the 19
/// symbols.
pub(crate) fn tree_symbols(lengths: &[u8]) -> (Vec<(u8, u8)>, [u32; 19]) {
    let mut symbols = Vec::new();
    let mut frequencies = [0u32; 19];

    let mut i = 0;
    while i < lengths.len() {
        let length = lengths[i];
        let run_length = lengths[i..].iter().take_while(|&&l| l == length).count();
        let mut run = run_length;

        if length == 0 {
            if run < 3 {
                symbols.extend(std::iter::repeat((0, 0)).take(run));
                frequencies[0] += run as u32;
            } else {
                while run > 0 {
                    let mut repeat = run.min(138);
                    if repeat > run - 3 && repeat < run {
                        repeat = run - 3;
                    }
                    if repeat <= 10 {
                        symbols.push((17, (repeat - 3) as u8));
                        frequencies[17] += 1;
                    } else {
                        symbols.push((18, (repeat - 11) as u8));
                        frequencies[18] += 1;
                    }
                    run -= repeat;
                }
            }
        } else {
            symbols.push((length, 0));
            frequencies[length as usize] += 1;
            run -= 1;

            if run < 3 {
                symbols.extend(std::iter::repeat((length, 0)).take(run));
                frequencies[length as usize] += run as u32;
            } else {
                while run > 0 {
                    let mut repeat = run.min(6);
                    if repeat > run - 3 && repeat < run {
                        repeat = run - 3;
                    }
                    symbols.push((16, (repeat - 3) as u8));
                    frequencies[16] += 1;
                    run -= repeat;
                }
            }
        }

        i += run_length;
    }

    (symbols, frequencies)
}

/// Write a single final block coded with the fixed Huffman tables.
pub(crate) fn write_fixed_block(writer: &mut BitWriter, symbols: &[Symbol]) {
    writer.write_bits(1, 1, false); // bfinal
    writer.write_bits(1, 2, false); // btype

    let lengths = &FIXED_LITLEN_LENGTHS[..];
    let dist_lengths = &FIXED_DIST_LENGTHS[..];
    write_symbols(
        writer,
        symbols,
        &compute_codes(lengths),
        lengths,
        &compute_codes(dist_lengths),
        dist_lengths,
    );
}

/// Write a single final block with Huffman tables derived from the symbol frequencies.
pub(crate) fn write_dynamic_block(
    writer: &mut BitWriter,
    symbols: &[Symbol],
    frequencies: &[u32; 286],
    dist_frequencies: &[u32; 30],
) {
    writer.write_bits(1, 1, false); // bfinal
    writer.write_bits(2, 2, false); // btype

    let lengths = compute_code_lengths(frequencies, LITLEN_LENGTH_LIMIT);
    let dist_lengths = compute_code_lengths(dist_frequencies, DIST_LENGTH_LIMIT);

    let mut num_litlen_codes = 286;
    while num_litlen_codes > 257 && lengths[num_litlen_codes - 1] == 0 {
        num_litlen_codes -= 1;
    }
    let mut num_dist_codes = 30;
    while num_dist_codes > 1 && dist_lengths[num_dist_codes - 1] == 0 {
        num_dist_codes -= 1;
    }

    let all_lengths: Vec<u8> = lengths[..num_litlen_codes]
        .iter()
        .chain(&dist_lengths[..num_dist_codes])
        .copied()
        .collect();
    let (length_symbols, code_length_frequencies) = tree_symbols(&all_lengths);
    let code_length_lengths =
        compute_code_lengths(&code_length_frequencies, CODE_LENGTH_LENGTH_LIMIT);
    let code_length_codes = compute_codes(&code_length_lengths);

    let mut num_code_length_codes = 19;
    while num_code_length_codes > 4
        && code_length_lengths[CLCL_ORDER[num_code_length_codes - 1]] == 0
    {
        num_code_length_codes -= 1;
    }

    writer.write_bits(num_litlen_codes as u32 - 257, 5, false); // hlit
    writer.write_bits(num_dist_codes as u32 - 1, 5, false); // hdist
    writer.write_bits(num_code_length_codes as u32 - 4, 4, false); // hclen
    for &symbol in &CLCL_ORDER[..num_code_length_codes] {
        writer.write_bits(u32::from(code_length_lengths[symbol]), 3, false);
    }

    for &(symbol, extra) in &length_symbols {
        writer.write_bits(
            u32::from(code_length_codes[symbol as usize]),
            code_length_lengths[symbol as usize],
            true,
        );
        match symbol {
            16 => writer.write_bits(u32::from(extra), 2, false),
            17 => writer.write_bits(u32::from(extra), 3, false),
            18 => writer.write_bits(u32::from(extra), 7, false),
            _ => {}
        }
    }

    write_symbols(
        writer,
        symbols,
        &compute_codes(&lengths),
        &lengths,
        &compute_codes(&dist_lengths),
        &dist_lengths,
    );
}

fn write_symbols(
    writer: &mut BitWriter,
    symbols: &[Symbol],
    codes: &[u16],
    lengths: &[u8],
    dist_codes: &[u16],
    dist_lengths: &[u8],
) {
    for symbol in symbols {
        match *symbol {
            Symbol::Literal(lit) => {
                writer.write_bits(u32::from(codes[lit as usize]), lengths[lit as usize], true);
            }
            Symbol::EndOfBlock => {
                writer.write_bits(u32::from(codes[256]), lengths[256], true);
            }
            Symbol::Backref {
                length_sym,
                length_extra,
                length_extra_bits,
                dist_sym,
                dist_extra,
                dist_extra_bits,
            } => {
                let sym = length_sym as usize;
                writer.write_bits(u32::from(codes[sym]), lengths[sym], true);
                writer.write_bits(u32::from(length_extra), length_extra_bits, false);

                let sym = dist_sym as usize;
                writer.write_bits(u32::from(dist_codes[sym]), dist_lengths[sym], true);
                writer.write_bits(u32::from(dist_extra), dist_extra_bits, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::HuffmanTable;
    use rand::Rng;
    use std::{cmp::Reverse, collections::BinaryHeap};

    fn kraft_sum(lengths: &[u8], limit: u8) -> u64 {
        lengths
            .iter()
            .filter(|&&l| l > 0)
            .map(|&l| 1u64 << (limit - l))
            .sum()
    }

    /// Cost of an unrestricted Huffman code.
    fn huffman_cost(frequencies: &[u32]) -> u64 {
        let mut heap: BinaryHeap<Reverse<u64>> = frequencies
            .iter()
            .filter(|&&f| f > 0)
            .map(|&f| Reverse(u64::from(f)))
            .collect();
        let mut cost = 0;
        while heap.len() > 1 {
            let Reverse(a) = heap.pop().unwrap();
            let Reverse(b) = heap.pop().unwrap();
            cost += a + b;
            heap.push(Reverse(a + b));
        }
        cost
    }

    fn random_frequencies(rng: &mut impl Rng, n: usize) -> Vec<u32> {
        (0..n)
            .map(|_| match rng.gen_range(0..5) {
                0 | 1 => 0,
                2 => 1,
                3 => rng.gen_range(1..10),
                _ => rng.gen_range(1..100_000),
            })
            .collect()
    }

    #[test]
    fn code_lengths_are_complete_and_limited() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let n = rng.gen_range(2..=286);
            let limit = if n > 128 { 15 } else { [5, 7, 9, 15][rng.gen_range(0..4)] };
            if n > 1 << limit {
                continue;
            }
            let frequencies = random_frequencies(&mut rng, n);
            let used = frequencies.iter().filter(|&&f| f > 0).count();
            let lengths = compute_code_lengths(&frequencies, limit);

            assert!(lengths.iter().all(|&l| l <= limit));
            for (&f, &l) in frequencies.iter().zip(&lengths) {
                assert_eq!(f > 0, l > 0);
            }
            if used >= 2 {
                assert_eq!(kraft_sum(&lengths, limit), 1 << limit);
                let table = HuffmanTable::new(&lengths).unwrap();
                assert!(table.entries().iter().all(|&e| e >> 16 != 0));
            }
        }
    }

    #[test]
    fn code_lengths_are_optimal() {
        // With at most 16 symbols an unrestricted Huffman code never exceeds 15 bits.
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let n = rng.gen_range(2..=16);
            let frequencies = random_frequencies(&mut rng, n);
            if frequencies.iter().filter(|&&f| f > 0).count() < 2 {
                continue;
            }
            let lengths = compute_code_lengths(&frequencies, 15);
            let cost: u64 = frequencies
                .iter()
                .zip(&lengths)
                .map(|(&f, &l)| u64::from(f) * u64::from(l))
                .sum();
            assert_eq!(cost, huffman_cost(&frequencies), "{:?}", frequencies);
        }
    }

    #[test]
    fn length_limit_is_binding() {
        // Fibonacci weights produce a maximally skewed tree.
        let mut frequencies = vec![1u32, 1];
        while frequencies.len() < 30 {
            let n = frequencies.len();
            frequencies.push(frequencies[n - 1] + frequencies[n - 2]);
        }
        let lengths = compute_code_lengths(&frequencies, 7);
        assert_eq!(lengths.iter().copied().max(), Some(7));
        assert_eq!(kraft_sum(&lengths, 7), 1 << 7);
    }

    #[test]
    fn degenerate_frequencies() {
        assert_eq!(compute_code_lengths(&[0, 0, 0], 7), vec![0, 0, 0]);
        assert_eq!(compute_code_lengths(&[0, 9, 0], 7), vec![0, 1, 0]);
        assert_eq!(compute_code_lengths(&[3, 9], 7), vec![1, 1]);
    }

    #[test]
    fn canonical_codes() {
        // Example from RFC 1951 section 3.2.2.
        let codes = compute_codes(&[3, 3, 3, 3, 3, 2, 4, 4]);
        assert_eq!(
            codes,
            vec![0b010, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111]
        );
    }

    #[test]
    fn canonical_codes_are_prefix_free() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let frequencies = random_frequencies(&mut rng, 286);
            let lengths = compute_code_lengths(&frequencies, 15);
            let codes = compute_codes(&lengths);

            let used: Vec<(u16, u8)> = codes
                .iter()
                .zip(&lengths)
                .filter(|(_, &l)| l > 0)
                .map(|(&c, &l)| (c, l))
                .collect();
            for (a, &(code_a, len_a)) in used.iter().enumerate() {
                assert!(u32::from(code_a) < 1 << len_a);
                for &(code_b, len_b) in &used[a + 1..] {
                    let shared = len_a.min(len_b);
                    assert_ne!(code_a >> (len_a - shared), code_b >> (len_b - shared));
                }
            }
        }
    }

    #[test]
    fn run_length_encoding() {
        let (symbols, frequencies) = tree_symbols(&[0; 138]);
        assert_eq!(symbols, vec![(18, 127)]);
        assert_eq!(frequencies[18], 1);

        // A run is never split so that fewer than three zeros are left over.
        let (symbols, frequencies) = tree_symbols(&[0; 140]);
        assert_eq!(symbols, vec![(18, 126), (17, 0)]);
        assert_eq!(frequencies[17], 1);

        let (symbols, _) = tree_symbols(&[0; 141]);
        assert_eq!(symbols, vec![(18, 127), (17, 0)]);

        let (symbols, _) = tree_symbols(&[8; 9]);
        assert_eq!(symbols, vec![(8, 0), (16, 2), (16, 0)]);

        let (symbols, _) = tree_symbols(&[0, 0, 3]);
        assert_eq!(symbols, vec![(0, 0), (0, 0), (3, 0)]);

        let (symbols, frequencies) = tree_symbols(&[5, 5, 0, 0, 0, 0, 7]);
        assert_eq!(symbols, vec![(5, 0), (5, 0), (17, 1), (7, 0)]);
        assert_eq!(frequencies[5], 2);
        assert_eq!(frequencies[17], 1);
    }

    #[test]
    fn run_length_encoding_expands_back() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let lengths: Vec<u8> = (0..rng.gen_range(1..320))
                .map(|_| if rng.gen_bool(0.7) { 0 } else { rng.gen_range(1..4) })
                .collect();
            let (symbols, _) = tree_symbols(&lengths);

            let mut expanded = Vec::new();
            for (symbol, extra) in symbols {
                match symbol {
                    16 => {
                        let prev = *expanded.last().unwrap();
                        expanded.extend(std::iter::repeat(prev).take(extra as usize + 3));
                    }
                    17 => expanded.extend(std::iter::repeat(0).take(extra as usize + 3)),
                    18 => expanded.extend(std::iter::repeat(0).take(extra as usize + 11)),
                    _ => expanded.push(symbol),
                }
            }
            assert_eq!(expanded, lengths);
        }
    }

    #[test]
    fn backref_symbols() {
        for length in 3..=258 {
            for &distance in &[1, 2, 5, 16, 17, 24577, 32768] {
                let symbol = Symbol::backref(length, distance);
                assert_eq!(symbol.decode_backref(), Some((length, distance)));
            }
        }
        assert!(matches!(
            Symbol::backref(258, 1),
            Symbol::Backref {
                length_sym: 285,
                length_extra_bits: 0,
                ..
            }
        ));
        assert!(matches!(
            Symbol::backref(10, 32768),
            Symbol::Backref {
                length_sym: 264,
                dist_sym: 29,
                dist_extra: 8191,
                dist_extra_bits: 13,
                ..
            }
        ));
    }
}
