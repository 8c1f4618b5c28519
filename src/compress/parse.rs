use crate::compress::{
    bitstream::Symbol,
    matchfinder::{HashChainMatchFinder, Match},
    MIN_MATCH,
};

/// Token stream for one block along with the symbol frequencies needed to code it.
pub(crate) struct ParsedBlock {
    pub symbols: Vec<Symbol>,
    pub frequencies: [u32; 286],
    pub dist_frequencies: [u32; 30],
}

impl ParsedBlock {
    fn new() -> Self {
        Self {
            symbols: Vec::new(),
            frequencies: [0; 286],
            dist_frequencies: [0; 30],
        }
    }

    fn push_literal(&mut self, lit: u8) {
        self.symbols.push(Symbol::Literal(lit));
        self.frequencies[lit as usize] += 1;
    }

    fn push_match(&mut self, m: Match) {
        let symbol = Symbol::backref(m.length, m.distance);
        if let Symbol::Backref {
            length_sym,
            dist_sym,
            ..
        } = symbol
        {
            self.frequencies[length_sym as usize] += 1;
            self.dist_frequencies[dist_sym as usize] += 1;
        }
        self.symbols.push(symbol);
    }

    fn push_end_of_block(&mut self) {
        self.symbols.push(Symbol::EndOfBlock);
        self.frequencies[256] += 1;
    }
}

/// LZ77 parser with one step of lazy evaluation.
///
/// A match shorter than `lazy_threshold` is held back for one position; if the match starting at
/// the next byte is strictly longer, the held byte is emitted as a literal and the later match is
/// used instead. A threshold of zero gives a purely greedy parse.
pub(crate) struct LazyParser {
    match_finder: HashChainMatchFinder,
    lazy_threshold: u16,
}

impl LazyParser {
    pub fn new(lazy_threshold: u16) -> Self {
        Self {
            match_finder: HashChainMatchFinder::new(),
            lazy_threshold,
        }
    }

    /// Parse all of `data` into a single block terminated by an end-of-block symbol.
    pub fn parse(mut self, data: &[u8]) -> ParsedBlock {
        let mut block = ParsedBlock::new();
        let mut pending: Option<Match> = None;
        let mut skip = 0;

        let mut ip = 0;
        while ip < data.len() {
            // Bytes covered by an emitted match still have to be in the hash chains.
            if skip > 0 {
                skip -= 1;
                self.match_finder.insert(data, ip);
                ip += 1;
                continue;
            }

            if ip + MIN_MATCH > data.len() {
                let mut literal_start = ip;
                if let Some(m) = pending.take() {
                    block.push_match(m);
                    literal_start = ip - 1 + m.length as usize;
                }
                for &lit in &data[literal_start..] {
                    block.push_literal(lit);
                }
                break;
            }

            let best = self.match_finder.longest_match(data, ip);
            match (pending.take(), best) {
                (Some(previous), Some(m)) if previous.length < m.length => {
                    block.push_literal(data[ip - 1]);
                    block.push_match(m);
                    skip = m.length as usize - 1;
                }
                (Some(previous), _) => {
                    block.push_match(previous);
                    skip = previous.length as usize - 2;
                }
                (None, Some(m)) if m.length < self.lazy_threshold => pending = Some(m),
                (None, Some(m)) => {
                    block.push_match(m);
                    skip = m.length as usize - 1;
                }
                (None, None) => block.push_literal(data[ip]),
            }

            self.match_finder.insert(data, ip);
            ip += 1;
        }

        block.push_end_of_block();
        block
    }
}
