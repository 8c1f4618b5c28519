use crate::compress::{MAX_MATCH, MIN_MATCH, WINDOW_SIZE};

const CACHE_SIZE: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub length: u16,
    pub distance: u16,
}

#[inline(always)]
fn key(data: &[u8], ip: usize) -> u32 {
    u32::from(data[ip]) | u32::from(data[ip + 1]) << 8 | u32::from(data[ip + 2]) << 16
}

#[inline(always)]
fn compute_hash(key: u32) -> usize {
    (key.wrapping_mul(0x9E37_79B1) >> 16) as usize
}

/// Hash chains over every 3-byte prefix in the window.
///
/// `hash_table` holds the most recent position with each hash, and `links` the previous position
/// with the same hash for every position in the window. Both store `position + 1` so that zero
/// can mark the end of a chain.
pub(crate) struct HashChainMatchFinder {
    hash_table: Box<[u32]>,
    links: Box<[u32]>,
}

impl HashChainMatchFinder {
    pub(crate) fn new() -> Self {
        Self {
            hash_table: vec![0; CACHE_SIZE].into_boxed_slice(),
            links: vec![0; WINDOW_SIZE].into_boxed_slice(),
        }
    }

    /// Add the 3-byte prefix starting at `ip` to the chains.
    pub(crate) fn insert(&mut self, data: &[u8], ip: usize) {
        if ip + MIN_MATCH > data.len() {
            return;
        }
        let hash_index = compute_hash(key(data, ip));
        self.links[ip % WINDOW_SIZE] = self.hash_table[hash_index];
        self.hash_table[hash_index] = ip as u32 + 1;
    }

    /// Find the longest match for the bytes at `ip` among the positions inserted so far.
    ///
    /// Candidates are visited from nearest to farthest and a candidate only replaces the current
    /// best if it is strictly longer, so ties go to the shortest distance. Positions more than
    /// `WINDOW_SIZE` bytes back end the search. `ip` itself must not have been inserted yet.
    ///
    /// There is no cap on chain length, so one search visits up to `WINDOW_SIZE` candidates in
    /// the worst case, such as long runs of a repeated short pattern.
    pub(crate) fn longest_match(&self, data: &[u8], ip: usize) -> Option<Match> {
        if ip + MIN_MATCH > data.len() {
            return None;
        }
        let value = key(data, ip);
        let max_length = MAX_MATCH.min(data.len() - ip);

        let mut best_length = 0;
        let mut best_distance = 0;

        let mut next = self.hash_table[compute_hash(value)] as usize;
        while next != 0 {
            let candidate = next - 1;
            let distance = ip - candidate;
            if distance > WINDOW_SIZE {
                break;
            }
            next = self.links[candidate % WINDOW_SIZE] as usize;

            if key(data, candidate) != value {
                continue;
            }

            // The candidate can only win if it agrees with everything the best match covered.
            let mut length = MIN_MATCH;
            if best_length > MIN_MATCH {
                if data[candidate + MIN_MATCH..candidate + best_length]
                    != data[ip + MIN_MATCH..ip + best_length]
                {
                    continue;
                }
                length = best_length;
            }

            length += data[candidate + length..]
                .iter()
                .zip(&data[ip + length..ip + max_length])
                .take_while(|(a, b)| a == b)
                .count();

            if length > best_length {
                best_length = length;
                best_distance = distance;
            }
            if length == max_length {
                break;
            }
        }

        if best_length >= MIN_MATCH {
            Some(Match {
                length: best_length as u16,
                distance: best_distance as u16,
            })
        } else {
            None
        }
    }
}
