//! Output buffers for the decoders.
//!
//! Both strategies write into a pre-sized `Vec<u8>` through an explicit write cursor `op`, so the
//! hot decode loop only has to call [`OutputBuffer::reserve`] once per symbol.

use crate::decompress::DecompressionError;

/// Size of the history kept by [`BufferType::Block`] between flushes.
const WINDOW_SIZE: usize = 32768;
/// Longest run of bytes a single symbol can produce.
const MAX_MATCH: usize = 258;
/// Upper bound on how many output bytes one input byte can produce.
const MAX_EXPANSION: usize = 1032;

/// Strategy used by [`Decompressor`](crate::Decompressor) to hold its output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BufferType {
    /// Decode into a fixed-size block behind a 32 KiB window, moving completed output into the
    /// result whenever the block fills up.
    Block,
    /// Decode into one buffer that grows to an estimate of the final size.
    #[default]
    Adaptive,
}

/// What the decoder knows about the remaining input when the output buffer has to grow.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowthHint {
    pub input_len: usize,
    pub ip: usize,
    /// Shortest literal/length code of the current block, or zero if unknown.
    pub min_code_length: u8,
    /// Overrides the ratio extrapolated from the input consumed so far.
    pub fix_ratio: Option<usize>,
}

/// Pick a new size for a buffer of `current` bytes that must hold at least `required` bytes.
fn next_size(current: usize, required: usize, hint: GrowthHint) -> usize {
    let remaining = hint.input_len.saturating_sub(hint.ip);
    let ratio = match hint.fix_ratio {
        Some(ratio) => ratio,
        None if hint.ip > 0 => hint.input_len / hint.ip + 1,
        None => 0,
    };

    let size = if ratio < 2 {
        // No usable ratio, so bound the rest by how many symbols the remaining bits can hold.
        let max_codes = remaining * 8 / usize::from(hint.min_code_length.max(1));
        let max_inflate = max_codes / 2 * MAX_MATCH;
        if max_inflate < current {
            current + max_inflate
        } else {
            current * 2
        }
    } else {
        current.saturating_mul(ratio)
    };

    let bound = (current * 2).max(current + remaining.saturating_mul(MAX_EXPANSION));
    size.min(bound).max(required)
}

/// Output buffer that grows by estimate and keeps every decoded byte.
pub(crate) struct AdaptiveBuffer {
    buffer: Vec<u8>,
    op: usize,
}

impl AdaptiveBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0; size.max(1)],
            op: 0,
        }
    }

    /// Make room for `n` more bytes.
    #[inline(always)]
    pub fn reserve(&mut self, n: usize, hint: GrowthHint) {
        if self.op + n > self.buffer.len() {
            self.expand(self.op + n, hint);
        }
    }

    #[cold]
    fn expand(&mut self, required: usize, hint: GrowthHint) {
        let size = next_size(self.buffer.len(), required, hint);
        log::trace!("growing inflate output buffer {} -> {}", self.buffer.len(), size);
        self.buffer.resize(size, 0);
    }

    /// Append a byte. Room must have been reserved.
    #[inline(always)]
    pub fn push(&mut self, byte: u8) {
        self.buffer[self.op] = byte;
        self.op += 1;
    }

    /// Append `length` bytes copied from `distance` bytes back. Room must have been reserved.
    #[inline(always)]
    pub fn copy_match(&mut self, length: usize, distance: usize) -> Result<(), DecompressionError> {
        if distance > self.op {
            return Err(DecompressionError::DistanceTooFarBack);
        }
        copy_within_overlapping(&mut self.buffer, self.op, length, distance);
        self.op += length;
        Ok(())
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8], hint: GrowthHint) {
        self.reserve(bytes.len(), hint);
        self.buffer[self.op..][..bytes.len()].copy_from_slice(bytes);
        self.op += bytes.len();
    }

    pub fn len(&self) -> usize {
        self.op
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.op]
    }

    pub fn finish(mut self, resize: bool) -> Vec<u8> {
        self.buffer.truncate(self.op);
        if resize {
            self.buffer.shrink_to_fit();
        }
        self.buffer
    }
}

/// Output buffer that only keeps the window needed for back-references, handing completed
/// output over to `flushed`.
pub(crate) struct BlockBuffer {
    buffer: Vec<u8>,
    op: usize,
    flushed: Vec<u8>,
}

impl BlockBuffer {
    pub fn new(block_size: usize) -> Self {
        Self {
            buffer: vec![0; WINDOW_SIZE + block_size.max(1) + MAX_MATCH],
            op: WINDOW_SIZE,
            flushed: Vec::new(),
        }
    }

    /// Make room for `n` more bytes, flushing the block if it is full.
    #[inline(always)]
    pub fn reserve(&mut self, n: usize) {
        if self.op + n > self.buffer.len() {
            self.flush();
        }
    }

    #[cold]
    fn flush(&mut self) {
        log::trace!("flushing {} bytes of inflate output", self.op - WINDOW_SIZE);
        self.flushed
            .extend_from_slice(&self.buffer[WINDOW_SIZE..self.op]);
        self.buffer.copy_within(self.op - WINDOW_SIZE..self.op, 0);
        self.op = WINDOW_SIZE;
    }

    #[inline(always)]
    pub fn push(&mut self, byte: u8) {
        self.buffer[self.op] = byte;
        self.op += 1;
    }

    #[inline(always)]
    pub fn copy_match(&mut self, length: usize, distance: usize) -> Result<(), DecompressionError> {
        if distance > self.len() {
            return Err(DecompressionError::DistanceTooFarBack);
        }
        copy_within_overlapping(&mut self.buffer, self.op, length, distance);
        self.op += length;
        Ok(())
    }

    pub fn extend_from_slice(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            if self.op == self.buffer.len() {
                self.flush();
            }
            let n = bytes.len().min(self.buffer.len() - self.op);
            self.buffer[self.op..][..n].copy_from_slice(&bytes[..n]);
            self.op += n;
            bytes = &bytes[n..];
        }
    }

    pub fn len(&self) -> usize {
        self.flushed.len() + self.op - WINDOW_SIZE
    }

    pub fn finish(mut self, resize: bool) -> Vec<u8> {
        self.flushed
            .extend_from_slice(&self.buffer[WINDOW_SIZE..self.op]);
        if resize {
            self.flushed.shrink_to_fit();
        }
        self.flushed
    }
}

/// Copy `length` bytes starting `distance` bytes before `op` to `op`, one byte at a time so that
/// overlapping ranges repeat the pattern.
#[inline(always)]
fn copy_within_overlapping(buffer: &mut [u8], op: usize, length: usize, distance: usize) {
    debug_assert!(distance > 0);
    if distance >= length {
        buffer.copy_within(op - distance..op - distance + length, op);
    } else {
        for i in op..op + length {
            buffer[i] = buffer[i - distance];
        }
    }
}

/// Either output strategy, chosen once when the decoder is created.
pub(crate) enum OutputBuffer {
    Block(BlockBuffer),
    Adaptive(AdaptiveBuffer),
}

impl OutputBuffer {
    pub fn new(buffer_type: BufferType, buffer_size: usize) -> Self {
        match buffer_type {
            BufferType::Block => OutputBuffer::Block(BlockBuffer::new(buffer_size)),
            BufferType::Adaptive => OutputBuffer::Adaptive(AdaptiveBuffer::new(buffer_size)),
        }
    }

    #[inline(always)]
    pub fn reserve(&mut self, n: usize, hint: GrowthHint) {
        match self {
            OutputBuffer::Block(b) => b.reserve(n),
            OutputBuffer::Adaptive(b) => b.reserve(n, hint),
        }
    }

    #[inline(always)]
    pub fn push(&mut self, byte: u8) {
        match self {
            OutputBuffer::Block(b) => b.push(byte),
            OutputBuffer::Adaptive(b) => b.push(byte),
        }
    }

    #[inline(always)]
    pub fn copy_match(&mut self, length: usize, distance: usize) -> Result<(), DecompressionError> {
        match self {
            OutputBuffer::Block(b) => b.copy_match(length, distance),
            OutputBuffer::Adaptive(b) => b.copy_match(length, distance),
        }
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8], hint: GrowthHint) {
        match self {
            OutputBuffer::Block(b) => b.extend_from_slice(bytes),
            OutputBuffer::Adaptive(b) => b.extend_from_slice(bytes, hint),
        }
    }

    /// Total number of bytes decoded so far.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        match self {
            OutputBuffer::Block(b) => b.len(),
            OutputBuffer::Adaptive(b) => b.len(),
        }
    }

    pub fn finish(self, resize: bool) -> Vec<u8> {
        match self {
            OutputBuffer::Block(b) => b.finish(resize),
            OutputBuffer::Adaptive(b) => b.finish(resize),
        }
    }
}
