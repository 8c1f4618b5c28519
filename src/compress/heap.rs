/// Binary max-heap of `(value, index)` pairs used to rank symbols by frequency.
///
/// Pairs are stored interleaved in one flat array: slot `2k` holds the value of node `k` and slot
/// `2k + 1` its index. Offsets are measured in array slots, so the parent of the node at offset
/// `i` is at `(i - 2) / 4 * 2` and its first child at `2 * i + 2`.
pub(super) struct Heap {
    buffer: Vec<u32>,
    length: usize,
}

impl Heap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity * 2],
            length: 0,
        }
    }

    /// Number of pairs currently in the heap.
    pub fn len(&self) -> usize {
        self.length / 2
    }

    fn parent(offset: usize) -> usize {
        (offset - 2) / 4 * 2
    }

    fn child(offset: usize) -> usize {
        2 * offset + 2
    }

    fn swap_nodes(&mut self, a: usize, b: usize) {
        self.buffer.swap(a, b);
        self.buffer.swap(a + 1, b + 1);
    }

    pub fn push(&mut self, index: u16, value: u32) {
        let mut current = self.length;
        if current + 2 > self.buffer.len() {
            self.buffer.resize(current + 2, 0);
        }
        self.buffer[current] = value;
        self.buffer[current + 1] = u32::from(index);
        self.length += 2;

        // Sift up.
        while current > 0 {
            let parent = Self::parent(current);
            if self.buffer[current] <= self.buffer[parent] {
                break;
            }
            self.swap_nodes(current, parent);
            current = parent;
        }
    }

    /// Remove and return the `(index, value)` pair with the largest value.
    pub fn pop(&mut self) -> Option<(u16, u32)> {
        if self.length == 0 {
            return None;
        }
        let value = self.buffer[0];
        let index = self.buffer[1] as u16;

        self.length -= 2;
        self.buffer[0] = self.buffer[self.length];
        self.buffer[1] = self.buffer[self.length + 1];

        // Sift down.
        let mut parent = 0;
        loop {
            let mut current = Self::child(parent);
            if current >= self.length {
                break;
            }
            if current + 2 < self.length && self.buffer[current + 2] > self.buffer[current] {
                current += 2;
            }
            if self.buffer[current] <= self.buffer[parent] {
                break;
            }
            self.swap_nodes(current, parent);
            parent = current;
        }

        Some((index, value))
    }
}
