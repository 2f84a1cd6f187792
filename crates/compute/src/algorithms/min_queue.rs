use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A priority queue entry.
///
/// Uses reversed ordering so `BinaryHeap` (a max-heap) behaves as a min-heap.
/// `seq` breaks cost ties in push order.
#[derive(Debug)]
struct Entry<T> {
    cost: i64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Binary min-heap keyed by integer cost. Equal costs pop first-in first-out.
#[derive(Debug)]
pub struct MinQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> MinQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, cost: i64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { cost, seq, item });
    }

    /// Remove and return the cheapest entry.
    pub fn pop(&mut self) -> Option<(i64, T)> {
        self.heap.pop().map(|e| (e.cost, e.item))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for MinQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
