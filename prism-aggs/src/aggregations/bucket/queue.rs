//! Fixed-capacity best-of-N selection by significance score

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Anything the queue can rank
pub trait Significance {
    fn significance(&self) -> f64;
}

struct Entry<T> {
    score: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Equal scores: the later insertion ranks lower, so it is evicted
    // first and drained last.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Keeps the `capacity` highest-scoring entries seen so far.
///
/// Internally a min-heap, so the weakest survivor is always at the top.
pub struct BucketSignificanceQueue<T> {
    capacity: usize,
    next_seq: u64,
    heap: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T: Significance> BucketSignificanceQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_seq: 0,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Score of the weakest entry currently held
    pub fn min_score(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.0.score)
    }

    /// Offer an item.
    ///
    /// Returns `None` if it was added without displacing anything. At
    /// capacity, returns `Some` with whichever item left the queue: the
    /// previous minimum if the new item scored strictly higher, otherwise
    /// the new item itself.
    pub fn insert_with_overflow(&mut self, item: T) -> Option<T> {
        let entry = Entry {
            score: item.significance(),
            seq: self.next_seq,
            item,
        };
        self.next_seq += 1;

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
            return None;
        }

        let displaces_min = self
            .heap
            .peek()
            .is_some_and(|Reverse(min)| entry > *min);
        if !displaces_min {
            return Some(entry.item);
        }

        let evicted = self.heap.pop().map(|Reverse(min)| min.item);
        self.heap.push(Reverse(entry));
        evicted
    }

    /// Drain into a vector ordered by descending score
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(entry)) = self.heap.pop() {
            out.push(entry.item);
        }
        out.reverse();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Scored(&'static str, f64);

    impl Significance for Scored {
        fn significance(&self) -> f64 {
            self.1
        }
    }

    #[test]
    fn test_keeps_top_k() {
        let mut queue = BucketSignificanceQueue::new(2);
        let mut evicted = Vec::new();
        for (name, score) in [("a", 5.0), ("b", 1.0), ("c", 9.0), ("d", 3.0), ("e", 7.0)] {
            if let Some(out) = queue.insert_with_overflow(Scored(name, score)) {
                evicted.push(out.0);
            }
        }

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.min_score(), Some(7.0));
        let names: Vec<_> = queue.into_sorted_vec().into_iter().map(|s| s.0).collect();
        assert_eq!(names, vec!["c", "e"]);
        assert_eq!(evicted, vec!["b", "d", "a"]);
    }

    #[test]
    fn test_under_capacity_never_evicts() {
        let mut queue = BucketSignificanceQueue::new(10);
        assert!(queue.insert_with_overflow(Scored("a", 1.0)).is_none());
        assert!(queue.insert_with_overflow(Scored("b", -3.0)).is_none());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_rejects_lower_candidate() {
        let mut queue = BucketSignificanceQueue::new(1);
        queue.insert_with_overflow(Scored("a", 4.0));
        let rejected = queue.insert_with_overflow(Scored("b", 2.0));
        assert_eq!(rejected, Some(Scored("b", 2.0)));
    }

    #[test]
    fn test_ties_keep_earliest() {
        let mut queue = BucketSignificanceQueue::new(2);
        queue.insert_with_overflow(Scored("first", 1.0));
        queue.insert_with_overflow(Scored("second", 1.0));
        let rejected = queue.insert_with_overflow(Scored("third", 1.0));
        assert_eq!(rejected.map(|s| s.0), Some("third"));

        let names: Vec<_> = queue.into_sorted_vec().into_iter().map(|s| s.0).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut queue = BucketSignificanceQueue::new(0);
        let rejected = queue.insert_with_overflow(Scored("a", 100.0));
        assert_eq!(rejected.map(|s| s.0), Some("a"));
        assert!(queue.is_empty());
        assert!(queue.into_sorted_vec().is_empty());
    }

    #[test]
    fn test_drain_descending_with_negatives() {
        let mut queue = BucketSignificanceQueue::new(4);
        for (name, score) in [("a", -1.0), ("b", f64::NEG_INFINITY), ("c", 0.5), ("d", 2.0)] {
            queue.insert_with_overflow(Scored(name, score));
        }
        let scores: Vec<_> = queue.into_sorted_vec().into_iter().map(|s| s.1).collect();
        assert_eq!(scores, vec![2.0, 0.5, -1.0, f64::NEG_INFINITY]);
    }
}
