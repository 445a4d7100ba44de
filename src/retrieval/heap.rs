use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::types::DocId;

/// One candidate surviving retrieval, paired with its accumulated score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub docid: DocId,
    pub score: i64,
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted so `BinaryHeap`'s max-heap behaves as a min-heap: the
        // weakest candidate sits on top and is the one `pop`ped when the
        // heap grows past capacity.
        other.score.cmp(&self.score).then_with(|| other.docid.cmp(&self.docid))
    }
}

/// Bounded top-k collector. Keeps at most `k` candidates, evicting the
/// current weakest one whenever a stronger candidate arrives.
pub struct TopKHeap {
    heap: BinaryHeap<Scored>,
    k: usize,
}

impl TopKHeap {
    pub fn new(k: usize) -> Self {
        TopKHeap {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
        }
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    pub fn threshold(&self) -> i64 {
        if self.heap.len() < self.k {
            i64::MIN
        } else {
            self.heap.peek().map(|s| s.score).unwrap_or(i64::MIN)
        }
    }

    pub fn offer(&mut self, docid: DocId, score: i64) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(Scored { docid, score });
        } else if score > self.threshold() {
            self.heap.pop();
            self.heap.push(Scored { docid, score });
        }
    }

    /// Drains into descending-score order. Ties break by docid in the
    /// property's traversal direction: ascending for a forward property,
    /// descending when `reverse` is set.
    pub fn into_sorted_vec(self, reverse: bool) -> Vec<Scored> {
        let mut results: Vec<Scored> = self.heap.into_iter().collect();
        results.sort_by(|a, b| {
            b.score.cmp(&a.score).then_with(|| {
                if reverse {
                    b.docid.cmp(&a.docid)
                } else {
                    a.docid.cmp(&b.docid)
                }
            })
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_k_strongest_candidates() {
        let mut heap = TopKHeap::new(2);
        heap.offer(DocId::new(1), 5);
        heap.offer(DocId::new(2), 9);
        heap.offer(DocId::new(3), 1);
        let results = heap.into_sorted_vec(false);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].docid, DocId::new(2));
        assert_eq!(results[1].docid, DocId::new(1));
    }

    #[test]
    fn zero_k_collects_nothing() {
        let mut heap = TopKHeap::new(0);
        heap.offer(DocId::new(1), 5);
        assert!(heap.into_sorted_vec(false).is_empty());
    }

    #[test]
    fn ties_break_by_ascending_docid_when_not_reversed() {
        let mut heap = TopKHeap::new(2);
        heap.offer(DocId::new(5), 3);
        heap.offer(DocId::new(2), 3);
        let results = heap.into_sorted_vec(false);
        assert_eq!(results[0].docid, DocId::new(2));
        assert_eq!(results[1].docid, DocId::new(5));
    }

    #[test]
    fn ties_break_by_descending_docid_when_reversed() {
        let mut heap = TopKHeap::new(2);
        heap.offer(DocId::new(5), 3);
        heap.offer(DocId::new(2), 3);
        let results = heap.into_sorted_vec(true);
        assert_eq!(results[0].docid, DocId::new(5));
        assert_eq!(results[1].docid, DocId::new(2));
    }
}
