use crate::pool::{BlockLocation, SegmentPool};
use crate::types::{DocId, Impact};

/// Replays a term's postings for one property in physical insertion
/// order: head block first, tail block last, regardless of `reverse`.
/// `reverse` governs only which *direction* counts as "forward" for
/// `advance_to` and for picking extremal docids during retrieval --
/// never the order this cursor itself walks the chain in (see design
/// notes on why a second traversal-order flag would be redundant).
pub struct PostingCursor<'a> {
    pools: &'a [SegmentPool],
    blocks: Vec<BlockLocation>,
    block_idx: usize,
    pos_in_block: usize,
}

impl<'a> PostingCursor<'a> {
    pub fn open(pools: &'a [SegmentPool], tail: BlockLocation) -> Self {
        let mut chain = Vec::new();
        let mut cur = Some(tail);
        while let Some(loc) = cur {
            chain.push(loc);
            cur = pools[loc.pool as usize].block(loc.offset).prev;
        }
        chain.reverse();
        PostingCursor {
            pools,
            blocks: chain,
            block_idx: 0,
            pos_in_block: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.block_idx >= self.blocks.len()
    }

    fn current_block(&self) -> Option<&crate::pool::PostingBlock> {
        self.blocks
            .get(self.block_idx)
            .map(|loc| self.pools[loc.pool as usize].block(loc.offset))
    }

    pub fn current(&self) -> Option<(DocId, Impact)> {
        self.current_block()
            .map(|block| (block.docids[self.pos_in_block], block.impacts[self.pos_in_block]))
    }

    pub fn current_docid(&self) -> Option<DocId> {
        self.current().map(|(docid, _)| docid)
    }

    /// Cached max impact of the block the cursor currently sits in, used
    /// by the bounded retrieval variants as an upper bound on what this
    /// cursor can still contribute within the block.
    pub fn current_block_max_impact(&self) -> Option<Impact> {
        self.current_block().map(|block| block.max_impact)
    }

    pub fn advance(&mut self) {
        if self.is_exhausted() {
            return;
        }
        let len = self.current_block().unwrap().len();
        self.pos_in_block += 1;
        if self.pos_in_block >= len {
            self.pos_in_block = 0;
            self.block_idx += 1;
        }
    }

    /// Skips forward (in the direction `reverse` designates as
    /// increasing) until `current()` is at or past `target`, or the
    /// cursor is exhausted. Uses a binary search per block since each
    /// block's docids are already sorted in that direction.
    pub fn advance_to(&mut self, target: DocId, reverse: bool) {
        while !self.is_exhausted() {
            let loc = self.blocks[self.block_idx];
            let block = self.pools[loc.pool as usize].block(loc.offset);
            let slice = &block.docids[self.pos_in_block..];
            let rel = if reverse {
                slice.partition_point(|d| *d > target)
            } else {
                slice.partition_point(|d| *d < target)
            };
            if rel < slice.len() {
                self.pos_in_block += rel;
                return;
            }
            self.pos_in_block = 0;
            self.block_idx += 1;
        }
    }
}
