use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{DocId, Impact};

/// Documents packed into one block before it seals and a new one is
/// opened. Chosen to keep a block comfortably under one 4 KiB page, the
/// same sizing logic the teacher applies in `mmap::mmap_file` (`PAGE_SIZE`).
pub const BLOCK_CAPACITY: usize = 128;

/// Converts a caller-supplied byte budget into a pool's block capacity,
/// the same "bytes in, blocks out" conversion `PropertyConfig::pool_size`
/// implies. One block costs roughly `BLOCK_CAPACITY * 8` bytes (a `DocId`
/// plus an `Impact` per slot).
pub fn blocks_for_byte_budget(bytes: usize) -> usize {
    let block_bytes = BLOCK_CAPACITY * (std::mem::size_of::<DocId>() + std::mem::size_of::<Impact>());
    (bytes / block_bytes).max(1)
}

/// Arena-style reference to a block: which pool it lives in, and its
/// index within that pool's `Vec<PostingBlock>`. Stands in for the
/// original's raw back-pointer; never compared against a `-1` sentinel
/// (see `crate::error` / REDESIGN notes) -- absence is always
/// `Option<BlockLocation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    pub pool: u32,
    pub offset: u32,
}

impl BlockLocation {
    pub fn new(pool: u32, offset: u32) -> Self {
        BlockLocation { pool, offset }
    }
}

/// One fixed-capacity run of postings. Immutable once `count` reaches
/// `BLOCK_CAPACITY`; `prev` chains back to the block appended before it,
/// forming the reverse-insertion-order linked list a cursor replays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingBlock {
    pub docids: Vec<DocId>,
    pub impacts: Vec<Impact>,
    pub prev: Option<BlockLocation>,
    /// Largest impact among this block's entries, cached at seal time for
    /// the bounded retrieval variants (`BwandOr`/`Mbwand`) instead of being
    /// recomputed per query.
    pub max_impact: Impact,
}

impl PostingBlock {
    fn new(prev: Option<BlockLocation>) -> Self {
        PostingBlock {
            docids: Vec::with_capacity(BLOCK_CAPACITY),
            impacts: Vec::with_capacity(BLOCK_CAPACITY),
            prev,
            max_impact: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.docids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.docids.len() >= BLOCK_CAPACITY
    }

    fn push(&mut self, docid: DocId, impact: Impact) {
        self.docids.push(docid);
        self.impacts.push(impact);
        if impact > self.max_impact {
            self.max_impact = impact;
        }
    }
}

/// Bounded arena of blocks for a single term within a single property.
/// A `PropertyIndex` owns one `Vec<SegmentPool>` per term bucket and is
/// responsible for rolling over into a fresh pool when this one fills
/// (spec assigns pool-count enforcement to the Property Index, not here).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SegmentPool {
    blocks: Vec<PostingBlock>,
    capacity: usize,
}

impl SegmentPool {
    pub fn new(capacity: usize) -> Self {
        SegmentPool {
            blocks: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn is_full(&self) -> bool {
        self.blocks.len() >= self.capacity
    }

    pub fn block(&self, offset: u32) -> &PostingBlock {
        &self.blocks[offset as usize]
    }

    pub fn block_mut(&mut self, offset: u32) -> &mut PostingBlock {
        &mut self.blocks[offset as usize]
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Appends one `(docid, impact)` entry, opening a new block chained to
    /// `prev` when the current tail is absent or full. Returns the
    /// location of the block the entry landed in.
    pub fn append(
        &mut self,
        tail: Option<BlockLocation>,
        pool_index: u32,
        docid: DocId,
        impact: Impact,
    ) -> Result<BlockLocation> {
        let needs_new_block = match tail {
            Some(loc) if loc.pool == pool_index => {
                self.blocks[loc.offset as usize].is_full()
            }
            _ => true,
        };

        if needs_new_block {
            if self.is_full() {
                return Err(Error::new(
                    ErrorKind::PoolsExhausted,
                    "segment pool has no room for a new block",
                ));
            }
            let prev = match tail {
                Some(loc) if loc.pool == pool_index => Some(loc),
                other => other,
            };
            self.blocks.push(PostingBlock::new(prev));
            let offset = (self.blocks.len() - 1) as u32;
            self.blocks[offset as usize].push(docid, impact);
            Ok(BlockLocation::new(pool_index, offset))
        } else {
            let loc = tail.expect("needs_new_block is false only when tail is Some in this pool");
            self.blocks[loc.offset as usize].push(docid, impact);
            Ok(loc)
        }
    }
}
