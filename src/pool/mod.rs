pub mod segment_pool;

pub use segment_pool::{blocks_for_byte_budget, BlockLocation, PostingBlock, SegmentPool, BLOCK_CAPACITY};
