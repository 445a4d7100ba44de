use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::config::PropertyConfig;
use crate::dictionary::TermDictionary;
use crate::error::Result;
use crate::pool::{blocks_for_byte_budget, SegmentPool};
use crate::posting::{self, PostingCursor};
use crate::retrieval::{self, Algorithm, Scored};
use crate::types::{DocId, Impact, QueryWeight, Term};

/// Snapshot of a property's on-disk-serializable state. Wrapping these
/// two fields separately from `PropertyIndex` keeps `persistence`
/// de/serializing plain data rather than reaching through the lock.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PropertyState {
    pub dictionary: TermDictionary,
    pub pools: Vec<SegmentPool>,
}

/// One searchable property: a term dictionary plus the bounded pools
/// backing it, guarded by a single `RwLock` (spec's reader/writer
/// concurrency granularity). Cursors opened during `search` never
/// outlive the read guard they're built under.
pub struct PropertyIndex {
    pub name: String,
    reverse: bool,
    pool_block_capacity: usize,
    pool_count_cap: u32,
    state: RwLock<PropertyState>,
}

impl PropertyIndex {
    pub fn new(config: &PropertyConfig, pool_count_cap: u32, reverse: bool) -> Self {
        PropertyIndex {
            name: config.name.clone(),
            reverse,
            pool_block_capacity: blocks_for_byte_budget(config.pool_size),
            pool_count_cap,
            state: RwLock::new(PropertyState::default()),
        }
    }

    pub fn from_state(name: String, reverse: bool, pool_block_capacity: usize, pool_count_cap: u32, state: PropertyState) -> Self {
        PropertyIndex {
            name,
            reverse,
            pool_block_capacity,
            pool_count_cap,
            state: RwLock::new(state),
        }
    }

    pub fn pool_block_capacity(&self) -> usize {
        self.pool_block_capacity
    }

    pub fn pool_count_cap(&self) -> u32 {
        self.pool_count_cap
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn append(&self, term: Term, docid: DocId, impact: Impact) -> Result<()> {
        let mut state = self.state.write();
        let PropertyState { dictionary, pools } = &mut *state;
        posting::append(
            dictionary,
            pools,
            self.pool_block_capacity,
            self.pool_count_cap,
            term,
            docid,
            impact,
            self.reverse,
        )
    }

    /// Runs retrieval across the given `(term, weight)` pairs. Cursors
    /// are opened and consumed entirely under the read lock.
    pub fn search(
        &self,
        terms: &[(Term, QueryWeight)],
        filter: &retrieval::Filter<'_>,
        algorithm: Algorithm,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Scored>> {
        let state = self.state.read();
        let mut cursors: Vec<(PostingCursor<'_>, QueryWeight)> = Vec::new();
        for &(term, weight) in terms {
            if let Some(entry) = state.dictionary.get(term) {
                cursors.push((PostingCursor::open(&state.pools, entry.tail), weight));
            }
        }
        retrieval::execute(algorithm, cursors, filter, top_k, self.reverse, cancel)
    }

    pub fn term_count(&self) -> usize {
        self.state.read().dictionary.term_count()
    }

    pub fn snapshot(&self) -> parking_lot::RwLockReadGuard<'_, PropertyState> {
        self.state.read()
    }
}
