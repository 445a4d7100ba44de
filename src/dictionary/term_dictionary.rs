use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pool::BlockLocation;
use crate::types::{DocId, Term};

/// Per-term bookkeeping held by the dictionary. `tail` is the most
/// recently written block for the term (the head of the back-pointer
/// chain a cursor walks), `total` is the running count of postings
/// appended, and `last_docid` is the value an append must respect for
/// the property's monotonicity direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictEntry {
    pub tail: BlockLocation,
    pub total: u64,
    pub last_docid: Option<DocId>,
}

/// Maps a term's hash to its dictionary entry. One instance per
/// property; doesn't itself hold posting bytes -- those live in the
/// property's `SegmentPool`s, addressed through `DictEntry::tail`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TermDictionary {
    entries: HashMap<Term, DictEntry>,
}

impl TermDictionary {
    pub fn new() -> Self {
        TermDictionary {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, term: Term) -> Option<&DictEntry> {
        self.entries.get(&term)
    }

    pub fn get_mut(&mut self, term: Term) -> Option<&mut DictEntry> {
        self.entries.get_mut(&term)
    }

    pub fn entry_or_insert(&mut self, term: Term, tail: BlockLocation) -> &mut DictEntry {
        self.entries.entry(term).or_insert_with(|| DictEntry {
            tail,
            total: 0,
            last_docid: None,
        })
    }

    pub fn term_count(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Term, &DictEntry)> {
        self.entries.iter()
    }
}
