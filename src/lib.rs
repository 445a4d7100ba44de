pub mod cancel;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod manager;
pub mod merge;
pub mod persistence;
pub mod pool;
pub mod posting;
pub mod property;
pub mod retrieval;
pub mod tokenize;
pub mod types;

pub use cancel::CancellationToken;
pub use config::{Config, PropertyConfig};
pub use error::{Error, ErrorKind, Result};
pub use manager::{Manager, PropertyTokens, SearchHit, SearchOutcome};
pub use retrieval::{Algorithm, Scored};
pub use tokenize::{Tokenize, WeightedToken, WhitespaceTokenizer};
pub use types::{hash_term, DocId, Impact, QueryWeight, Term};

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                              ZAMBEZI CORE MODULE LAYOUT                                      │
└────────────────────────────────────────────────────────────────────────────────────────────┘

  manager::Manager
    property_list: Vec<String>                 // insertion order = default search scope
    property_map: HashMap<String, PropertyIndex>
    tokenizer: Option<Arc<dyn Tokenize>>

      property::PropertyIndex (one per property, independent RwLock)
        state: RwLock<PropertyState { dictionary: TermDictionary, pools: Vec<SegmentPool> }>
        append(term, docid, impact)   -> posting::writer::append
        search(terms, filter, algo)   -> retrieval::engine::execute over posting::PostingCursor

          pool::SegmentPool           // Vec<PostingBlock>, bounded by pool_block_capacity
          dictionary::TermDictionary  // Term -> { tail: BlockLocation, total, last_docid }
          posting::PostingCursor      // walks the back-pointer chain tail -> head

    search() over multiple properties -> merge::cross_property::merge -> retrieval::TopKHeap

    save()/open() -> persistence::{save, load}   // one file per call, per-property records

  Everything above is reachable only through `Manager`; nothing is a free-floating
  singleton. A caller holding a `Manager` has the whole index handle this crate exposes.
*/
