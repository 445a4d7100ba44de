use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::merge;
use crate::persistence;
use crate::property::PropertyIndex;
use crate::retrieval::{Algorithm, Filter, Scored, TopKHeap};
use crate::tokenize::{Tokenize, WeightedToken};
use crate::types::{hash_term, DocId, QueryWeight, Term};

/// One document's tokenized content, keyed by property name. Ready to
/// hand to `Manager::build_with_tokens` without the manager touching
/// raw text itself.
pub type PropertyTokens = Vec<(String, Vec<WeightedToken>)>;

/// One search hit at the external interface: a docid paired with a
/// `u32` score. The accumulation itself runs in 64-bit arithmetic
/// (`Scored.score` is `i64`); the truncation to `u32` happens exactly
/// once, here, at the facade boundary, saturating rather than wrapping.
/// A negative accumulated score -- possible when a caller supplies a
/// negative query weight -- clamps to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub docid: DocId,
    pub score: u32,
}

impl From<Scored> for SearchHit {
    fn from(scored: Scored) -> Self {
        SearchHit {
            docid: scored.docid,
            score: scored.score.clamp(0, u32::MAX as i64) as u32,
        }
    }
}

/// Result of a (possibly multi-property) search: the merged, ranked
/// hits plus the status of any named property that could not be
/// searched. A property missing from `property_subset` never aborts the
/// whole call -- it is recorded here and the remaining properties are
/// still searched and merged.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub property_errors: Vec<(String, Error)>,
}

/// Facade over every configured property: ingest, search, persistence.
/// The single entry point callers interact with, mirroring the shape of
/// the original manager this core replaces.
pub struct Manager {
    config: Config,
    property_list: Vec<String>,
    property_map: HashMap<String, PropertyIndex>,
    tokenizer: Option<Arc<dyn Tokenize>>,
    verbose: bool,
}

impl Manager {
    pub fn new(config: Config, tokenizer: Option<Arc<dyn Tokenize>>) -> Self {
        let mut property_list = Vec::new();
        let mut property_map = HashMap::new();
        for property_config in config.properties.iter().chain(config.virtual_properties.iter()) {
            property_list.push(property_config.name.clone());
            property_map.insert(
                property_config.name.clone(),
                PropertyIndex::new(property_config, config.pool_count, config.reverse),
            );
        }
        Manager {
            config,
            property_list,
            property_map,
            tokenizer,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn property_names(&self) -> &[String] {
        &self.property_list
    }

    /// Tokenizes `fields` through the injected tokenizer and ingests the
    /// result. Fails if the manager was built with `has_attr_token` and
    /// carries no tokenizer -- use `build_with_tokens` instead.
    pub fn build(&self, docid: DocId, fields: &[(String, String)]) -> Result<()> {
        self.build_with_language_hint(docid, fields, None)
    }

    /// Same as `build`, but forwards `language_hint` to the tokenizer so
    /// a dictionary-backed implementation can pick the right analyzer.
    pub fn build_with_language_hint(
        &self,
        docid: DocId,
        fields: &[(String, String)],
        language_hint: Option<&str>,
    ) -> Result<()> {
        let tokenizer = self.tokenizer.as_ref().ok_or_else(|| {
            Error::new(
                ErrorKind::TokenizerFailure,
                "no tokenizer configured; call build_with_tokens instead",
            )
        })?;
        let mut tokenized: PropertyTokens = Vec::with_capacity(fields.len());
        for (name, text) in fields {
            tokenized.push((name.clone(), tokenizer.tokenize(text, language_hint)?));
        }
        self.build_with_tokens(docid, &tokenized)
    }

    /// Ingests pre-tokenized `(term, weight)` pairs directly, the path
    /// `has_attr_token` selects: the caller has already split and scored
    /// tokens itself, so no tokenizer is consulted here.
    ///
    /// Per-property write locks are acquired in `self.property_list`
    /// order, never the caller-supplied `fields` order: `build_batch`
    /// runs documents concurrently across rayon threads, and two
    /// documents whose `fields` name the same properties in different
    /// orders would otherwise be able to acquire the same two locks in
    /// opposite order on different threads and deadlock.
    pub fn build_with_tokens(&self, docid: DocId, fields: &PropertyTokens) -> Result<()> {
        let mut ordered: Vec<&(String, Vec<WeightedToken>)> = fields.iter().collect();
        ordered.sort_by_key(|(name, _)| {
            self.property_list
                .iter()
                .position(|candidate| candidate == name)
                .unwrap_or(usize::MAX)
        });
        for (property_name, tokens) in ordered {
            let property = self
                .property_map
                .get(property_name)
                .ok_or_else(|| Error::new(ErrorKind::UnknownProperty, property_name.clone()))?;
            for token in tokens {
                let term = hash_term(&token.text);
                let impact = token.weight.max(0) as u32;
                property.append(term, docid, impact)?;
            }
        }
        Ok(())
    }

    /// Ingests a batch of documents in parallel, one rayon task per
    /// document; each document's own per-property appends stay
    /// serialized through that property's lock. Mirrors the teacher's
    /// batch indexer: coarse `eprintln!` progress, not a per-document log
    /// line.
    pub fn build_batch(&self, docs: &[(DocId, PropertyTokens)]) -> Vec<Result<()>> {
        let completed = AtomicUsize::new(0);
        let total = docs.len();
        let results: Vec<Result<()>> = docs
            .par_iter()
            .map(|(docid, fields)| {
                let outcome = self.build_with_tokens(*docid, fields);
                if self.verbose {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 1000 == 0 || done == total {
                        eprintln!("zambezi: indexed {done}/{total} documents");
                    }
                }
                outcome
            })
            .collect();
        results
    }

    /// Searches the named properties (or every configured property when
    /// `property_subset` is `None`) for `query_tokens`, applying `filter`
    /// and returning at most `top_k` results ordered by descending score.
    ///
    /// A name in `property_subset` that isn't configured is recorded in
    /// the returned `SearchOutcome::property_errors` and skipped -- it
    /// does not abort the rest of the query. Cancellation, by contrast,
    /// aborts the whole call: the first property or merge step to
    /// observe `cancel` set returns `Err(ErrorKind::Canceled)` with no
    /// result at all.
    pub fn search(
        &self,
        property_subset: Option<&[String]>,
        query_tokens: &[(String, QueryWeight)],
        filter: &Filter<'_>,
        algorithm: Algorithm,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let search_properties: Vec<&String> = match property_subset {
            Some(names) => names.iter().collect(),
            None => self.property_list.iter().collect(),
        };

        let terms: Vec<(Term, QueryWeight)> = query_tokens
            .iter()
            .map(|(text, weight)| (hash_term(text), *weight))
            .collect();

        let mut per_property: Vec<Vec<Scored>> = Vec::with_capacity(search_properties.len());
        let mut property_errors: Vec<(String, Error)> = Vec::new();
        for name in &search_properties {
            let property = match self.property_map.get(name.as_str()) {
                Some(property) => property,
                None => {
                    property_errors.push((
                        (*name).clone(),
                        Error::new(ErrorKind::UnknownProperty, (*name).clone()),
                    ));
                    continue;
                }
            };
            let mut results = property.search(&terms, filter, algorithm, top_k, cancel)?;
            results.sort_by(|a, b| {
                if self.config.reverse {
                    b.docid.cmp(&a.docid)
                } else {
                    a.docid.cmp(&b.docid)
                }
            });
            per_property.push(results);
        }

        if self.verbose {
            eprintln!(
                "zambezi: searched {} propert{} for top-{}",
                search_properties.len(),
                if search_properties.len() == 1 { "y" } else { "ies" },
                top_k
            );
        }

        // A single property needs no merge pass -- its own top-k output
        // is already the final answer (mirrors the original's
        // single-property bypass).
        let merged = if per_property.len() <= 1 {
            per_property.into_iter().next().unwrap_or_default()
        } else {
            merge::merge(per_property, self.config.reverse, cancel)?
        };

        let mut heap = TopKHeap::new(top_k);
        for scored in merged {
            heap.offer(scored.docid, scored.score);
        }
        Ok(SearchOutcome {
            hits: heap
                .into_sorted_vec(self.config.reverse)
                .into_iter()
                .map(SearchHit::from)
                .collect(),
            property_errors,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let refs: Vec<&PropertyIndex> = self
            .property_list
            .iter()
            .map(|name| &self.property_map[name])
            .collect();
        persistence::save(path, self.config.reverse, &refs)
    }

    pub fn open(config: Config, tokenizer: Option<Arc<dyn Tokenize>>, path: &Path) -> Result<Self> {
        let (reverse, loaded) = persistence::load(path)?;
        let mut property_list = Vec::with_capacity(loaded.len());
        let mut property_map = HashMap::with_capacity(loaded.len());
        for entry in loaded {
            property_list.push(entry.name.clone());
            property_map.insert(
                entry.name.clone(),
                PropertyIndex::from_state(
                    entry.name,
                    reverse,
                    entry.pool_block_capacity,
                    entry.pool_count_cap,
                    entry.state,
                ),
            );
        }
        let mut config = config;
        config.reverse = reverse;
        Ok(Manager {
            config,
            property_list,
            property_map,
            tokenizer,
            verbose: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropertyConfig;

    fn tokens(pairs: &[(&str, i32)]) -> Vec<WeightedToken> {
        pairs
            .iter()
            .map(|(text, weight)| WeightedToken::new(*text, *weight))
            .collect()
    }

    fn accept_all(_: DocId) -> bool {
        true
    }

    fn manager_with(properties: &[&str]) -> Manager {
        let config = Config {
            properties: properties
                .iter()
                .map(|name| PropertyConfig::new(*name, 4096))
                .collect(),
            ..Config::default()
        };
        Manager::new(config, None)
    }

    #[test]
    fn s1_single_property_query_sums_matching_terms_and_ranks_by_score() {
        let manager = manager_with(&["Title"]);
        manager
            .build_with_tokens(
                DocId::new(1),
                &vec![("Title".to_string(), tokens(&[("apple", 10)]))],
            )
            .unwrap();
        manager
            .build_with_tokens(
                DocId::new(2),
                &vec![("Title".to_string(), tokens(&[("apple", 5), ("banana", 7)]))],
            )
            .unwrap();

        let cancel = CancellationToken::new();
        let outcome = manager
            .search(
                None,
                &[("apple".to_string(), 1), ("banana".to_string(), 1)],
                &accept_all,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();

        let ids: Vec<u32> = outcome.hits.iter().map(|s| s.docid.0).collect();
        let scores: Vec<u32> = outcome.hits.iter().map(|s| s.score).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(scores, vec![12, 10]);
        assert!(outcome.property_errors.is_empty());
    }

    #[test]
    fn s2_filter_excludes_a_rejected_docid() {
        let manager = manager_with(&["Title"]);
        manager
            .build_with_tokens(
                DocId::new(1),
                &vec![("Title".to_string(), tokens(&[("apple", 10)]))],
            )
            .unwrap();
        manager
            .build_with_tokens(
                DocId::new(2),
                &vec![("Title".to_string(), tokens(&[("apple", 5), ("banana", 7)]))],
            )
            .unwrap();

        let cancel = CancellationToken::new();
        let outcome = manager
            .search(
                None,
                &[("apple".to_string(), 1), ("banana".to_string(), 1)],
                &|docid: DocId| docid.0 != 2,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();

        let ids: Vec<u32> = outcome.hits.iter().map(|s| s.docid.0).collect();
        let scores: Vec<u32> = outcome.hits.iter().map(|s| s.score).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(scores, vec![10]);
    }

    #[test]
    fn s3_merges_two_properties_preserving_docid_order_while_summing_scores() {
        let manager = manager_with(&["Title", "Body"]);
        manager
            .build_with_tokens(
                DocId::new(1),
                &vec![
                    ("Title".to_string(), tokens(&[("apple", 10)])),
                    ("Body".to_string(), tokens(&[("apple", 3)])),
                ],
            )
            .unwrap();
        manager
            .build_with_tokens(
                DocId::new(2),
                &vec![("Body".to_string(), tokens(&[("apple", 4)]))],
            )
            .unwrap();

        let cancel = CancellationToken::new();
        let outcome = manager
            .search(
                None,
                &[("apple".to_string(), 1)],
                &accept_all,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();

        let ids: Vec<u32> = outcome.hits.iter().map(|s| s.docid.0).collect();
        let scores: Vec<u32> = outcome.hits.iter().map(|s| s.score).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(scores, vec![13, 4]);
    }

    #[test]
    fn s5_out_of_order_append_is_rejected_and_earlier_data_survives() {
        let manager = manager_with(&["Title"]);
        manager
            .build_with_tokens(
                DocId::new(5),
                &vec![("Title".to_string(), tokens(&[("term", 1)]))],
            )
            .unwrap();
        let err = manager
            .build_with_tokens(
                DocId::new(3),
                &vec![("Title".to_string(), tokens(&[("term", 1)]))],
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfOrder);

        let cancel = CancellationToken::new();
        let outcome = manager
            .search(
                None,
                &[("term".to_string(), 1)],
                &accept_all,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].docid, DocId::new(5));
    }

    #[test]
    fn s6_search_output_is_identical_after_a_save_and_reopen_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.zmb");

        let manager = manager_with(&["Title"]);
        manager
            .build_with_tokens(
                DocId::new(1),
                &vec![("Title".to_string(), tokens(&[("apple", 10)]))],
            )
            .unwrap();
        manager
            .build_with_tokens(
                DocId::new(2),
                &vec![("Title".to_string(), tokens(&[("apple", 5), ("banana", 7)]))],
            )
            .unwrap();
        manager.save(&path).unwrap();

        let cancel = CancellationToken::new();
        let before = manager
            .search(
                None,
                &[("apple".to_string(), 1), ("banana".to_string(), 1)],
                &accept_all,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();

        let reopen_config = manager_with(&["Title"]).config;
        let reopened = Manager::open(reopen_config, None, &path).unwrap();
        let after = reopened
            .search(
                None,
                &[("apple".to_string(), 1), ("banana".to_string(), 1)],
                &accept_all,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();

        let before_pairs: Vec<(u32, u32)> =
            before.hits.iter().map(|s| (s.docid.0, s.score)).collect();
        let after_pairs: Vec<(u32, u32)> = after.hits.iter().map(|s| (s.docid.0, s.score)).collect();
        assert_eq!(before_pairs, after_pairs);
    }

    #[test]
    fn unknown_property_in_subset_is_recorded_but_does_not_abort_the_query() {
        let manager = manager_with(&["Title"]);
        manager
            .build_with_tokens(
                DocId::new(1),
                &vec![("Title".to_string(), tokens(&[("apple", 10)]))],
            )
            .unwrap();

        let cancel = CancellationToken::new();
        let outcome = manager
            .search(
                Some(&["Title".to_string(), "Missing".to_string()]),
                &[("apple".to_string(), 1)],
                &accept_all,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();

        let ids: Vec<u32> = outcome.hits.iter().map(|s| s.docid.0).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(outcome.property_errors.len(), 1);
        assert_eq!(outcome.property_errors[0].0, "Missing");
        assert_eq!(outcome.property_errors[0].1.kind, ErrorKind::UnknownProperty);
    }

    #[test]
    fn canceled_search_returns_an_error_instead_of_a_partial_result() {
        let manager = manager_with(&["Title"]);
        manager
            .build_with_tokens(
                DocId::new(1),
                &vec![("Title".to_string(), tokens(&[("apple", 10)]))],
            )
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = manager
            .search(
                None,
                &[("apple".to_string(), 1)],
                &accept_all,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Canceled);
    }

    #[test]
    fn score_saturates_to_u32_max_on_overflow_and_clamps_negative_to_zero() {
        let manager = manager_with(&["Title"]);
        manager
            .build_with_tokens(
                DocId::new(1),
                &vec![("Title".to_string(), tokens(&[("apple", i32::MAX)]))],
            )
            .unwrap();
        manager
            .build_with_tokens(
                DocId::new(2),
                &vec![("Title".to_string(), tokens(&[("apple", 5)]))],
            )
            .unwrap();

        let cancel = CancellationToken::new();

        // i32::MAX impact * i32::MAX weight overflows u32 but not i64, so
        // the accumulated i64 score is exact; only the final truncation
        // to u32 should saturate.
        let overflow = manager
            .search(
                None,
                &[("apple".to_string(), i32::MAX)],
                &|docid: DocId| docid.0 == 1,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();
        assert_eq!(overflow.hits.len(), 1);
        assert_eq!(overflow.hits[0].score, u32::MAX);

        // A negative query weight can drive the accumulated score below
        // zero; the public score is unsigned, so it clamps to zero
        // rather than wrapping.
        let negative = manager
            .search(
                None,
                &[("apple".to_string(), -1)],
                &|docid: DocId| docid.0 == 2,
                Algorithm::Svs,
                10,
                &cancel,
            )
            .unwrap();
        assert_eq!(negative.hits.len(), 1);
        assert_eq!(negative.hits[0].score, 0);
    }
}
