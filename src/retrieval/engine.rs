use crate::cancel::CancellationToken;
use crate::error::{Error, ErrorKind, Result};
use crate::posting::PostingCursor;
use crate::retrieval::algorithm::Algorithm;
use crate::retrieval::heap::{Scored, TopKHeap};
use crate::types::{DocId, QueryWeight};

/// Document filter applied before a candidate enters the top-k heap. A
/// docid rejected by the filter never appears in the output, but its
/// contributing cursors still advance past it.
pub type Filter<'a> = dyn Fn(DocId) -> bool + 'a;

fn canceled() -> Error {
    Error::new(ErrorKind::Canceled, "search canceled")
}

/// Dispatches to the selected algorithm. A tagged enum rather than a
/// trait object so the hot SVS loop monomorphizes instead of going
/// through a vtable. A canceled scan returns `Err(ErrorKind::Canceled)`
/// rather than whatever partial heap was accumulated so far, per the
/// "cancel yields an empty result" contract.
pub fn execute(
    algorithm: Algorithm,
    cursors: Vec<(PostingCursor<'_>, QueryWeight)>,
    filter: &Filter<'_>,
    top_k: usize,
    reverse: bool,
    cancel: &CancellationToken,
) -> Result<Vec<Scored>> {
    match algorithm {
        Algorithm::Svs => svs(cursors, filter, top_k, reverse, cancel),
        Algorithm::BwandOr => bounded_or(cursors, filter, top_k, reverse, cancel, false),
        Algorithm::Mbwand => bounded_or(cursors, filter, top_k, reverse, cancel, true),
        Algorithm::BwandAnd => bwand_and(cursors, filter, top_k, reverse, cancel),
        Algorithm::Wand => wand(cursors, filter, top_k, reverse, cancel),
    }
}

fn ahead(a: DocId, b: DocId, reverse: bool) -> bool {
    if reverse {
        a > b
    } else {
        a < b
    }
}

fn frontier(cursors: &[(PostingCursor<'_>, QueryWeight)], reverse: bool) -> Option<DocId> {
    let mut best: Option<DocId> = None;
    for (cursor, _) in cursors {
        if let Some(docid) = cursor.current_docid() {
            best = match best {
                None => Some(docid),
                Some(b) if ahead(docid, b, reverse) => Some(docid),
                Some(b) => Some(b),
            };
        }
    }
    best
}

/// Canonical disjunctive scan: visit docids in traversal order, summing
/// every live cursor currently sitting on the candidate.
fn svs(
    mut cursors: Vec<(PostingCursor<'_>, QueryWeight)>,
    filter: &Filter<'_>,
    top_k: usize,
    reverse: bool,
    cancel: &CancellationToken,
) -> Result<Vec<Scored>> {
    let mut heap = TopKHeap::new(top_k);
    while let Some(target) = frontier(&cursors, reverse) {
        if cancel.is_canceled() {
            return Err(canceled());
        }
        let mut score: i64 = 0;
        for (cursor, weight) in cursors.iter_mut() {
            if cursor.current_docid() == Some(target) {
                let (_, impact) = cursor.current().unwrap();
                score += impact as i64 * *weight as i64;
                cursor.advance();
            }
        }
        if filter(target) {
            heap.offer(target, score);
        }
    }
    Ok(heap.into_sorted_vec(reverse))
}

fn upper_bound_total(cursors: &[(PostingCursor<'_>, QueryWeight)]) -> i64 {
    cursors
        .iter()
        .filter_map(|(cursor, weight)| {
            cursor
                .current_block_max_impact()
                .map(|max_impact| max_impact as i64 * *weight as i64)
        })
        .sum()
}

/// `BwandOr`/`Mbwand`: same candidate order as `svs`, but a candidate
/// whose contributing cursors' cached block-max impacts can't clear the
/// current top-k threshold is skipped without a real accumulation.
/// `global_termination` additionally lets the whole scan stop the moment
/// the summed upper bound across *every* live cursor can no longer clear
/// the threshold -- the extra guarantee `Mbwand` adds over `BwandOr`.
fn bounded_or(
    mut cursors: Vec<(PostingCursor<'_>, QueryWeight)>,
    filter: &Filter<'_>,
    top_k: usize,
    reverse: bool,
    cancel: &CancellationToken,
    global_termination: bool,
) -> Result<Vec<Scored>> {
    let mut heap = TopKHeap::new(top_k);
    while let Some(target) = frontier(&cursors, reverse) {
        if cancel.is_canceled() {
            return Err(canceled());
        }
        if global_termination && heap.is_full() && upper_bound_total(&cursors) <= heap.threshold() {
            break;
        }

        let contributing: Vec<usize> = (0..cursors.len())
            .filter(|&i| cursors[i].0.current_docid() == Some(target))
            .collect();

        let bound: i64 = contributing
            .iter()
            .map(|&i| {
                cursors[i].0.current_block_max_impact().unwrap_or(0) as i64 * cursors[i].1 as i64
            })
            .sum();

        if heap.is_full() && bound <= heap.threshold() {
            for &i in &contributing {
                cursors[i].0.advance();
            }
            continue;
        }

        let mut score: i64 = 0;
        for &i in &contributing {
            let (_, impact) = cursors[i].0.current().unwrap();
            score += impact as i64 * cursors[i].1 as i64;
            cursors[i].0.advance();
        }
        if filter(target) {
            heap.offer(target, score);
        }
    }
    Ok(heap.into_sorted_vec(reverse))
}

/// Conjunctive scan: a candidate only qualifies once every cursor sits on
/// it. Rotates through cursors advancing each to the current target
/// (classic "small-vs-small" set intersection) until all agree, or any
/// cursor exhausts.
fn bwand_and(
    mut cursors: Vec<(PostingCursor<'_>, QueryWeight)>,
    filter: &Filter<'_>,
    top_k: usize,
    reverse: bool,
    cancel: &CancellationToken,
) -> Result<Vec<Scored>> {
    let mut heap = TopKHeap::new(top_k);
    if cursors.is_empty() {
        return Ok(heap.into_sorted_vec(reverse));
    }
    let n = cursors.len();
    'outer: loop {
        if cancel.is_canceled() {
            return Err(canceled());
        }
        let mut target = match cursors[0].0.current_docid() {
            Some(d) => d,
            None => break,
        };
        let mut matched = 1usize;
        let mut idx = 1usize % n;
        while matched < n {
            cursors[idx].0.advance_to(target, reverse);
            match cursors[idx].0.current_docid() {
                None => break 'outer,
                Some(d) if d == target => matched += 1,
                Some(d) => {
                    target = d;
                    matched = 1;
                }
            }
            idx = (idx + 1) % n;
        }

        let mut score: i64 = 0;
        for (cursor, weight) in cursors.iter_mut() {
            let (_, impact) = cursor.current().unwrap();
            score += impact as i64 * *weight as i64;
            cursor.advance();
        }
        if filter(target) {
            heap.offer(target, score);
        }
    }
    Ok(heap.into_sorted_vec(reverse))
}

/// Threshold/pivot traversal: cursors are ordered by current docid, a
/// pivot is the first one whose cumulative block-max upper bound could
/// clear the running threshold. If the leading cursor already sits on
/// the pivot docid every contributing cursor is scored exactly as in
/// `svs`; otherwise the leader is skipped forward to the pivot.
fn wand(
    mut cursors: Vec<(PostingCursor<'_>, QueryWeight)>,
    filter: &Filter<'_>,
    top_k: usize,
    reverse: bool,
    cancel: &CancellationToken,
) -> Result<Vec<Scored>> {
    let mut heap = TopKHeap::new(top_k);
    loop {
        if cancel.is_canceled() {
            return Err(canceled());
        }
        let mut order: Vec<usize> = (0..cursors.len())
            .filter(|&i| cursors[i].0.current_docid().is_some())
            .collect();
        if order.is_empty() {
            break;
        }
        order.sort_by(|&a, &b| {
            let da = cursors[a].0.current_docid().unwrap();
            let db = cursors[b].0.current_docid().unwrap();
            if reverse {
                db.cmp(&da)
            } else {
                da.cmp(&db)
            }
        });

        let threshold = heap.threshold();
        let mut cumulative: i64 = 0;
        let mut pivot_pos = None;
        for (pos, &i) in order.iter().enumerate() {
            let max_impact = cursors[i].0.current_block_max_impact().unwrap_or(0);
            cumulative += max_impact as i64 * cursors[i].1 as i64;
            if cumulative > threshold {
                pivot_pos = Some(pos);
                break;
            }
        }
        let pivot_pos = match pivot_pos {
            Some(p) => p,
            None => break,
        };
        let pivot_docid = cursors[order[pivot_pos]].0.current_docid().unwrap();
        let leader_docid = cursors[order[0]].0.current_docid().unwrap();

        if leader_docid == pivot_docid {
            let mut score: i64 = 0;
            for &i in &order {
                if cursors[i].0.current_docid() == Some(pivot_docid) {
                    let (_, impact) = cursors[i].0.current().unwrap();
                    score += impact as i64 * cursors[i].1 as i64;
                    cursors[i].0.advance();
                }
            }
            if filter(pivot_docid) {
                heap.offer(pivot_docid, score);
            }
        } else {
            cursors[order[0]].0.advance_to(pivot_docid, reverse);
        }
    }
    Ok(heap.into_sorted_vec(reverse))
}
