use crate::cancel::CancellationToken;
use crate::error::{Error, ErrorKind, Result};
use crate::retrieval::Scored;
use crate::types::DocId;

/// Combines one result list per searched property into a single list,
/// summing scores for a docid present in more than one property while
/// preserving docid order (never score order). Each input list must
/// already be sorted in docid order -- ascending for a forward property,
/// descending when `reverse` is set.
///
/// Once every list but one is exhausted, that last list's remaining tail
/// is spliced onto the output as-is (the resolved behavior for what
/// happens to the final surviving list, matching the reference merge).
///
/// `cancel` is checked once per merge step; a canceled merge returns
/// `Err(ErrorKind::Canceled)` rather than whatever output was merged so
/// far.
pub fn merge(lists: Vec<Vec<Scored>>, reverse: bool, cancel: &CancellationToken) -> Result<Vec<Scored>> {
    let lists: Vec<Vec<Scored>> = lists.into_iter().filter(|l| !l.is_empty()).collect();
    let mut positions = vec![0usize; lists.len()];
    let mut active: Vec<usize> = (0..lists.len()).collect();
    let mut output = Vec::new();

    while active.len() > 1 {
        if cancel.is_canceled() {
            return Err(Error::new(ErrorKind::Canceled, "merge canceled"));
        }
        let extreme = extreme_docid(&lists, &positions, &active, reverse);

        let mut score: i64 = 0;
        let mut next_active = Vec::with_capacity(active.len());
        for &li in &active {
            if lists[li][positions[li]].docid == extreme {
                score += lists[li][positions[li]].score;
                positions[li] += 1;
                if positions[li] < lists[li].len() {
                    next_active.push(li);
                }
            } else {
                next_active.push(li);
            }
        }
        output.push(Scored {
            docid: extreme,
            score,
        });
        active = next_active;
    }

    if let Some(&li) = active.first() {
        output.extend_from_slice(&lists[li][positions[li]..]);
    }

    Ok(output)
}

fn extreme_docid(
    lists: &[Vec<Scored>],
    positions: &[usize],
    active: &[usize],
    reverse: bool,
) -> DocId {
    let mut extreme: Option<DocId> = None;
    for &li in active {
        let docid = lists[li][positions[li]].docid;
        extreme = match extreme {
            None => Some(docid),
            Some(e) if (reverse && docid > e) || (!reverse && docid < e) => Some(docid),
            Some(e) => Some(e),
        };
    }
    extreme.expect("extreme_docid is only called with a non-empty active set")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(docid: u32, score: i64) -> Scored {
        Scored {
            docid: DocId::new(docid),
            score,
        }
    }

    #[test]
    fn sums_scores_at_matching_docids_and_preserves_order() {
        let a = vec![s(1, 5), s(3, 2), s(7, 1)];
        let b = vec![s(3, 4), s(5, 9)];
        let merged = merge(vec![a, b], false, &CancellationToken::new()).unwrap();
        let ids: Vec<u32> = merged.iter().map(|s| s.docid.0).collect();
        assert_eq!(ids, vec![1, 3, 5, 7]);
        assert_eq!(merged[1].score, 6);
    }

    #[test]
    fn single_property_splices_through_unchanged() {
        let a = vec![s(4, 2), s(8, 1)];
        let merged = merge(vec![a.clone()], false, &CancellationToken::new()).unwrap();
        assert_eq!(merged, a);
    }

    #[test]
    fn exhausting_all_but_one_list_splices_its_tail() {
        let a = vec![s(1, 1), s(2, 1), s(3, 1)];
        let b = vec![s(1, 1)];
        let merged = merge(vec![a, b], false, &CancellationToken::new()).unwrap();
        let ids: Vec<u32> = merged.iter().map(|s| s.docid.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn reverse_merge_walks_descending_docids() {
        let a = vec![s(9, 1), s(5, 1), s(2, 1)];
        let b = vec![s(7, 1), s(2, 1)];
        let merged = merge(vec![a, b], true, &CancellationToken::new()).unwrap();
        let ids: Vec<u32> = merged.iter().map(|s| s.docid.0).collect();
        assert_eq!(ids, vec![9, 7, 5, 2]);
        assert_eq!(merged.last().unwrap().score, 2);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge(Vec::new(), false, &CancellationToken::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn canceled_token_aborts_a_multi_list_merge() {
        let a = vec![s(1, 1), s(2, 1)];
        let b = vec![s(1, 1), s(3, 1)];
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = merge(vec![a, b], false, &cancel).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Canceled);
    }
}
