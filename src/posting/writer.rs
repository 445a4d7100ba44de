use crate::dictionary::TermDictionary;
use crate::error::{Error, ErrorKind, Result};
use crate::pool::SegmentPool;
use crate::types::{DocId, Impact, Term};

/// Appends one `(term, docid, impact)` contribution to a property.
///
/// Enforces the property's monotonicity direction (`reverse`): a docid
/// equal to the previous one for this term is additive (impacts sum,
/// invariant 2), a docid moving the wrong way is `ErrorKind::OutOfOrder`
/// and the append is refused -- the caller's document is dropped but
/// everything appended before it stands.
///
/// Rolls over to a fresh `SegmentPool` when the current tail pool is
/// full, up to `pool_count_cap`; beyond that the property goes
/// read-only and further appends fail with `PoolsExhausted`.
pub fn append(
    dictionary: &mut TermDictionary,
    pools: &mut Vec<SegmentPool>,
    pool_capacity: usize,
    pool_count_cap: u32,
    term: Term,
    docid: DocId,
    impact: Impact,
    reverse: bool,
) -> Result<()> {
    if pools.is_empty() {
        pools.push(SegmentPool::new(pool_capacity));
    }

    let tail = dictionary.get(term).map(|entry| entry.tail);

    if let Some(entry) = dictionary.get(term) {
        if let Some(last) = entry.last_docid {
            let in_order = if reverse { docid <= last } else { docid >= last };
            if !in_order {
                return Err(Error::new(
                    ErrorKind::OutOfOrder,
                    format!("docid {:?} violates monotonicity after {:?}", docid, last),
                ));
            }
            if docid == last {
                let loc = entry.tail;
                let block = pools[loc.pool as usize].block_mut(loc.offset);
                if let Some(last_idx) = block.len().checked_sub(1) {
                    block.impacts[last_idx] = block.impacts[last_idx].saturating_add(impact);
                    if block.impacts[last_idx] > block.max_impact {
                        block.max_impact = block.impacts[last_idx];
                    }
                }
                dictionary.get_mut(term).unwrap().total += 1;
                return Ok(());
            }
        }
    }

    let mut pool_index = (pools.len() - 1) as u32;
    loop {
        match pools[pool_index as usize].append(tail, pool_index, docid, impact) {
            Ok(loc) => {
                let entry = dictionary.entry_or_insert(term, loc);
                entry.tail = loc;
                entry.total += 1;
                entry.last_docid = Some(docid);
                return Ok(());
            }
            Err(err) if err.kind == ErrorKind::PoolsExhausted => {
                if pools.len() as u32 >= pool_count_cap {
                    return Err(err);
                }
                pools.push(SegmentPool::new(pool_capacity));
                pool_index = (pools.len() - 1) as u32;
            }
            Err(err) => return Err(err),
        }
    }
}
