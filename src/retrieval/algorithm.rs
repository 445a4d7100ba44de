/// Selector for which retrieval strategy scores a property's postings.
/// `Svs` is the default and the only one guaranteed fully general;
/// the rest are documented variants that must agree with it on top-k
/// membership for disjunctive queries, `BwandAnd` excepted (it is
/// explicitly conjunctive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Svs,
    BwandOr,
    BwandAnd,
    Wand,
    Mbwand,
}
