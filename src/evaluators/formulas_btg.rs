//! Formulas/BTG evaluator: ranks records by their best (lowest)
//! topological layer in the fully materialized Better-Than-Graph (spec
//! §4.4/§4.5) -- the most complete derivation of the five strategies,
//! since it includes transitive comparisons and essentiality pruning
//! that [`super::extended_partition`] skips.

use super::rank_records_by_btg;
use crate::records::Record;
use crate::theory::Theory;

/// Every record sharing the lowest BTG rank -- the non-dominated "best"
/// set (spec §4.5), in input order.
pub fn best(theory: &Theory, records: &[Record]) -> Vec<Record> {
    let ranked = rank_records_by_btg(theory, records);
    let Some(min_rank) = ranked.iter().map(|(rank, _)| *rank).min() else {
        return Vec::new();
    };
    ranked.into_iter().filter(|(rank, _)| *rank == min_rank).map(|(_, record)| record).collect()
}

pub fn topk(theory: &Theory, records: &[Record], k: usize) -> Vec<Record> {
    let mut ranked = rank_records_by_btg(theory, records);
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().take(k).map(|(_, record)| record).collect()
}
