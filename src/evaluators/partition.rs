//! Partition evaluator: the literal bucket procedure from spec §4.5 --
//! for each derived `Comparison`, hash records by the attributes outside
//! its indifferent set, and drop worst matches from any bucket that also
//! holds a best match. Works over `theory.materialize()` as given; unlike
//! [`super::extended_partition`] it does not force `split_rules` first.

use super::partition_layers;
use crate::records::Record;
use crate::theory::Theory;

/// Every record that survives the bucket procedure's first pass -- the
/// non-dominated "best" set (spec §4.5), in input order.
pub fn best(theory: &Theory, records: &[Record]) -> Vec<Record> {
    let materialization = theory.materialize();
    partition_layers(records, &materialization).into_iter().next().unwrap_or_default()
}

pub fn topk(theory: &Theory, records: &[Record], k: usize) -> Vec<Record> {
    let materialization = theory.materialize();
    let mut out = Vec::with_capacity(k);
    for layer in partition_layers(records, &materialization) {
        for record in layer {
            if out.len() == k {
                return out;
            }
            out.push(record);
        }
    }
    out
}
