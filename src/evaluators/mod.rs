//! # Evaluators
//!
//! Five strategies for answering "which records are most preferred"
//! (spec §4.5), all built from the same [`crate::theory::Theory`]
//! primitives but trading completeness of derivation for evaluation cost:
//!
//! - [`classical`]: pairwise `Theory::dominates` nested-loop skyline.
//! - [`partition`]: for each derived `Comparison`, hash records by the
//!   attributes outside that comparison's indifferent set and drop worst
//!   matches from any bucket that also holds a best match (spec §4.5).
//!   Operates on `theory.materialize()` as given -- it does not force
//!   `split_rules` itself.
//! - [`extended_partition`]: the MaxPref three-way variant of the same
//!   bucket procedure; it explicitly normalizes via `split_rules` first
//!   (spec §4.5: "requires split_rules first") so the per-bucket
//!   best/worst/incomparable split never straddles an overlapping
//!   interval pair.
//! - [`formulas_btg`]: ranks records by Better-Than-Graph topological
//!   layer -- the fully transitively-closed, essentiality-pruned ordering.
//! - [`maxpref`]: BTG layering first, then a classical skyline pass
//!   *within* each rank group, so ties inside a layer are resolved down
//!   to the maximal non-dominated subset (the "HiFor" hierarchical
//!   formula strategy).
//!
//! All five return records in input order among ties, per spec §9.

pub mod classical;
pub mod extended_partition;
pub mod formulas_btg;
pub mod maxpref;
pub mod partition;

use crate::formula::{record_satisfies_formula, Comparison, Formula};
use crate::records::Record;
use crate::theory::{Materialization, Theory};
use std::collections::{BTreeSet, HashMap};

/// Peel dominance layers off `records` using `theory.dominates`: layer 0
/// is every record no other record dominates, layer 1 is every record
/// dominated only by something in layer 0, and so on. This is the
/// classical nested-loop skyline (spec §4.5).
pub(crate) fn skyline_layers(theory: &Theory, records: &[Record]) -> Vec<Vec<Record>> {
    let mut remaining: Vec<Record> = records.to_vec();
    let mut layers = Vec::new();
    while !remaining.is_empty() {
        let mut dominated = vec![false; remaining.len()];
        for i in 0..remaining.len() {
            for j in 0..remaining.len() {
                if i != j && theory.dominates(&remaining[j], &remaining[i]) {
                    dominated[i] = true;
                    break;
                }
            }
        }
        let mut layer = Vec::new();
        let mut next_remaining = Vec::new();
        for (idx, record) in remaining.into_iter().enumerate() {
            if dominated[idx] {
                next_remaining.push(record);
            } else {
                layer.push(record);
            }
        }
        if layer.is_empty() {
            // Only reachable if `theory` is inconsistent (a genuine cycle
            // among these records) -- dump the rest as a final layer
            // instead of looping forever.
            layers.push(next_remaining);
            break;
        }
        layers.push(layer);
        remaining = next_remaining;
    }
    layers
}

/// For each record, the lowest (best) BTG rank among the formulas it
/// satisfies, from `theory.split_rules()`'s preference list. Records that
/// satisfy no formula rank last (`usize::MAX`).
pub(crate) fn rank_records_by_btg(theory: &Theory, records: &[Record]) -> Vec<(usize, Record)> {
    let split = Theory::new(theory.split_rules());
    let preference_list = split.get_preference_list();
    records
        .iter()
        .map(|record| {
            let rank = preference_list
                .iter()
                .filter(|(_, formula)| record_satisfies_formula(record, formula))
                .map(|(rank, _)| *rank)
                .min()
                .unwrap_or(usize::MAX);
            (rank, record.clone())
        })
        .collect()
}

/// Bucket-partition dominance layers (spec §4.5's "partition" algorithm,
/// shared by [`partition`] and [`extended_partition`]): for each
/// `Comparison`, hash `records` by every attribute outside that
/// comparison's indifferent set, then within each bucket drop any record
/// matching the worst formula if the same bucket holds a record matching
/// the best formula. Repeating on the residual dominated records (rather
/// than stopping after one pass) is the "top-k" extension spec §4.5
/// describes; `materialization` is supplied by the caller since plain
/// `partition` and `extended_partition` differ only in whether they
/// normalize via `split_rules` first.
pub(crate) fn partition_layers(records: &[Record], materialization: &Materialization) -> Vec<Vec<Record>> {
    let Materialization { formulas, comparisons } = materialization;
    let mut remaining: Vec<Record> = records.to_vec();
    let mut layers = Vec::new();
    while !remaining.is_empty() {
        let dominated = mark_dominated_by_buckets(&remaining, formulas, comparisons);
        let mut layer = Vec::new();
        let mut next_remaining = Vec::new();
        for (idx, record) in remaining.into_iter().enumerate() {
            if dominated[idx] {
                next_remaining.push(record);
            } else {
                layer.push(record);
            }
        }
        if layer.is_empty() {
            // Only reachable if `theory` is inconsistent -- dump the rest
            // as a final layer instead of looping forever.
            layers.push(next_remaining);
            break;
        }
        layers.push(layer);
        remaining = next_remaining;
    }
    layers
}

fn mark_dominated_by_buckets(
    records: &[Record],
    formulas: &[Formula],
    comparisons: &[Comparison],
) -> Vec<bool> {
    let mut dominated = vec![false; records.len()];
    for comparison in comparisons {
        let best_formula = &formulas[comparison.best];
        let worst_formula = &formulas[comparison.worst];
        let exempt = pivot_attributes(best_formula, worst_formula, &comparison.indifferent);
        let mut buckets: HashMap<String, (Vec<usize>, Vec<usize>)> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            let key = bucket_key(record, &exempt);
            let entry = buckets.entry(key).or_default();
            if record_satisfies_formula(record, best_formula) {
                entry.0.push(idx);
            } else if record_satisfies_formula(record, worst_formula) {
                entry.1.push(idx);
            }
            // Neither best nor worst: the indifferent remainder, left
            // untouched in its bucket (spec §4.5's "incomparable" group).
        }
        for (best_hits, worst_hits) in buckets.into_values() {
            if !best_hits.is_empty() {
                for idx in worst_hits {
                    dominated[idx] = true;
                }
            }
        }
    }
    dominated
}

/// Attributes a bucket must ignore when grouping records under a given
/// comparison: the comparison's declared indifferent set, plus every
/// attribute the best/worst formulas actually disagree on (the
/// "deciding" attributes a record's best/worst classification hinges
/// on -- these can never be part of the ceteris-paribus equality test,
/// the same exemption `Rule::dominates` grants its own preference
/// attribute).
fn pivot_attributes(best: &Formula, worst: &Formula, indifferent: &BTreeSet<String>) -> BTreeSet<String> {
    let mut exempt = indifferent.clone();
    for attribute in best.keys().chain(worst.keys()) {
        if best.get(attribute) != worst.get(attribute) {
            exempt.insert(attribute.clone());
        }
    }
    exempt
}

fn bucket_key(record: &Record, exempt: &BTreeSet<String>) -> String {
    record
        .iter()
        .filter(|(attribute, _)| !exempt.contains(*attribute))
        .map(|(attribute, value)| format!("{attribute}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
