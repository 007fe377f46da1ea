//! MaxPref/HiFor evaluator: BTG layering first (as in
//! [`super::formulas_btg`]), then a classical skyline pass *within* each
//! rank group, so records tied on formula rank are refined down to the
//! maximal non-dominated subset before moving to the next rank (spec
//! §4.5's "hierarchical formula" strategy).

use super::{rank_records_by_btg, skyline_layers};
use crate::records::Record;
use crate::theory::Theory;
use std::collections::BTreeMap;

/// The non-dominated subset of the lowest-rank BTG group (spec §4.5), in
/// input order. Empty if `records` is empty.
pub fn best(theory: &Theory, records: &[Record]) -> Vec<Record> {
    let ranked = rank_records_by_btg(theory, records);
    let Some(min_rank) = ranked.iter().map(|(rank, _)| *rank).min() else {
        return Vec::new();
    };
    let group: Vec<Record> =
        ranked.into_iter().filter(|(rank, _)| *rank == min_rank).map(|(_, record)| record).collect();
    skyline_layers(theory, &group).into_iter().next().unwrap_or_default()
}

pub fn topk(theory: &Theory, records: &[Record], k: usize) -> Vec<Record> {
    let mut ranked = rank_records_by_btg(theory, records);
    ranked.sort_by_key(|(rank, _)| *rank);

    let mut groups: BTreeMap<usize, Vec<Record>> = BTreeMap::new();
    for (rank, record) in ranked {
        groups.entry(rank).or_default().push(record);
    }

    let mut out = Vec::with_capacity(k);
    for (_, group) in groups {
        for layer in skyline_layers(theory, &group) {
            for record in layer {
                if out.len() == k {
                    return out;
                }
                out.push(record);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::rule::Rule;
    use crate::value::Value;

    #[test]
    fn ties_within_a_rank_group_resolve_by_skyline() {
        let rule = Rule::from_ast(
            &RuleBuilder::new()
                .condition_eq("C", Value::Int(1))
                .best_eq("A", Value::Int(1))
                .worst_eq("A", Value::Int(2))
                .build(),
        )
        .unwrap();
        let theory = Theory::new(vec![rule]);

        let mut r1 = Record::new();
        r1.insert("A".to_string(), Value::Int(5));
        r1.insert("C".to_string(), Value::Int(9));
        let mut r2 = Record::new();
        r2.insert("A".to_string(), Value::Int(6));
        r2.insert("C".to_string(), Value::Int(9));

        let records = vec![r1.clone(), r2.clone()];
        let result = topk(&theory, &records, 2);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn best_returns_full_non_dominated_group() {
        let rule = Rule::from_ast(
            &RuleBuilder::new()
                .condition_eq("C", Value::Int(1))
                .best_eq("A", Value::Int(1))
                .worst_eq("A", Value::Int(2))
                .build(),
        )
        .unwrap();
        let theory = Theory::new(vec![rule]);

        let mut r1 = Record::new();
        r1.insert("A".to_string(), Value::Int(5));
        r1.insert("C".to_string(), Value::Int(9));
        let mut r2 = Record::new();
        r2.insert("A".to_string(), Value::Int(6));
        r2.insert("C".to_string(), Value::Int(9));

        let records = vec![r1.clone(), r2.clone()];
        let result = best(&theory, &records);
        assert_eq!(result.len(), 2);
        assert!(result.contains(&r1));
        assert!(result.contains(&r2));
    }
}
