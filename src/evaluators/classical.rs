//! Classical evaluator: the nested-loop skyline, direct from spec §4.5.
//! No rule splitting, no formula materialization -- every pairwise
//! dominance test goes straight through `Theory::dominates`'s
//! search-based algorithm (spec §4.4).

use super::skyline_layers;
use crate::records::Record;
use crate::theory::Theory;

/// Every record no other record dominates -- the non-dominated "best"
/// set (spec §4.5), in input order. Empty if `records` is empty.
pub fn best(theory: &Theory, records: &[Record]) -> Vec<Record> {
    skyline_layers(theory, records).into_iter().next().unwrap_or_default()
}

/// Up to `k` records in best-to-worst layer order, input order preserved
/// within a layer.
pub fn topk(theory: &Theory, records: &[Record], k: usize) -> Vec<Record> {
    let mut out = Vec::with_capacity(k);
    for layer in skyline_layers(theory, records) {
        for record in layer {
            if out.len() == k {
                return out;
            }
            out.push(record);
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

    fn theory_a_prefers_low() -> Theory {
        let rule = Rule::from_ast(
            &RuleBuilder::new().best_eq("A", Value::Int(1)).worst_eq("A", Value::Int(2)).build(),
        )
        .unwrap();
        Theory::new(vec![rule])
    }

    fn record(a: i64) -> Record {
        let mut r = Record::new();
        r.insert("A".to_string(), Value::Int(a));
        r
    }

    #[test]
    fn best_picks_preferred_value() {
        let theory = theory_a_prefers_low();
        let records = vec![record(2), record(1)];
        assert_eq!(best(&theory, &records), vec![record(1)]);
    }

    #[test]
    fn best_returns_full_non_dominated_set() {
        let theory = theory_a_prefers_low();
        // Two records sharing the best value, plus an unrelated attribute
        // that isn't mentioned in the indifferent set but is equal across
        // both, so the rule still applies to both pairs.
        let mut r1 = record(1);
        r1.insert("B".to_string(), Value::Int(1));
        let mut r2 = record(1);
        r2.insert("B".to_string(), Value::Int(2));
        let mut r3 = record(2);
        r3.insert("B".to_string(), Value::Int(1));
        let records = vec![r1.clone(), r3, r2.clone()];
        assert_eq!(best(&theory, &records), vec![r1, r2]);
    }

    #[test]
    fn topk_orders_layers() {
        let theory = theory_a_prefers_low();
        let records = vec![record(2), record(1), record(3)];
        let top = topk(&theory, &records, 3);
        assert_eq!(top[0], record(1));
    }

    #[test]
    fn empty_input_yields_empty_best() {
        let theory = theory_a_prefers_low();
        assert_eq!(best(&theory, &[]), Vec::<Record>::new());
    }
}
