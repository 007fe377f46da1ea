//! Extended partition (MaxPref) evaluator: the same bucket procedure as
//! [`super::partition`], but explicitly normalizes the rule set via
//! `split_rules` first (spec §4.5: "requires split_rules first"), so
//! every bucket's best/worst/incomparable three-way split happens over
//! already-disjoint intervals.

use super::partition_layers;
use crate::records::Record;
use crate::theory::Theory;

/// Every record that survives the bucket procedure's first pass over the
/// split theory -- the non-dominated "best" set (spec §4.5), in input order.
pub fn best(theory: &Theory, records: &[Record]) -> Vec<Record> {
    let split = Theory::new(theory.split_rules());
    let materialization = split.materialize();
    partition_layers(records, &materialization).into_iter().next().unwrap_or_default()
}

pub fn topk(theory: &Theory, records: &[Record], k: usize) -> Vec<Record> {
    let split = Theory::new(theory.split_rules());
    let materialization = split.materialize();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::AstPredicate;
    use crate::interval::CmpOp;
    use crate::rule::Rule;
    use crate::value::Value;

    #[test]
    fn direct_dominance_outranks_unrelated_record() {
        let rule = Rule::from_ast(
            &RuleBuilder::new().best_eq("A", Value::Int(1)).worst_eq("A", Value::Int(2)).build(),
        )
        .unwrap();
        let theory = Theory::new(vec![rule]);
        let mut r1 = Record::new();
        r1.insert("A".to_string(), Value::Int(1));
        let mut r2 = Record::new();
        r2.insert("A".to_string(), Value::Int(2));
        let records = vec![r2.clone(), r1.clone()];
        assert_eq!(best(&theory, &records), vec![r1]);
    }

    #[test]
    fn normalizes_not_equal_before_partitioning() {
        let rule = Rule::from_ast(
            &RuleBuilder::new()
                .best(AstPredicate::Comparison {
                    attribute: "A".to_string(),
                    op: CmpOp::Ne,
                    value: Value::Int(3),
                })
                .worst_eq("A", Value::Int(3))
                .build(),
        )
        .unwrap();
        let theory = Theory::new(vec![rule]);
        let mut r1 = Record::new();
        r1.insert("A".to_string(), Value::Int(1));
        let mut r2 = Record::new();
        r2.insert("A".to_string(), Value::Int(3));
        let records = vec![r2.clone(), r1.clone()];
        assert_eq!(best(&theory, &records), vec![r1]);
    }

    #[test]
    fn incomparable_records_are_kept() {
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
}
