//! End-to-end scenarios exercising the full pipeline: rule text in,
//! ranked records out, across every evaluation strategy.

use cp_engine::records::Record;
use cp_engine::theory::Theory;
use cp_engine::value::Value;
use cp_engine::{
    classical_best, classical_topk, extended_partition_best, formulas_best, maxpref_best,
    parser, partition_best,
};

fn theory_from(text: &str) -> Theory {
    let ast = parser::parse_theory(text).expect("theory should parse");
    Theory::from_ast(&ast).expect("rules should build")
}

fn record(pairs: &[(&str, Value)]) -> Record {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn all_evaluators_best(theory: &Theory, records: &[Record]) -> Vec<Vec<Record>> {
    vec![
        classical_best(theory, records).unwrap(),
        partition_best(theory, records).unwrap(),
        extended_partition_best(theory, records).unwrap(),
        formulas_best(theory, records).unwrap(),
        maxpref_best(theory, records).unwrap(),
    ]
}

/// S1: a single rule over one attribute; best is every record carrying
/// the preferred value, regardless of the other attribute.
#[test]
fn s1_simple_rule_returns_every_tied_winner() {
    let theory = theory_from("A=1 BETTER A=2");
    let records = vec![
        record(&[("A", Value::Int(1)), ("B", Value::Int(1))]),
        record(&[("A", Value::Int(2)), ("B", Value::Int(1))]),
        record(&[("A", Value::Int(1)), ("B", Value::Int(2))]),
    ];
    let expected = vec![
        record(&[("A", Value::Int(1)), ("B", Value::Int(1))]),
        record(&[("A", Value::Int(1)), ("B", Value::Int(2))]),
    ];
    for best in all_evaluators_best(&theory, &records) {
        assert_eq!(best, expected);
    }
}

/// S2: two conditional rules whose conditions partition the record space.
#[test]
fn s2_conditional_rules_each_apply_within_their_condition() {
    let theory = theory_from("IF B=1 THEN A=1 BETTER A=2 AND IF B=2 THEN A=2 BETTER A=1");
    let records = vec![
        record(&[("A", Value::Int(1)), ("B", Value::Int(1))]),
        record(&[("A", Value::Int(2)), ("B", Value::Int(1))]),
        record(&[("A", Value::Int(1)), ("B", Value::Int(2))]),
        record(&[("A", Value::Int(2)), ("B", Value::Int(2))]),
    ];
    let expected = vec![
        record(&[("A", Value::Int(1)), ("B", Value::Int(1))]),
        record(&[("A", Value::Int(2)), ("B", Value::Int(2))]),
    ];
    for best in all_evaluators_best(&theory, &records) {
        assert_eq!(best, expected);
    }
}

/// S3: a range preference with an indifferent attribute; best is the
/// two records under the threshold, and `topk(1)` keeps only the first
/// of those by input order.
#[test]
fn s3_range_preference_with_indifferent_attribute() {
    let theory = theory_from("A<5 BETTER A>=5 [B]");
    let records = vec![
        record(&[("A", Value::Int(3)), ("B", Value::Int(7))]),
        record(&[("A", Value::Int(4)), ("B", Value::Int(9))]),
        record(&[("A", Value::Int(8)), ("B", Value::Int(7))]),
    ];
    let expected = vec![
        record(&[("A", Value::Int(3)), ("B", Value::Int(7))]),
        record(&[("A", Value::Int(4)), ("B", Value::Int(9))]),
    ];
    for best in all_evaluators_best(&theory, &records) {
        assert_eq!(best, expected);
    }

    let top1 = classical_topk(&theory, &records, 1).unwrap();
    assert_eq!(top1, vec![record(&[("A", Value::Int(3)), ("B", Value::Int(7))])]);
}

/// S4: a disequality rule splits into two disjoint best ranges; the
/// excluded point loses to everything else once split.
#[test]
fn s4_disequality_rule_splits_and_excludes_its_point() {
    let theory = theory_from("A<>3 BETTER A=3");
    let split = theory.split_rules();
    assert!(split.len() >= 2);

    let records = vec![
        record(&[("A", Value::Int(3))]),
        record(&[("A", Value::Int(1))]),
        record(&[("A", Value::Int(5))]),
    ];
    let best = classical_best(&theory, &records).unwrap();
    assert!(!best.contains(&record(&[("A", Value::Int(3))])));
    assert!(best.contains(&record(&[("A", Value::Int(1))])));
    assert!(best.contains(&record(&[("A", Value::Int(5))])));
}

/// S5: a theory with a two-cycle is inconsistent; every evaluator must
/// refuse to rank rather than silently pick an arbitrary order.
#[test]
fn s5_inconsistent_theory_is_rejected_by_every_evaluator() {
    let theory = theory_from("A>1 BETTER A<1 AND A<1 BETTER A>1");
    assert!(!theory.is_consistent());

    let records = vec![record(&[("A", Value::Int(2))])];
    assert!(classical_best(&theory, &records).is_err());
    assert!(partition_best(&theory, &records).is_err());
    assert!(extended_partition_best(&theory, &records).is_err());
    assert!(formulas_best(&theory, &records).is_err());
    assert!(maxpref_best(&theory, &records).is_err());
}

/// S6: a chain of three strict preferences lays out three singleton
/// layers in order.
#[test]
fn s6_layered_chain_orders_topk_by_rank() {
    let theory = theory_from("A=1 BETTER A=2 AND A=2 BETTER A=3");
    let records =
        vec![record(&[("A", Value::Int(1))]), record(&[("A", Value::Int(2))]), record(&[("A", Value::Int(3))])];
    let top = classical_topk(&theory, &records, 3).unwrap();
    assert_eq!(top, records);
}
