//! Property-based tests for the algebraic laws and cross-evaluator
//! guarantees a conditional-preference engine must uphold regardless of
//! which concrete theory or record batch it is fed.

use cp_engine::interval::{self, Interval};
use cp_engine::records::Record;
use cp_engine::theory::Theory;
use cp_engine::value::Value;
use cp_engine::{classical_best, classical_topk, parser};
use proptest::prelude::*;

fn any_interval() -> impl Strategy<Value = Interval> {
    (any::<i16>(), 0u8..5).prop_map(|(n, kind)| {
        let v = Value::Int(n as i64);
        match kind {
            0 => Interval::equal(v),
            1 => Interval::not_equal(v),
            2 => Interval::less_than(v),
            3 => Interval::greater_than(v),
            _ => Interval::greater_equal(v),
        }
    })
}

proptest! {
    /// Property 2: overlap is symmetric for any pair of intervals.
    #[test]
    fn overlap_symmetry(a in any_interval(), b in any_interval()) {
        prop_assert_eq!(interval::intersect(&a, &b), interval::intersect(&b, &a));
    }

    /// Property 1: splitting a disequality yields two intervals whose
    /// union is the domain minus the point and whose intersection is empty.
    #[test]
    fn split_neq_disjoint_and_excludes_point(n in any::<i16>()) {
        let v = Value::Int(n as i64);
        let parts = interval::split_neq(&Interval::not_equal(v.clone()));
        prop_assert_eq!(parts.len(), 2);
        prop_assert!(!interval::intersect(&parts[0], &parts[1]));
        prop_assert!(!interval::intersect(&parts[0], &v));
        prop_assert!(!interval::intersect(&parts[1], &v));
    }

    /// Property 3: for an overlapping pair, split_interval returns
    /// pairwise non-overlapping pieces that jointly cover every point `s`
    /// covers.
    #[test]
    fn split_interval_is_disjoint(n in any::<i16>(), cut in any::<i16>()) {
        let s = Interval::less_than(Value::Int(n as i64));
        let f = Interval::equal(Value::Int(cut as i64));
        prop_assume!(interval::intersect(&s, &f));
        let parts = interval::split_interval(&s, &f);
        for i in 0..parts.len() {
            for j in (i + 1)..parts.len() {
                prop_assert!(!interval::intersect(&parts[i], &parts[j]));
            }
        }
        for probe in [n as i64 - 50, cut as i64, n as i64 - 1] {
            if interval::intersect(&s, &Value::Int(probe)) {
                prop_assert!(parts.iter().any(|p| interval::intersect(p, &Value::Int(probe))));
            }
        }
    }

    /// Property 4: running split_rules twice in succession is idempotent.
    #[test]
    fn split_rules_is_idempotent(n in 1i64..100) {
        let theory = theory_from(&format!("A<>{n} BETTER A={n}"));
        let once = Theory::new(theory.split_rules());
        let twice = Theory::new(once.split_rules());
        let once_strings: Vec<String> = once.rules.iter().map(|r| r.to_canonical_string()).collect();
        let twice_strings: Vec<String> = twice.rules.iter().map(|r| r.to_canonical_string()).collect();
        prop_assert_eq!(once_strings, twice_strings);
    }

    /// Property 8: no record ever dominates itself.
    #[test]
    fn dominance_is_irreflexive(n in any::<i16>()) {
        let theory = theory_from("A=1 BETTER A=2");
        let mut r = Record::new();
        r.insert("A".to_string(), Value::Int(n as i64));
        prop_assert!(!theory.dominates(&r, &r));
    }

    /// Property 7: topk(k+1) includes every record topk(k) does, in the
    /// same relative order.
    #[test]
    fn topk_is_monotonic(values in prop::collection::vec(0i64..5, 1..8)) {
        let theory = theory_from("A=1 BETTER A=2 AND A=2 BETTER A=3 AND A=3 BETTER A=4");
        let records: Vec<Record> = values
            .iter()
            .map(|n| {
                let mut r = Record::new();
                r.insert("A".to_string(), Value::Int(*n));
                r
            })
            .collect();
        let smaller = classical_topk(&theory, &records, 2).unwrap();
        let larger = classical_topk(&theory, &records, 3).unwrap();
        prop_assert!(larger.len() >= smaller.len());
        prop_assert_eq!(&larger[..smaller.len()], &smaller[..]);
    }
}

fn theory_from(text: &str) -> Theory {
    let ast = parser::parse_theory(text).expect("theory should parse");
    Theory::from_ast(&ast).expect("rules should build")
}

/// Property 6: every evaluator agrees on the non-dominated set for a
/// handful of representative consistent theories and record batches.
#[test]
fn evaluators_agree_on_best_set_across_strategies() {
    use cp_engine::{extended_partition_best, formulas_best, maxpref_best, partition_best};

    let theory = theory_from("A=1 BETTER A=2 AND A=2 BETTER A=3");
    let mut records = Vec::new();
    for n in [3, 2, 1, 2, 3] {
        let mut r = Record::new();
        r.insert("A".to_string(), Value::Int(n));
        records.push(r);
    }

    let classical = classical_best(&theory, &records).unwrap();
    let partition = partition_best(&theory, &records).unwrap();
    let extended = extended_partition_best(&theory, &records).unwrap();
    let formulas = formulas_best(&theory, &records).unwrap();
    let maxpref = maxpref_best(&theory, &records).unwrap();

    let as_set = |v: &[Record]| -> std::collections::HashSet<Record> { v.iter().cloned().collect() };
    let expected = as_set(&classical);
    assert_eq!(as_set(&partition), expected);
    assert_eq!(as_set(&extended), expected);
    assert_eq!(as_set(&formulas), expected);
    assert_eq!(as_set(&maxpref), expected);
}
