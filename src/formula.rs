//! # Formulas and Comparisons
//!
//! A [`Formula`] is a conjunction of attribute-interval predicates (spec
//! §3); a [`Comparison`] is a derived `(best, worst, indifferent)` triple
//! (spec §4.4). Both are produced and owned by [`crate::theory::Theory`];
//! this module only holds their shapes and the pure functions over them
//! (satisfaction, subsumption, canonical string rendering) so `theory.rs`
//! stays focused on the derivation algorithms themselves.

use crate::interval::{self, AttributeView, Interval, Operand};
use crate::records::Record;
use crate::rule::Rule;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A conjunction of attribute-interval predicates.
pub type Formula = BTreeMap<String, Interval>;

impl AttributeView for Formula {
    fn operand(&self, attribute: &str) -> Option<Operand<'_>> {
        self.get(attribute).map(Operand::Interval)
    }
}

/// `(best_formula, worst_formula, indifferent_set)`, referencing formulas
/// by index into the owning `Theory`'s formula pool (spec §9's "index
/// handles into owned vectors" guidance, rather than reference cycles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub best: usize,
    pub worst: usize,
    pub indifferent: BTreeSet<String>,
}

/// Render as `{pred AND pred ...}`, matching [`Interval::to_predicate_string`].
/// Entries iterate in attribute order since `Formula` is a `BTreeMap`.
pub fn formula_to_string(formula: &Formula) -> String {
    formula
        .iter()
        .map(|(attribute, interval)| interval.to_predicate_string(attribute))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Canonical string for a comparison, used for deterministic sort order
/// after essentiality pruning (spec §4.4).
pub fn comparison_to_string(cmp: &Comparison, formulas: &[Formula]) -> String {
    let indiff: Vec<&str> = cmp.indifferent.iter().map(String::as_str).collect();
    format!(
        "{} > {} [{}]",
        formula_to_string(&formulas[cmp.best]),
        formula_to_string(&formulas[cmp.worst]),
        indiff.join(",")
    )
}

/// True iff every value satisfying `record`'s attributes within `formula`
/// actually does — i.e. the record matches the formula's conjunction.
pub fn record_satisfies_formula(record: &Record, formula: &Formula) -> bool {
    formula.iter().all(|(attribute, interval)| {
        record
            .get(attribute)
            .is_some_and(|value| interval::intersect(interval, value))
    })
}

/// True iff `general` is more generic than (subsumes) `specific`: every
/// attribute `general` constrains, `specific` also constrains with an
/// interval contained in `general`'s. Used by essentiality pruning (spec
/// §4.4) and, with the roles of "formula" read loosely, nowhere else.
pub fn formula_subsumes(general: &Formula, specific: &Formula) -> bool {
    general.iter().all(|(attribute, general_interval)| {
        specific
            .get(attribute)
            .is_some_and(|specific_interval| interval::contains(general_interval, specific_interval))
    })
}

/// Collect every rule's atomic predicates, then iteratively grow formulas
/// by attribute addition until no new (deduplicated) formula appears
/// (spec §4.4 "Formula generation").
pub fn generate_formulas(rules: &[Rule]) -> Vec<Formula> {
    let atomics: Vec<(String, Interval)> = rules.iter().flat_map(Rule::atomic_formulas).collect();

    let mut formulas: Vec<Formula> = atomics
        .iter()
        .map(|(attribute, interval)| {
            let mut f = Formula::new();
            f.insert(attribute.clone(), interval.clone());
            f
        })
        .collect();
    dedup_formulas(&mut formulas);

    loop {
        let mut grown = Vec::new();
        for (attribute, interval) in &atomics {
            for formula in &formulas {
                if !formula.contains_key(attribute) {
                    let mut augmented = formula.clone();
                    augmented.insert(attribute.clone(), interval.clone());
                    grown.push(augmented);
                }
            }
        }
        let before = formulas.len();
        formulas.extend(grown);
        dedup_formulas(&mut formulas);
        if formulas.len() == before {
            break;
        }
    }
    formulas
}

fn dedup_formulas(formulas: &mut Vec<Formula>) {
    let mut seen = HashSet::new();
    formulas.retain(|f| seen.insert(formula_to_string(f)));
}
