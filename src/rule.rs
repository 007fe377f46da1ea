//! # Rule
//!
//! A CP-rule: an optional [`Condition`] plus a [`Preference`] (spec §3,
//! §4.2). `Rule` is the unit the grammar parser produces (via
//! [`Rule::from_ast`]) and the unit `Theory::split_rules` rewrites into
//! disjoint-interval form.

use crate::ast::{AstPredicate, AstRule};
use crate::error::CpError;
use crate::formula::Formula;
use crate::interval::{self, AttributeView, Endpoint, Interval};
use crate::records::Record;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A conjunction of attribute-interval predicates, one interval per
/// attribute (spec §3: "the same attribute may not appear twice").
pub type Condition = BTreeMap<String, Interval>;

/// A preference attribute, a best interval, a worst interval (both over
/// the preference attribute), and an indifferent attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    pub attribute: String,
    pub best: Interval,
    pub worst: Interval,
    pub indifferent: BTreeSet<String>,
}

/// `IF cond THEN best BETTER worst [indifferent]`.
///
/// Equality and hashing are defined by the rule's canonical string form
/// (spec §3), not structural field comparison — two rules built from
/// differently-ordered AST input but with the same meaning compare equal.
#[derive(Debug, Clone)]
pub struct Rule {
    pub condition: Condition,
    pub preference: Preference,
}

impl Rule {
    /// Build a `Rule` from parsed AST, converting predicates to canonical
    /// intervals via `interval::parse_interval` / `Interval::range`.
    pub fn from_ast(ast: &AstRule) -> Result<Rule, CpError> {
        let mut condition = Condition::new();
        for predicate in &ast.condition {
            let (attribute, interval) = predicate_to_interval(predicate);
            condition.insert(attribute, interval);
        }

        let (best_attribute, best) = predicate_to_interval(&ast.best);
        let (worst_attribute, worst) = predicate_to_interval(&ast.worst);
        if best_attribute != worst_attribute {
            return Err(CpError::Parse {
                message: format!(
                    "preference compares different attributes: {best_attribute} vs {worst_attribute}"
                ),
                line: 0,
            });
        }
        if interval::intersect(&best, &worst) {
            return Err(CpError::OverlappingPreference { attribute: best_attribute });
        }

        let indifferent: BTreeSet<String> = ast.indifferent.iter().cloned().collect();
        Ok(Rule {
            condition,
            preference: Preference { attribute: best_attribute, best, worst, indifferent },
        })
    }

    /// Render the canonical string form used for equality, hashing, and
    /// (transitively) `Theory`'s deduplication.
    pub fn to_canonical_string(&self) -> String {
        let mut s = String::new();
        if !self.condition.is_empty() {
            s.push_str("IF ");
            let parts: Vec<String> = self
                .condition
                .iter()
                .map(|(attribute, interval)| interval.to_predicate_string(attribute))
                .collect();
            s.push_str(&parts.join(" AND "));
            s.push_str(" THEN ");
        }
        s.push_str(&self.preference.best.to_predicate_string(&self.preference.attribute));
        s.push_str(" BETTER ");
        s.push_str(&self.preference.worst.to_predicate_string(&self.preference.attribute));
        if !self.preference.indifferent.is_empty() {
            s.push_str(" [");
            s.push_str(&self.preference.indifferent.iter().cloned().collect::<Vec<_>>().join(","));
            s.push(']');
        }
        s
    }

    /// Shared best/worst/condition satisfaction test (spec §3 conditions
    /// i-ii), generic over anything that looks up an [`interval::Operand`]
    /// per attribute -- concrete [`Record`]s or partial [`Formula`]s alike.
    fn satisfies_core<A: AttributeView, B: AttributeView>(&self, a: &A, b: &B) -> bool {
        match (a.operand(&self.preference.attribute), b.operand(&self.preference.attribute)) {
            (Some(av), Some(bv)) => {
                if !interval::intersect(&self.preference.best, av) {
                    return false;
                }
                if !interval::intersect(&self.preference.worst, bv) {
                    return false;
                }
            }
            _ => return false,
        }
        for (attribute, cond_interval) in &self.condition {
            match (a.operand(attribute), b.operand(attribute)) {
                (Some(av), Some(bv)) => {
                    if !interval::intersect(cond_interval, av) || !interval::intersect(cond_interval, bv) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }

    /// Full record-level dominance (spec §3): `a` dominates `b` under this
    /// rule iff the core conditions hold and every attribute outside the
    /// preference attribute and the indifferent set is equal in `a`/`b`.
    pub fn dominates(&self, a: &Record, b: &Record) -> bool {
        if !self.satisfies_core(a, b) {
            return false;
        }
        let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
        for key in keys {
            if *key == self.preference.attribute || self.preference.indifferent.contains(key) {
                continue;
            }
            match (a.get(key), b.get(key)) {
                (Some(x), Some(y)) if x == y => {}
                _ => return false,
            }
        }
        true
    }

    /// Formula-level dominance used to derive `Comparison`s (spec §4.4).
    /// Formulas are partial, so in place of record-level equality on
    /// "other" attributes this requires shared non-indifferent attributes
    /// to remain overlapping rather than disjoint (see DESIGN.md).
    pub fn dominates_formulas(&self, f1: &Formula, f2: &Formula) -> bool {
        if !self.satisfies_core(f1, f2) {
            return false;
        }
        for (attribute, interval1) in f1 {
            if *attribute == self.preference.attribute || self.preference.indifferent.contains(attribute) {
                continue;
            }
            if let Some(interval2) = f2.get(attribute) {
                if !interval::intersect(interval1, interval2) {
                    return false;
                }
            }
        }
        true
    }

    /// If the condition (if any) is satisfied by `state` and `state`'s
    /// preference-attribute entry lies in the best interval, produce the
    /// successor state: preference attribute replaced by the worst
    /// interval, every indifferent attribute deleted. `state` is a
    /// [`Formula`] so this composes with the dominance-by-search recursion
    /// (spec §4.4), which starts from a concrete record's point-interval
    /// encoding and walks successive rule applications.
    pub fn change_record(&self, state: &Formula) -> Option<Formula> {
        for (attribute, cond_interval) in &self.condition {
            match state.get(attribute) {
                Some(v) if interval::intersect(cond_interval, v) => {}
                _ => return None,
            }
        }
        match state.get(&self.preference.attribute) {
            Some(v) if interval::intersect(&self.preference.best, v) => {}
            _ => return None,
        }
        let mut next = state.clone();
        next.insert(self.preference.attribute.clone(), self.preference.worst.clone());
        for indifferent in &self.preference.indifferent {
            next.remove(indifferent);
        }
        Some(next)
    }

    /// True iff `self` and `other` share a preference attribute and every
    /// condition attribute they have in common has overlapping intervals.
    pub fn is_compatible_to(&self, other: &Rule) -> bool {
        if self.preference.attribute != other.preference.attribute {
            return false;
        }
        for (attribute, interval) in &self.condition {
            if let Some(other_interval) = other.condition.get(attribute) {
                if !interval::intersect(interval, other_interval) {
                    return false;
                }
            }
        }
        true
    }

    /// All atomic predicates appearing in the rule: condition entries plus
    /// best and worst (spec §4.2).
    pub fn atomic_formulas(&self) -> Vec<(String, Interval)> {
        let mut out: Vec<(String, Interval)> =
            self.condition.iter().map(|(a, i)| (a.clone(), i.clone())).collect();
        out.push((self.preference.attribute.clone(), self.preference.best.clone()));
        out.push((self.preference.attribute.clone(), self.preference.worst.clone()));
        out
    }

    /// Split the first disequality interval found, checked in order:
    /// condition attributes, best, worst (spec §4.2).
    pub fn split_neq_rule(&self) -> Option<(Rule, Rule)> {
        for (attribute, interval) in &self.condition {
            let parts = interval::split_neq(interval);
            if !parts.is_empty() {
                let mut r1 = self.clone();
                let mut r2 = self.clone();
                r1.condition.insert(attribute.clone(), parts[0].clone());
                r2.condition.insert(attribute.clone(), parts[1].clone());
                return Some((r1, r2));
            }
        }
        let best_parts = interval::split_neq(&self.preference.best);
        if !best_parts.is_empty() {
            let mut r1 = self.clone();
            let mut r2 = self.clone();
            r1.preference.best = best_parts[0].clone();
            r2.preference.best = best_parts[1].clone();
            return Some((r1, r2));
        }
        let worst_parts = interval::split_neq(&self.preference.worst);
        if !worst_parts.is_empty() {
            let mut r1 = self.clone();
            let mut r2 = self.clone();
            r1.preference.worst = worst_parts[0].clone();
            r2.preference.worst = worst_parts[1].clone();
            return Some((r1, r2));
        }
        None
    }

    /// Refine `self`'s condition/best/worst intervals against `other`'s,
    /// in the exact probe order the contract requires (spec §4.2): (1)
    /// each condition attribute of `other` vs `self.condition`; (2)
    /// `other`'s preference best/worst vs `self.condition`; (3) each
    /// condition attribute of `other` vs `self.best`; (4) `other`'s
    /// preference best/worst vs `self.best`; (5) repeat (3)-(4) against
    /// `self.worst`. The first attribute whose interval properly overlaps
    /// (but is not equal to) the overlay triggers a split and returns.
    pub fn split_rule(&self, other: &Rule) -> Option<Vec<Rule>> {
        // (1)
        for (attribute, overlay) in &other.condition {
            if let Some(self_interval) = self.condition.get(attribute) {
                if let Some(parts) = try_split(self_interval, overlay) {
                    let attribute = attribute.clone();
                    return Some(apply_condition_split(self, &attribute, parts));
                }
            }
        }
        // (2)
        if let Some(self_interval) = self.condition.get(&other.preference.attribute) {
            for overlay in [&other.preference.best, &other.preference.worst] {
                if let Some(parts) = try_split(self_interval, overlay) {
                    let attribute = other.preference.attribute.clone();
                    return Some(apply_condition_split(self, &attribute, parts));
                }
            }
        }
        // (3)
        for (attribute, overlay) in &other.condition {
            if *attribute == self.preference.attribute {
                if let Some(parts) = try_split(&self.preference.best, overlay) {
                    return Some(apply_best_split(self, parts));
                }
            }
        }
        // (4)
        if self.preference.attribute == other.preference.attribute {
            for overlay in [&other.preference.best, &other.preference.worst] {
                if let Some(parts) = try_split(&self.preference.best, overlay) {
                    return Some(apply_best_split(self, parts));
                }
            }
        }
        // (5), against self.worst
        for (attribute, overlay) in &other.condition {
            if *attribute == self.preference.attribute {
                if let Some(parts) = try_split(&self.preference.worst, overlay) {
                    return Some(apply_worst_split(self, parts));
                }
            }
        }
        if self.preference.attribute == other.preference.attribute {
            for overlay in [&other.preference.best, &other.preference.worst] {
                if let Some(parts) = try_split(&self.preference.worst, overlay) {
                    return Some(apply_worst_split(self, parts));
                }
            }
        }
        None
    }
}

fn try_split(s: &Interval, f: &Interval) -> Option<Vec<Interval>> {
    if !interval::intersect(s, f) {
        return None;
    }
    let parts = interval::split_interval(s, f);
    if parts.len() > 1 {
        Some(parts)
    } else {
        None
    }
}

fn apply_condition_split(base: &Rule, attribute: &str, parts: Vec<Interval>) -> Vec<Rule> {
    parts
        .into_iter()
        .map(|part| {
            let mut r = base.clone();
            r.condition.insert(attribute.to_string(), part);
            r
        })
        .collect()
}

fn apply_best_split(base: &Rule, parts: Vec<Interval>) -> Vec<Rule> {
    parts
        .into_iter()
        .map(|part| {
            let mut r = base.clone();
            r.preference.best = part;
            r
        })
        .collect()
}

fn apply_worst_split(base: &Rule, parts: Vec<Interval>) -> Vec<Rule> {
    parts
        .into_iter()
        .map(|part| {
            let mut r = base.clone();
            r.preference.worst = part;
            r
        })
        .collect()
}

fn predicate_to_interval(predicate: &AstPredicate) -> (String, Interval) {
    match predicate {
        AstPredicate::Comparison { attribute, op, value } => {
            (attribute.clone(), interval::parse_interval(*op, value.clone()))
        }
        AstPredicate::Interval { left_value, left_op, attribute, right_op, right_value } => (
            attribute.clone(),
            Interval::range(
                Endpoint::Finite(left_value.clone()),
                *left_op,
                *right_op,
                Endpoint::Finite(right_value.clone()),
            ),
        ),
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.to_canonical_string() == other.to_canonical_string()
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_canonical_string().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::value::Value;

    fn simple_rule(best: i64, worst: i64) -> Rule {
        Rule::from_ast(
            &RuleBuilder::new().best_eq("A", Value::Int(best)).worst_eq("A", Value::Int(worst)).build(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_overlapping_preference() {
        let err = Rule::from_ast(
            &RuleBuilder::new().best_eq("A", Value::Int(1)).worst_eq("A", Value::Int(1)).build(),
        )
        .unwrap_err();
        assert!(matches!(err, CpError::OverlappingPreference { .. }));
    }

    #[test]
    fn dominates_checks_other_attributes_equal() {
        let rule = simple_rule(1, 2);
        let mut a = Record::new();
        a.insert("A".to_string(), Value::Int(1));
        a.insert("B".to_string(), Value::Int(7));
        let mut b = Record::new();
        b.insert("A".to_string(), Value::Int(2));
        b.insert("B".to_string(), Value::Int(7));
        assert!(rule.dominates(&a, &b));

        let mut c = b.clone();
        c.insert("B".to_string(), Value::Int(8));
        assert!(!rule.dominates(&a, &c));
    }

    #[test]
    fn change_record_applies_condition_and_indifference() {
        let rule = Rule::from_ast(
            &RuleBuilder::new()
                .condition_eq("C", Value::Int(1))
                .best_eq("A", Value::Int(1))
                .worst_eq("A", Value::Int(2))
                .indifferent(["B"])
                .build(),
        )
        .unwrap();
        let mut state = Formula::new();
        state.insert("A".to_string(), Interval::equal(Value::Int(1)));
        state.insert("B".to_string(), Interval::equal(Value::Int(9)));
        state.insert("C".to_string(), Interval::equal(Value::Int(1)));

        let next = rule.change_record(&state).unwrap();
        assert_eq!(next.get("A"), Some(&Interval::equal(Value::Int(2))));
        assert!(!next.contains_key("B"));
    }

    #[test]
    fn split_neq_rule_splits_first_disequality() {
        let rule = Rule::from_ast(
            &RuleBuilder::new()
                .best(AstPredicate::Comparison {
                    attribute: "A".to_string(),
                    op: crate::interval::CmpOp::Ne,
                    value: Value::Int(3),
                })
                .worst_eq("A", Value::Int(3))
                .build(),
        )
        .unwrap();
        let (r1, r2) = rule.split_neq_rule().unwrap();
        assert_ne!(r1.preference.best, r2.preference.best);
    }

    #[test]
    fn split_rule_refines_overlapping_condition() {
        let r1 = Rule::from_ast(
            &RuleBuilder::new()
                .condition_eq("C", Value::Int(1))
                .best_eq("A", Value::Int(1))
                .worst_eq("A", Value::Int(2))
                .build(),
        )
        .unwrap();
        let mut r1 = r1;
        r1.condition.insert("C".to_string(), Interval::less_than(Value::Int(10)));
        let r2 = Rule::from_ast(
            &RuleBuilder::new()
                .condition_eq("C", Value::Int(5))
                .best_eq("A", Value::Int(2))
                .worst_eq("A", Value::Int(1))
                .build(),
        )
        .unwrap();
        let parts = r1.split_rule(&r2).unwrap();
        assert!(parts.len() > 1);
    }
}
