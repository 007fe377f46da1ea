//! # Theory
//!
//! A `Theory` owns a rule set and derives everything evaluators need from
//! it: consistency (spec §4.3), a normalized disjoint-interval rule set
//! (spec §4.2's `split_rules`), and the formula/comparison materialization
//! that backs the formulas/BTG and maxpref/HiFor evaluators (spec §4.4).

use crate::ast::AstTheory;
use crate::error::{CpError, CpResult};
use crate::formula::{self, formula_to_string, record_satisfies_formula, formula_subsumes, Comparison, Formula};
use crate::graph::PreferenceGraph;
use crate::interval::{self, Interval};
use crate::records::Record;
use crate::rule::Rule;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A parsed, unsplit rule set plus the derivation operations spec §4
/// defines over it.
#[derive(Debug, Clone)]
pub struct Theory {
    pub rules: Vec<Rule>,
}

/// The fixed point of formula generation and comparison derivation (spec
/// §4.4): every formula the rule set can produce, and every direct or
/// transitively-derived `best > worst` relationship between them that
/// survived essentiality pruning.
#[derive(Debug, Clone)]
pub struct Materialization {
    pub formulas: Vec<Formula>,
    pub comparisons: Vec<Comparison>,
}

impl Theory {
    pub fn new(rules: Vec<Rule>) -> Self {
        Theory { rules }
    }

    pub fn from_ast(ast: &AstTheory) -> CpResult<Theory> {
        let rules = ast.rules.iter().map(Rule::from_ast).collect::<CpResult<Vec<_>>>()?;
        Ok(Theory::new(rules))
    }

    /// The attribute-dependency graph: an edge `condition_attr -> pref_attr`
    /// for every rule. Global consistency (spec §4.3) requires this graph
    /// be acyclic -- a preference over A cannot depend, even indirectly, on
    /// a condition over A.
    pub fn attribute_dependency_graph(&self) -> PreferenceGraph<String> {
        let mut graph = PreferenceGraph::new();
        for rule in &self.rules {
            graph.ensure_vertex(rule.preference.attribute.clone());
            for attribute in rule.condition.keys() {
                graph.add_edge(attribute.clone(), rule.preference.attribute.clone());
            }
        }
        graph
    }

    pub fn is_globally_consistent(&self) -> bool {
        self.attribute_dependency_graph().is_acyclic(&|a, b| a == b)
    }

    fn compatibility_adjacency(&self) -> Vec<Vec<bool>> {
        let n = self.rules.len();
        let mut adjacency = vec![vec![false; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if self.rules[i].is_compatible_to(&self.rules[j]) {
                    adjacency[i][j] = true;
                    adjacency[j][i] = true;
                }
            }
        }
        adjacency
    }

    /// Every maximal set of pairwise-compatible rules, via Bron-Kerbosch
    /// clique enumeration over the compatibility graph (spec §4.3).
    fn maximal_compatible_sets(&self) -> Vec<Vec<usize>> {
        let adjacency = self.compatibility_adjacency();
        let all: BTreeSet<usize> = (0..self.rules.len()).collect();
        let mut cliques = Vec::new();
        bron_kerbosch(&adjacency, BTreeSet::new(), all, BTreeSet::new(), &mut cliques);
        cliques
    }

    /// Local consistency (spec §4.3): for every maximal compatible rule
    /// set, the graph of `best -> worst` interval edges must be acyclic
    /// under interval overlap.
    pub fn is_locally_consistent(&self) -> bool {
        self.maximal_compatible_sets().iter().all(|clique| self.clique_is_consistent(clique))
    }

    fn clique_is_consistent(&self, clique: &[usize]) -> bool {
        let mut intervals: Vec<Interval> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut intern = |interval: &Interval, intervals: &mut Vec<Interval>, index_of: &mut HashMap<String, usize>| -> usize {
            let key = interval.to_predicate_string("_");
            if let Some(&idx) = index_of.get(&key) {
                return idx;
            }
            let idx = intervals.len();
            intervals.push(interval.clone());
            index_of.insert(key, idx);
            idx
        };

        let mut graph: PreferenceGraph<usize> = PreferenceGraph::new();
        for &rule_idx in clique {
            let rule = &self.rules[rule_idx];
            let best = intern(&rule.preference.best, &mut intervals, &mut index_of);
            let worst = intern(&rule.preference.worst, &mut intervals, &mut index_of);
            graph.add_edge(best, worst);
        }
        let overlaps = |a: usize, b: usize| interval::intersect(&intervals[a], &intervals[b]);
        graph.is_acyclic(&overlaps)
    }

    pub fn is_consistent(&self) -> bool {
        self.is_globally_consistent() && self.is_locally_consistent()
    }

    pub fn require_consistent(&self) -> CpResult<()> {
        if self.is_consistent() {
            Ok(())
        } else {
            Err(CpError::InconsistentTheory)
        }
    }

    /// Rewrite the rule set into disjoint-interval form (spec §4.2): first
    /// a fixed point eliminating every disequality interval via
    /// `Rule::split_neq_rule`, then a fixed point refining pairwise
    /// overlaps via `Rule::split_rule`, deduplicated by canonical string.
    pub fn split_rules(&self) -> Vec<Rule> {
        let mut rules = self.rules.clone();

        loop {
            let mut next = Vec::with_capacity(rules.len());
            let mut changed = false;
            for rule in &rules {
                match rule.split_neq_rule() {
                    Some((r1, r2)) => {
                        next.push(r1);
                        next.push(r2);
                        changed = true;
                    }
                    None => next.push(rule.clone()),
                }
            }
            rules = next;
            if !changed {
                break;
            }
        }

        loop {
            let mut changed = false;
            'outer: for i in 0..rules.len() {
                for j in 0..rules.len() {
                    if i == j {
                        continue;
                    }
                    if let Some(parts) = rules[i].split_rule(&rules[j]) {
                        rules.splice(i..=i, parts);
                        changed = true;
                        break 'outer;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        dedup_rules(rules)
    }

    /// Search-based dominance test (spec §3/§4.4): encode `a` as a
    /// full-equality [`Formula`], then repeatedly apply rules via
    /// [`Rule::change_record`] -- each rule usable at most once per
    /// branch, bounding the search to the rule count -- until a reachable
    /// state is satisfied by `b`. Attributes no rule ever touches stay
    /// pinned to `a`'s value throughout, which is exactly the
    /// ceteris-paribus condition (spec §3 condition iii).
    pub fn dominates(&self, a: &Record, b: &Record) -> bool {
        if a == b {
            return false;
        }
        let start: Formula = a.iter().map(|(k, v)| (k.clone(), Interval::Equal(v.clone()))).collect();

        let mut stack: Vec<(Formula, Vec<bool>)> = vec![(start, vec![true; self.rules.len()])];
        let mut visited: HashSet<String> = HashSet::new();
        while let Some((state, remaining)) = stack.pop() {
            if record_satisfies_formula(b, &state) {
                return true;
            }
            if !visited.insert(formula_to_string(&state)) {
                continue;
            }
            for (idx, rule) in self.rules.iter().enumerate() {
                if !remaining[idx] {
                    continue;
                }
                if let Some(next_state) = rule.change_record(&state) {
                    let mut next_remaining = remaining.clone();
                    next_remaining[idx] = false;
                    stack.push((next_state, next_remaining));
                }
            }
        }
        false
    }

    /// Generate every formula the rule set can produce and derive every
    /// `best > worst` comparison between them (spec §4.4): direct
    /// comparisons from `Rule::dominates_formulas`, then a fixed-point
    /// transitive closure composing `A > B` and `B > C` into `A > C` with
    /// the intersection of their indifferent sets, then essentiality
    /// pruning removing any comparison implied by a strictly more general
    /// one.
    pub fn materialize(&self) -> Materialization {
        let formulas = formula::generate_formulas(&self.rules);

        let mut direct: BTreeMap<(usize, usize), BTreeSet<String>> = BTreeMap::new();
        for (i, fi) in formulas.iter().enumerate() {
            for (j, fj) in formulas.iter().enumerate() {
                if i == j {
                    continue;
                }
                for rule in &self.rules {
                    if rule.dominates_formulas(fi, fj) {
                        direct.entry((i, j)).or_default().extend(rule.preference.indifferent.iter().cloned());
                    }
                }
            }
        }

        let mut comparisons: BTreeMap<(usize, usize), BTreeSet<String>> = direct;
        loop {
            let mut discovered: Vec<((usize, usize), BTreeSet<String>)> = Vec::new();
            for (&(a, b), ind1) in &comparisons {
                for (&(b2, c), ind2) in &comparisons {
                    if b != b2 || a == c {
                        continue;
                    }
                    let indifferent: BTreeSet<String> = ind1.intersection(ind2).cloned().collect();
                    discovered.push(((a, c), indifferent));
                }
            }
            let before = comparisons.len();
            for (key, indifferent) in discovered {
                let entry = comparisons.entry(key).or_default();
                let grown = indifferent.len() > entry.len() && indifferent.is_superset(entry);
                if entry.is_empty() || grown {
                    *entry = entry.union(&indifferent).cloned().collect();
                }
            }
            if comparisons.len() == before {
                break;
            }
        }

        let all: Vec<Comparison> = comparisons
            .into_iter()
            .map(|((best, worst), indifferent)| Comparison { best, worst, indifferent })
            .collect();
        let pruned = prune_essential(&all, &formulas);

        Materialization { formulas, comparisons: pruned }
    }

    /// The better-than graph (BTG, spec §4.4/§4.5): one vertex per derived
    /// formula, one edge per surviving comparison, widened via
    /// [`PreferenceGraph::update_intersections`] so overlapping-but-distinct
    /// formulas stay ordered consistently with each other.
    pub fn get_btg(&self) -> (Vec<Formula>, PreferenceGraph<usize>) {
        let Materialization { formulas, comparisons } = self.materialize();
        let mut graph: PreferenceGraph<usize> = PreferenceGraph::new();
        for i in 0..formulas.len() {
            graph.ensure_vertex(i);
        }
        let overlaps = |a: usize, b: usize| formulas_overlap(&formulas[a], &formulas[b]);
        for comparison in &comparisons {
            graph.update_intersections(comparison.best, comparison.worst, &overlaps);
        }
        (formulas, graph)
    }

    /// Formulas ordered best-to-worst by BTG topological layer, ties
    /// broken by canonical string for determinism (spec §4.5's "formulas"
    /// / Better-Than-Graph evaluator).
    pub fn get_sorted_formulas(&self) -> Vec<Formula> {
        let (formulas, graph) = self.get_btg();
        let mut ordered = Vec::new();
        for layer in graph.topological_layers() {
            let mut entries: Vec<Formula> = layer.into_iter().map(|idx| formulas[idx].clone()).collect();
            entries.sort_by_key(formula_to_string);
            ordered.extend(entries);
        }
        ordered
    }

    /// Like [`Theory::get_sorted_formulas`], but each formula is paired
    /// with its rank (0 = best layer), which is what `maxpref`/HiFor need
    /// to rank a record by the best layer any satisfied formula belongs
    /// to (spec §4.5).
    pub fn get_preference_list(&self) -> Vec<(usize, Formula)> {
        let (formulas, graph) = self.get_btg();
        let mut out = Vec::new();
        for (rank, layer) in graph.topological_layers().into_iter().enumerate() {
            let mut indices = layer;
            indices.sort_unstable();
            for idx in indices {
                out.push((rank, formulas[idx].clone()));
            }
        }
        out
    }
}

fn formulas_overlap(f1: &Formula, f2: &Formula) -> bool {
    f1.iter().all(|(attribute, interval)| {
        f2.get(attribute).map_or(true, |other| interval::intersect(interval, other))
    })
}

fn dedup_rules(rules: Vec<Rule>) -> Vec<Rule> {
    let mut seen = HashSet::new();
    rules.into_iter().filter(|rule| seen.insert(rule.to_canonical_string())).collect()
}

/// A comparison is non-essential when some other comparison is strictly
/// more general: its best/worst formulas subsume `c`'s, and its
/// indifferent set is no larger (a smaller indifferent set is a stronger,
/// more specific claim, so the *general* comparison must not indifference
/// away more than `c` does).
fn prune_essential(comparisons: &[Comparison], formulas: &[Formula]) -> Vec<Comparison> {
    let mut kept = Vec::new();
    'outer: for (idx, candidate) in comparisons.iter().enumerate() {
        for (other_idx, other) in comparisons.iter().enumerate() {
            if idx == other_idx {
                continue;
            }
            if other.best == candidate.best && other.worst == candidate.worst {
                continue;
            }
            let more_general = formula_subsumes(&formulas[other.best], &formulas[candidate.best])
                && formula_subsumes(&formulas[other.worst], &formulas[candidate.worst])
                && other.indifferent.is_subset(&candidate.indifferent);
            if more_general {
                continue 'outer;
            }
        }
        kept.push(candidate.clone());
    }
    kept
}

fn bron_kerbosch(
    adjacency: &[Vec<bool>],
    r: BTreeSet<usize>,
    mut p: BTreeSet<usize>,
    mut x: BTreeSet<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if p.is_empty() && x.is_empty() {
        out.push(r.into_iter().collect());
        return;
    }
    let candidates: Vec<usize> = p.iter().copied().collect();
    for v in candidates {
        if !p.contains(&v) {
            continue;
        }
        let neighbors: BTreeSet<usize> = (0..adjacency.len()).filter(|&u| adjacency[v][u]).collect();
        let mut r_next = r.clone();
        r_next.insert(v);
        let p_next: BTreeSet<usize> = p.intersection(&neighbors).copied().collect();
        let x_next: BTreeSet<usize> = x.intersection(&neighbors).copied().collect();
        bron_kerbosch(adjacency, r_next, p_next, x_next, out);
        p.remove(&v);
        x.insert(v);
    }
}
