//! # Preference Graph
//!
//! A small directed multigraph over opaque, generic vertex keys, used by
//! `Theory` to represent both the rule-compatibility graph (local
//! consistency, spec §4.3) and the formula better-than graph (BTG, spec
//! §4.4/§4.5). Vertex identity is an index handle into the owning
//! `Theory`'s vector, not a pointer or Rc — see DESIGN.md's "index
//! handles instead of reference cycles" note.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// A directed graph over vertex keys `V`. Multiple edges between the same
/// pair of vertices are allowed and deduplicated only where the caller
/// cares (edges don't carry weight; the graph is purely structural).
#[derive(Debug, Clone)]
pub struct PreferenceGraph<V: Eq + Hash + Clone + Ord> {
    vertices: Vec<V>,
    index_of: HashMap<V, usize>,
    edges: Vec<HashSet<usize>>,
}

impl<V: Eq + Hash + Clone + Ord> Default for PreferenceGraph<V> {
    fn default() -> Self {
        Self { vertices: Vec::new(), index_of: HashMap::new(), edges: Vec::new() }
    }
}

impl<V: Eq + Hash + Clone + Ord> PreferenceGraph<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `v` if absent and return its stable index.
    pub fn ensure_vertex(&mut self, v: V) -> usize {
        if let Some(&idx) = self.index_of.get(&v) {
            return idx;
        }
        let idx = self.vertices.len();
        self.index_of.insert(v.clone(), idx);
        self.vertices.push(v);
        self.edges.push(HashSet::new());
        idx
    }

    pub fn add_edge(&mut self, from: V, to: V) {
        let from_idx = self.ensure_vertex(from);
        let to_idx = self.ensure_vertex(to);
        self.edges[from_idx].insert(to_idx);
    }

    pub fn vertex(&self, idx: usize) -> &V {
        &self.vertices[idx]
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex indices in insertion order, the deterministic iteration
    /// order spec §9 requires.
    pub fn vertex_indices(&self) -> impl Iterator<Item = usize> {
        0..self.vertices.len()
    }

    fn successors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges[idx].iter().copied()
    }

    /// True iff some path of length ≥ 1 from `start` reaches a vertex that
    /// `overlaps` considers equivalent to `goal`. `overlaps` generalizes
    /// plain equality to interval overlap, so a cycle through
    /// intersecting-but-not-identical formula vertices is still detected
    /// (spec §4.3's interval-aware cycle test via `update_intersections`).
    ///
    /// `start` itself is never checked against `goal` — only vertices
    /// reached after traversing at least one edge are. Checking `start`
    /// up front would make this trivially true for every vertex (every
    /// vertex overlaps itself), which would report every graph as cyclic.
    pub fn dfs_reach(&self, start: usize, goal: usize, overlaps: &dyn Fn(usize, usize) -> bool) -> bool {
        let mut visited = HashSet::new();
        visited.insert(start);
        let mut stack: Vec<usize> = self.successors(start).collect();
        while let Some(vertex) = stack.pop() {
            if overlaps(vertex, goal) {
                return true;
            }
            if !visited.insert(vertex) {
                continue;
            }
            stack.extend(self.successors(vertex));
        }
        false
    }

    /// True iff no vertex can reach an overlapping copy of itself via a
    /// path of length ≥ 1 (spec §4.3: acyclicity under interval overlap).
    pub fn is_acyclic(&self, overlaps: &dyn Fn(usize, usize) -> bool) -> bool {
        self.vertex_indices().all(|v| !self.dfs_reach(v, v, overlaps))
    }

    /// Add an edge from every vertex whose payload overlaps `from` (per
    /// `overlaps`) to `to`, and from `from` to every vertex whose payload
    /// overlaps `to`. Used when inserting a new formula-comparison edge
    /// into the BTG: earlier edges between overlapping-but-not-identical
    /// formulas must also see the new ordering (spec §4.3).
    pub fn update_intersections(&mut self, from: usize, to: usize, overlaps: &dyn Fn(usize, usize) -> bool) {
        let existing: Vec<usize> = self.vertex_indices().collect();
        for v in &existing {
            if *v != from && overlaps(*v, from) {
                self.edges[*v].insert(to);
            }
            if *v != to && overlaps(*v, to) {
                self.edges[from].insert(*v);
            }
        }
        self.edges[from].insert(to);
    }

    /// Vertices with in-degree zero, in insertion order.
    pub fn top_vertices(&self) -> Vec<usize> {
        let mut in_degree = vec![0usize; self.vertices.len()];
        for edges in &self.edges {
            for &to in edges {
                in_degree[to] += 1;
            }
        }
        in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Kahn's-algorithm topological layering: layer 0 is every source
    /// vertex (in-degree 0 after removing nothing), layer k+1 is every
    /// vertex whose remaining in-degree drops to 0 once layers 0..=k are
    /// removed. Used by the formulas/BTG evaluator to rank records by
    /// "number of dominating formulas" (spec §4.5).
    ///
    /// If the graph has a cycle (shouldn't happen once `Theory` has
    /// confirmed consistency, but this function doesn't assume that),
    /// any vertex never reaching in-degree 0 is appended as a final
    /// layer, in insertion order, rather than silently dropped.
    pub fn topological_layers(&self) -> Vec<Vec<usize>> {
        let mut in_degree = vec![0usize; self.vertices.len()];
        for edges in &self.edges {
            for &to in edges {
                in_degree[to] += 1;
            }
        }
        let mut remaining: HashSet<usize> = self.vertex_indices().collect();
        let mut layers = Vec::new();
        while !remaining.is_empty() {
            let mut layer: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|v| in_degree[*v] == 0)
                .collect();
            layer.sort_unstable();
            if layer.is_empty() {
                let mut leftover: Vec<usize> = remaining.iter().copied().collect();
                leftover.sort_unstable();
                layers.push(leftover);
                break;
            }
            for v in &layer {
                remaining.remove(v);
                for &to in &self.edges[*v] {
                    if remaining.contains(&to) {
                        in_degree[to] = in_degree[to].saturating_sub(1);
                    }
                }
            }
            layers.push(layer);
        }
        layers
    }

    /// Adjacency as a deterministic map, exposed for diagnostics and the
    /// reference CLI's `--dump-graph` style output.
    pub fn adjacency(&self) -> BTreeMap<usize, Vec<usize>> {
        self.vertex_indices()
            .map(|v| {
                let mut tos: Vec<usize> = self.edges[v].iter().copied().collect();
                tos.sort_unstable();
                (v, tos)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(_: usize, _: usize) -> bool {
        false
    }

    #[test]
    fn detects_simple_cycle() {
        let mut g: PreferenceGraph<usize> = PreferenceGraph::new();
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(2, 0);
        assert!(!g.is_acyclic(&eq));
    }

    #[test]
    fn self_loop_free_graph_is_not_trivially_cyclic() {
        let mut g: PreferenceGraph<usize> = PreferenceGraph::new();
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        assert!(g.is_acyclic(&eq));
    }

    #[test]
    fn topological_layers_respect_dependencies() {
        let mut g: PreferenceGraph<usize> = PreferenceGraph::new();
        g.ensure_vertex(0);
        g.ensure_vertex(1);
        g.ensure_vertex(2);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        let layers = g.topological_layers();
        assert_eq!(layers, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn top_vertices_are_sources() {
        let mut g: PreferenceGraph<usize> = PreferenceGraph::new();
        g.add_edge(0, 2);
        g.add_edge(1, 2);
        let mut tops = g.top_vertices();
        tops.sort_unstable();
        assert_eq!(tops, vec![0, 1]);
    }

    #[test]
    fn update_intersections_links_overlapping_vertices() {
        let mut g: PreferenceGraph<usize> = PreferenceGraph::new();
        g.ensure_vertex(0);
        g.ensure_vertex(1);
        g.ensure_vertex(2);
        let overlaps = |a: usize, b: usize| (a == 0 && b == 1);
        g.update_intersections(1, 2, &overlaps);
        assert!(g.adjacency()[&0].contains(&2));
        assert!(g.adjacency()[&1].contains(&2));
    }
}
