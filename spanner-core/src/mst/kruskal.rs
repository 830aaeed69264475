//! Kruskal's algorithm over the double-entry edge representation.

use rayon::prelude::*;

use crate::graph::{Edge, Graph};

use super::union_find::DisjointSet;

/// Computes the minimum spanning forest of `graph` with Kruskal's algorithm.
///
/// The sort is stable, so edges of equal weight are considered in insertion
/// order. Because every undirected edge appears as two directed entries,
/// each edge is examined twice; the union-find rejects the second
/// consideration, which deduplicates the output without extra bookkeeping.
pub(super) fn minimum_spanning_forest(graph: &Graph) -> Vec<Edge> {
    let mut sorted: Vec<Edge> = graph.edges().to_vec();
    sorted.par_sort_by_key(Edge::weight);

    let mut components = DisjointSet::new(graph.vertex_count());
    let mut forest = Vec::with_capacity(graph.vertex_count().saturating_sub(1));
    for edge in sorted {
        if components.unite(edge.source(), edge.target()) {
            forest.push(edge);
        }
    }
    forest
}
