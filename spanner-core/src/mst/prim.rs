//! Prim's algorithm over the double-entry edge representation.

use std::collections::BTreeSet;

use crate::graph::{Edge, Graph};

/// A candidate edge connecting `target` to the growing tree.
///
/// Ordering is keyed `(weight, target)` first, so extraction is
/// deterministic even when several candidates share a weight; the trailing
/// fields only keep the ordering total.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct Candidate {
    weight: i64,
    target: usize,
    source: usize,
    id: u64,
}

impl Candidate {
    /// A synthetic zero-weight self-edge used to start a component scan.
    const fn seed(vertex: usize) -> Self {
        Self {
            weight: 0,
            target: vertex,
            source: vertex,
            id: 0,
        }
    }
}

/// Computes the minimum spanning forest of `graph` with Prim's algorithm.
///
/// The scan starts at vertex 0 with a synthetic zero-weight seed (never
/// emitted) and re-seeds at the lowest unselected vertex whenever the
/// candidate set drains, so a disconnected input yields the union of the
/// per-component trees.
pub(super) fn minimum_spanning_forest(graph: &Graph) -> Vec<Edge> {
    let vertex_count = graph.vertex_count();
    if vertex_count == 0 {
        return Vec::new();
    }

    let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); vertex_count];
    for edge in graph.edges() {
        adjacency[edge.source()].push(*edge);
    }

    let mut min_edge: Vec<Option<Candidate>> = vec![None; vertex_count];
    let mut selected = vec![false; vertex_count];
    let mut queue = BTreeSet::new();
    let mut forest = Vec::with_capacity(vertex_count.saturating_sub(1));

    let mut next_seed = 0;
    loop {
        if queue.is_empty() {
            // Candidate set drained: the current component is spanned.
            // Restart from the lowest vertex not yet in the forest.
            match (next_seed..vertex_count).find(|&vertex| !selected[vertex]) {
                Some(vertex) => {
                    next_seed = vertex;
                    let seed = Candidate::seed(vertex);
                    min_edge[vertex] = Some(seed);
                    queue.insert(seed);
                }
                None => break,
            }
        }

        let Some(candidate) = queue.pop_first() else {
            break;
        };
        let vertex = candidate.target;
        if selected[vertex] {
            continue;
        }
        selected[vertex] = true;

        if candidate.source != candidate.target {
            forest.push(Edge::new(
                candidate.source,
                vertex,
                candidate.weight,
                candidate.id,
            ));
        }

        for edge in &adjacency[vertex] {
            let neighbour = edge.target();
            if selected[neighbour] {
                continue;
            }
            let beats_current = min_edge[neighbour]
                .is_none_or(|current| edge.weight() < current.weight);
            if beats_current {
                if let Some(previous) = min_edge[neighbour] {
                    queue.remove(&previous);
                }
                let replacement = Candidate {
                    weight: edge.weight(),
                    target: neighbour,
                    source: edge.source(),
                    id: edge.id(),
                };
                min_edge[neighbour] = Some(replacement);
                queue.insert(replacement);
            }
        }
    }

    forest
}
