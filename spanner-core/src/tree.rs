//! Metrics derived from a minimum spanning tree.
//!
//! Shortest paths are computed with Dijkstra from every vertex the tree
//! touches. A single depth-first walk would suffice on a tree, but Dijkstra
//! keeps the routine correct if a non-tree edge set is ever supplied.
//! Ordered maps keep iteration, and therefore rendering, deterministic.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, BinaryHeap},
};

use crate::graph::Edge;

/// Sentinel distance reported for vertex pairs with no connecting path.
pub const UNREACHABLE: i64 = i64::MAX;

/// Pairwise shortest distances over the tree.
///
/// Only vertices incident to at least one tree edge appear as keys, and only
/// finite distances appear as values; an absent pair is unreachable.
pub type ShortestPathMap = BTreeMap<usize, BTreeMap<usize, i64>>;

/// The outcome of one `SolveMST` computation: the forest plus its metrics.
///
/// Computed once, read-only thereafter.
#[derive(Clone, Debug, PartialEq)]
pub struct MstResult {
    mst_edges: Vec<Edge>,
    total_weight: i64,
    longest_distance: i64,
    average_distance: f64,
    shortest_distances: ShortestPathMap,
}

impl MstResult {
    /// Builds the metrics for a spanning forest.
    #[must_use]
    pub fn from_edges(mst_edges: Vec<Edge>) -> Self {
        let shortest_distances = all_pairs_shortest_paths(&mst_edges);

        let mut counted = BTreeSet::new();
        let mut total_weight = 0;
        for edge in &mst_edges {
            if counted.insert(edge.id()) {
                total_weight += edge.weight();
            }
        }

        let mut longest_distance = 0;
        let mut positive_sum = 0i64;
        let mut positive_pairs = 0u64;
        for row in shortest_distances.values() {
            for &distance in row.values() {
                longest_distance = longest_distance.max(distance);
                if distance > 0 {
                    positive_sum += distance;
                    positive_pairs += 1;
                }
            }
        }
        let average_distance = if positive_pairs == 0 {
            0.0
        } else {
            positive_sum as f64 / positive_pairs as f64
        };

        Self {
            mst_edges,
            total_weight,
            longest_distance,
            average_distance,
            shortest_distances,
        }
    }

    /// Returns the forest edges, each undirected edge exactly once.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[Edge] { &self.mst_edges }

    /// Returns the sum of edge weights, counted once per identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn total_weight(&self) -> i64 { self.total_weight }

    /// Returns the largest finite pairwise distance in the tree.
    #[must_use]
    #[rustfmt::skip]
    pub fn longest_distance(&self) -> i64 { self.longest_distance }

    /// Returns the mean distance over ordered vertex pairs `(i, j)` with
    /// `i != j` and a finite distance, or `0.0` when no such pair exists.
    #[must_use]
    #[rustfmt::skip]
    pub fn average_distance(&self) -> f64 { self.average_distance }

    /// Returns the full pairwise distance map.
    #[must_use]
    #[rustfmt::skip]
    pub fn shortest_distances(&self) -> &ShortestPathMap { &self.shortest_distances }

    /// Returns the distance from `source` to `target`, or [`UNREACHABLE`]
    /// when no path exists within the tree.
    #[must_use]
    pub fn shortest_distance(&self, source: usize, target: usize) -> i64 {
        self.shortest_distances
            .get(&source)
            .and_then(|row| row.get(&target))
            .copied()
            .unwrap_or(UNREACHABLE)
    }
}

fn all_pairs_shortest_paths(mst_edges: &[Edge]) -> ShortestPathMap {
    let mut adjacency: BTreeMap<usize, Vec<(usize, i64)>> = BTreeMap::new();
    for edge in mst_edges {
        adjacency
            .entry(edge.source())
            .or_default()
            .push((edge.target(), edge.weight()));
        adjacency
            .entry(edge.target())
            .or_default()
            .push((edge.source(), edge.weight()));
    }

    adjacency
        .keys()
        .map(|&start| (start, single_source(&adjacency, start)))
        .collect()
}

/// Dijkstra from `start`, returning only the vertices it can reach.
fn single_source(
    adjacency: &BTreeMap<usize, Vec<(usize, i64)>>,
    start: usize,
) -> BTreeMap<usize, i64> {
    let mut distances = BTreeMap::new();
    distances.insert(start, 0);

    let mut fringe = BinaryHeap::new();
    fringe.push(Reverse((0, start)));

    while let Some(Reverse((distance, vertex))) = fringe.pop() {
        if distances.get(&vertex).is_some_and(|&best| distance > best) {
            continue;
        }
        let Some(neighbours) = adjacency.get(&vertex) else {
            continue;
        };
        for &(neighbour, weight) in neighbours {
            let relaxed = distance + weight;
            let improves = distances
                .get(&neighbour)
                .is_none_or(|&best| relaxed < best);
            if improves {
                distances.insert(neighbour, relaxed);
                fringe.push(Reverse((relaxed, neighbour)));
            }
        }
    }

    distances
}
