//! Property tests over randomly generated graphs.
//!
//! The generators build a random spanning tree first so connectivity is
//! guaranteed by construction, then sprinkle extra edges on top. Distinct
//! weights make the minimum spanning forest unique, which is what lets the
//! Prim/Kruskal agreement property compare edge identifiers directly.

use proptest::prelude::*;

use crate::Graph;

use super::{Algorithm, solve, union_find::DisjointSet};

fn edge_pairs() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..12).prop_flat_map(|vertex_count| {
        (
            Just(vertex_count),
            prop::collection::vec(any::<prop::sample::Index>(), vertex_count - 1),
            prop::collection::vec((0..vertex_count, 0..vertex_count), 0..=vertex_count),
        )
            .prop_map(|(vertex_count, parents, extras)| {
                let mut pairs = Vec::new();
                for (vertex, parent) in (1..vertex_count).zip(parents) {
                    pairs.push((parent.index(vertex), vertex));
                }
                for (left, right) in extras {
                    if left != right {
                        pairs.push((left, right));
                    }
                }
                (vertex_count, pairs)
            })
    })
}

/// Connected graphs whose edge weights are pairwise distinct.
fn connected_distinct_weight_graphs() -> impl Strategy<Value = Graph> {
    edge_pairs()
        .prop_flat_map(|(vertex_count, pairs)| {
            let weights: Vec<i64> = (1..=pairs.len() as i64).collect();
            (Just(vertex_count), Just(pairs), Just(weights).prop_shuffle())
        })
        .prop_map(|(vertex_count, pairs, weights)| {
            let mut graph = Graph::new(vertex_count);
            for (&(source, target), weight) in pairs.iter().zip(weights) {
                graph.add_edge(source, target, weight);
            }
            graph
        })
}

/// Connected graphs whose edge weights collide freely.
fn connected_duplicate_weight_graphs() -> impl Strategy<Value = Graph> {
    edge_pairs()
        .prop_flat_map(|(vertex_count, pairs)| {
            let count = pairs.len();
            (
                Just(vertex_count),
                Just(pairs),
                prop::collection::vec(1i64..=4, count),
            )
        })
        .prop_map(|(vertex_count, pairs, weights)| {
            let mut graph = Graph::new(vertex_count);
            for (&(source, target), weight) in pairs.iter().zip(weights) {
                graph.add_edge(source, target, weight);
            }
            graph
        })
}

fn assert_acyclic(vertex_count: usize, edges: &[crate::Edge]) {
    let mut components = DisjointSet::new(vertex_count);
    for edge in edges {
        assert!(
            components.unite(edge.source(), edge.target()),
            "edge ({}, {}) closes a cycle",
            edge.source(),
            edge.target()
        );
    }
}

proptest! {
    #[test]
    fn solvers_agree_edge_for_edge_on_distinct_weights(
        graph in connected_distinct_weight_graphs()
    ) {
        let prim = solve(Algorithm::Prim, &graph).expect("Prim must succeed");
        let kruskal = solve(Algorithm::Kruskal, &graph).expect("Kruskal must succeed");

        let mut prim_ids: Vec<u64> = prim.edges().iter().map(|edge| edge.id()).collect();
        let mut kruskal_ids: Vec<u64> = kruskal.edges().iter().map(|edge| edge.id()).collect();
        prim_ids.sort_unstable();
        kruskal_ids.sort_unstable();
        prop_assert_eq!(prim_ids, kruskal_ids);
    }

    #[test]
    fn solvers_agree_on_total_weight(graph in connected_duplicate_weight_graphs()) {
        let prim = solve(Algorithm::Prim, &graph).expect("Prim must succeed");
        let kruskal = solve(Algorithm::Kruskal, &graph).expect("Kruskal must succeed");

        prop_assert_eq!(prim.total_weight(), kruskal.total_weight());
    }

    #[test]
    fn connected_input_yields_a_spanning_tree(
        graph in connected_duplicate_weight_graphs()
    ) {
        let result = solve(Algorithm::Kruskal, &graph).expect("Kruskal must succeed");

        prop_assert_eq!(result.edges().len(), graph.vertex_count() - 1);
        assert_acyclic(graph.vertex_count(), result.edges());
    }

    #[test]
    fn distances_are_symmetric_with_zero_self_distance(
        graph in connected_duplicate_weight_graphs()
    ) {
        let result = solve(Algorithm::Prim, &graph).expect("Prim must succeed");

        for (&from, row) in result.shortest_distances() {
            prop_assert_eq!(result.shortest_distance(from, from), 0);
            for (&to, &distance) in row {
                prop_assert_eq!(result.shortest_distance(to, from), distance);
            }
        }
    }
}
