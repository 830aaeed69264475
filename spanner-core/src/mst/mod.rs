//! Minimum spanning tree solvers.
//!
//! Two interchangeable algorithms (Prim and Kruskal) consume a client
//! graph's directed entry list and produce the same spanning forest shape:
//! each undirected edge at most once, `V - c` edges for `V` vertices and
//! `c` components. [`solve`] validates the graph, dispatches on the
//! requested [`Algorithm`], and attaches the tree metrics.

mod kruskal;
mod prim;
mod union_find;

use tracing::instrument;

use crate::{graph::Graph, tree::MstResult};

/// The MST algorithm requested by a client.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    /// Prim's algorithm.
    Prim,
    /// Kruskal's algorithm.
    Kruskal,
}

impl Algorithm {
    /// Parses the wire name of an algorithm.
    ///
    /// Matching is exact; the protocol does not fold case.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Prim" => Some(Self::Prim),
            "Kruskal" => Some(Self::Kruskal),
            _ => None,
        }
    }

    /// Returns the wire name of the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prim => "Prim",
            Self::Kruskal => "Kruskal",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned while computing a minimum spanning tree/forest.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SolveError {
    /// An edge referenced a vertex that is not present in the graph.
    #[error("edge references vertex {vertex}, but vertex_count is {vertex_count}")]
    VertexOutOfRange {
        /// The offending vertex index.
        vertex: usize,
        /// The number of vertices in the graph.
        vertex_count: usize,
    },
}

impl SolveError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> SolveErrorCode {
        match self {
            Self::VertexOutOfRange { .. } => SolveErrorCode::VertexOutOfRange,
        }
    }
}

/// Machine-readable error codes for [`SolveError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SolveErrorCode {
    /// An edge referenced a vertex that is not present in the graph.
    VertexOutOfRange,
}

impl SolveErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VertexOutOfRange => "VERTEX_OUT_OF_RANGE",
        }
    }
}

/// Computes the minimum spanning forest of `graph` and its tree metrics.
///
/// An empty or edgeless graph is not an error: the result carries an empty
/// edge set and zero metrics.
///
/// # Errors
///
/// Returns [`SolveError::VertexOutOfRange`] when any edge endpoint lies
/// outside `[0, vertex_count)`.
#[instrument(skip(graph), fields(vertices = graph.vertex_count(), entries = graph.edges().len()))]
pub fn solve(algorithm: Algorithm, graph: &Graph) -> Result<MstResult, SolveError> {
    let vertex_count = graph.vertex_count();
    for edge in graph.edges() {
        for vertex in [edge.source(), edge.target()] {
            if vertex >= vertex_count {
                return Err(SolveError::VertexOutOfRange {
                    vertex,
                    vertex_count,
                });
            }
        }
    }

    let forest = match algorithm {
        Algorithm::Prim => prim::minimum_spanning_forest(graph),
        Algorithm::Kruskal => kruskal::minimum_spanning_forest(graph),
    };
    Ok(MstResult::from_edges(forest))
}

#[cfg(test)]
mod property;
