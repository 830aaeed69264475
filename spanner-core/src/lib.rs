//! Spanner core library.
//!
//! Everything the MST compute server needs below the socket layer: the
//! per-client graph store, the Prim and Kruskal solvers with their tree
//! metrics, the line-oriented wire protocol, and the two concurrency cores
//! (a leader–followers worker pool and a staged pipeline) that deliver
//! replies.

mod graph;
mod mst;
mod protocol;
mod tree;

pub mod exec;

pub use crate::{
    graph::{Edge, Graph},
    mst::{Algorithm, SolveError, SolveErrorCode, solve},
    protocol::{
        FrameError, MAX_COMMAND_BYTES, ParseError, Request, parse_request, read_frame,
        write_frame,
    },
    tree::{MstResult, ShortestPathMap, UNREACHABLE},
};
