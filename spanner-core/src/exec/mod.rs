//! Concurrent execution cores for reply delivery.
//!
//! Two interchangeable substrates sit between MST computation and the
//! socket write:
//!
//! - [`LeaderFollowersPool`]: a fixed roster of workers sharing one FIFO
//!   queue, with exactly one worker (the leader) dispatching at a time and
//!   leadership rotating round-robin after every dispatch.
//! - [`Pipeline`]: a fixed sequence of stages, one worker and one private
//!   queue per stage, every task visiting every stage in order.
//!
//! Neither core lets an error escape a worker: task panics are caught and
//! logged so one bad reply cannot take a substrate down.

mod leader_followers;
mod pipeline;

pub use leader_followers::LeaderFollowersPool;
pub use pipeline::{Pipeline, StageFn};

/// Errors surfaced by the execution cores.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ExecError {
    /// The core is shutting down and no longer accepts work.
    #[error("the execution core is shutting down")]
    ShuttingDown,
    /// A pipeline needs at least one stage.
    #[error("a pipeline requires at least one stage")]
    EmptyPipeline,
    /// A synchronisation primitive became poisoned after a panic.
    #[error("lock for {resource} is poisoned")]
    LockPoisoned {
        /// Name of the poisoned resource.
        resource: &'static str,
    },
}
