//! Spanner server library.
//!
//! Hosts the TCP listener, per-connection handlers, and the glue that ships
//! solved MST results through one of the two concurrency cores provided by
//! `spanner-core`. The binary in `main.rs` is a thin wrapper over
//! [`server::Server`] plus logging and signal wiring.

pub mod logging;
pub mod server;
