//! Per-client state slots.
//!
//! Every connection owns one [`ClientSlot`] holding its graph and the most
//! recent solve result. The id-to-slot map is only ever touched for
//! lookup, insertion, and removal; mutation happens under the slot's own
//! mutex, so no client can stall another through the map.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use spanner_core::{Graph, MstResult};

/// Identifies one accepted connection for the lifetime of its handler.
pub(crate) type ClientId = u64;

/// The state owned by a single client connection.
#[derive(Debug, Default)]
pub(crate) struct ClientSlot {
    /// The client's graph; replaced wholesale by `NewGraph`.
    pub(crate) graph: Graph,
    /// The most recent solve result. Lives until the next `SolveMST` or
    /// disconnect; reply tasks keep their own reference.
    pub(crate) last_result: Option<Arc<MstResult>>,
}

/// The id-to-slot map shared between the listener and the handlers.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    slots: DashMap<ClientId, Arc<Mutex<ClientSlot>>>,
}

impl Registry {
    /// Creates a fresh slot for `client` and returns a handle to it.
    pub(crate) fn register(&self, client: ClientId) -> Arc<Mutex<ClientSlot>> {
        let slot = Arc::new(Mutex::new(ClientSlot::default()));
        self.slots.insert(client, Arc::clone(&slot));
        slot
    }

    /// Discards the slot of a disconnected client.
    pub(crate) fn remove(&self, client: ClientId) {
        self.slots.remove(&client);
    }

    /// Returns the number of connected clients.
    pub(crate) fn client_count(&self) -> usize {
        self.slots.len()
    }
}
