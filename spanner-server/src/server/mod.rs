//! The TCP listener and server lifecycle.
//!
//! [`Server::bind`] creates the listening socket and the configured reply
//! core; [`Server::run`] accepts connections until the shutdown handle is
//! triggered, then joins every handler and drains the core. The reply core,
//! the registry, and the running flag are all values owned here and passed
//! down explicitly; only the Ctrl-C wiring in `main` sees the
//! [`ShutdownHandle`].

mod connection;
mod registry;
mod reply;

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, TcpListener},
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use clap::ValueEnum;
use spanner_core::exec::{ExecError, LeaderFollowersPool, Pipeline};
use tracing::{error, info, warn};

use self::{registry::Registry, reply::ReplyCore};

/// How long the accept loop sleeps between polls of an idle socket.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default leader–followers roster size.
const DEFAULT_WORKERS: usize = 4;

/// Which concurrency core delivers `SolveMST` replies.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ConcurrencyMode {
    /// Leader–followers worker pool; short single-step replies.
    #[value(name = "lf")]
    LeaderFollowers,
    /// Five-stage pipeline; full metric replies.
    #[value(name = "pipeline")]
    Pipeline,
}

/// Server configuration.
#[derive(Clone, Copy, Debug)]
pub struct ServerConfig {
    port: u16,
    mode: ConcurrencyMode,
    workers: NonZeroUsize,
}

impl ServerConfig {
    /// Creates a configuration for `port` (0 selects an ephemeral port)
    /// with the pipeline core and the default roster size.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            port,
            mode: ConcurrencyMode::Pipeline,
            workers: NonZeroUsize::new(DEFAULT_WORKERS)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Selects the reply delivery core.
    #[must_use]
    pub fn with_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the leader–followers roster size.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }
}

/// Errors raised while starting or running the server.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServerError {
    /// The listening socket could not be created or bound.
    #[error("failed to bind 0.0.0.0:{port}: {source}")]
    Bind {
        /// The requested port.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The listening socket rejected configuration.
    #[error("failed to configure the listening socket: {source}")]
    Configure {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// A reply core could not be constructed.
    #[error(transparent)]
    Core(#[from] ExecError),
}

/// Flips the server's running flag; safe to trigger from a signal handler.
#[derive(Clone, Debug)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Requests a cooperative shutdown; the accept loop observes it on its
    /// next poll.
    pub fn shutdown(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The MST compute server.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    core: Arc<ReplyCore>,
    registry: Arc<Registry>,
    running: Arc<AtomicBool>,
}

impl Server {
    /// Binds the listening socket and starts the configured reply core.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the socket cannot be created or
    /// bound, or [`ServerError::Core`] when the core cannot start.
    pub fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port)).map_err(
            |source| ServerError::Bind {
                port: config.port,
                source,
            },
        )?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Configure { source })?;
        // Non-blocking accept lets the loop observe the running flag.
        listener
            .set_nonblocking(true)
            .map_err(|source| ServerError::Configure { source })?;

        let core = match config.mode {
            ConcurrencyMode::LeaderFollowers => {
                ReplyCore::LeaderFollowers(LeaderFollowersPool::new(config.workers))
            }
            ConcurrencyMode::Pipeline => {
                ReplyCore::Pipeline(Pipeline::new(reply::pipeline_stages())?)
            }
        };

        Ok(Self {
            listener,
            local_addr,
            core: Arc::new(core),
            registry: Arc::new(Registry::default()),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Returns the bound address (useful with an ephemeral port).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a handle that stops the accept loop when triggered.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.running))
    }

    /// Accepts connections until shutdown, then joins every handler and
    /// drains the reply core.
    ///
    /// # Errors
    ///
    /// Currently infallible after a successful bind; the signature leaves
    /// room for fatal accept states.
    pub fn run(self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr, "server listening");

        let mut handlers: Vec<JoinHandle<()>> = Vec::new();
        let mut next_client: registry::ClientId = 0;

        while self.running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(err) = stream.set_nonblocking(false) {
                        warn!(%peer, error = %err, "failed to configure client socket");
                        continue;
                    }
                    next_client += 1;
                    let client = next_client;
                    info!(client, %peer, clients = self.registry.client_count() + 1, "client connected");

                    let registry = Arc::clone(&self.registry);
                    let core = Arc::clone(&self.core);
                    handlers.push(thread::spawn(move || {
                        connection::handle_client(client, stream, &registry, &core);
                    }));
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(err) => {
                    warn!(error = %err, "accept failed");
                }
            }
        }

        info!("shutdown requested; no longer accepting connections");
        drop(self.listener);

        for handler in handlers {
            if handler.join().is_err() {
                error!("connection handler panicked");
            }
        }

        match Arc::try_unwrap(self.core) {
            Ok(core) => core.shutdown(),
            Err(_) => error!("reply core still referenced after handler join; skipping drain"),
        }

        info!("server stopped");
        Ok(())
    }
}
