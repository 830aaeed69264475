//! The leader–followers worker pool.
//!
//! A fixed roster of workers shares a single FIFO task queue. At any
//! instant exactly one worker, the leader, may dequeue; claiming a task
//! promotes the next worker in the rotation before the task runs, so
//! dispatch is serialised while execution overlaps freely. Submission
//! wakes exactly one waiter (the parked leader); promotion is broadcast to
//! the followers, each of which re-checks whether it now leads.
//!
//! Shutdown is drain-then-exit: workers keep dispatching until the queue
//! is empty, then the full roster is joined.

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex},
    thread::JoinHandle,
};

use tracing::{debug, error};

use super::ExecError;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Task>,
    /// Monotonic dispatch counter; the worker whose identity equals
    /// `leader % roster_size` is the leader.
    leader: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    /// Signalled once per submission; the parked leader waits here.
    task_ready: Condvar,
    /// Broadcast on every promotion and on shutdown; followers wait here.
    promoted: Condvar,
}

/// A fixed-size worker pool with serialised, rotating dispatch.
pub struct LeaderFollowersPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl LeaderFollowersPool {
    /// Starts a pool with `roster_size` workers, identities `0..N`.
    /// Worker 0 leads first.
    #[must_use]
    pub fn new(roster_size: NonZeroUsize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                leader: 0,
                shutdown: false,
            }),
            task_ready: Condvar::new(),
            promoted: Condvar::new(),
        });

        let workers = (0..roster_size.get())
            .map(|identity| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(&shared, identity, roster_size.get()))
            })
            .collect();

        Self { shared, workers }
    }

    /// Appends a task to the shared queue and wakes one waiter.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ShuttingDown`] once shutdown has begun, or
    /// [`ExecError::LockPoisoned`] if a worker panicked while holding the
    /// queue lock.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> Result<(), ExecError> {
        {
            let mut state = self.shared.state.lock().map_err(|_| ExecError::LockPoisoned {
                resource: "leader-followers queue",
            })?;
            if state.shutdown {
                return Err(ExecError::ShuttingDown);
            }
            state.queue.push_back(Box::new(task));
        }
        self.shared.task_ready.notify_one();
        Ok(())
    }

    /// Drains the queue, stops every worker, and joins the roster.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        if let Ok(mut state) = self.shared.state.lock() {
            state.shutdown = true;
        }
        self.shared.task_ready.notify_all();
        self.shared.promoted.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("leader-followers worker panicked during shutdown");
            }
        }
    }
}

impl Drop for LeaderFollowersPool {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

fn worker_loop(shared: &Shared, identity: usize, roster_size: usize) {
    loop {
        let task = {
            let Ok(mut state) = shared.state.lock() else {
                error!(identity, "leader-followers state poisoned; worker exiting");
                return;
            };

            // Follow until promoted.
            while state.leader % roster_size != identity {
                if state.shutdown && state.queue.is_empty() {
                    return;
                }
                state = match shared.promoted.wait(state) {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
            }

            // Lead: block until a task arrives or the drain completes.
            while state.queue.is_empty() {
                if state.shutdown {
                    return;
                }
                state = match shared.task_ready.wait(state) {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
            }

            let Some(task) = state.queue.pop_front() else {
                continue;
            };
            state.leader = state.leader.wrapping_add(1);
            task
        };

        // The queue lock is released; hand leadership over before running.
        shared.promoted.notify_all();

        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(identity, "task panicked; worker continues");
        } else {
            debug!(identity, "task completed");
        }
    }
}
