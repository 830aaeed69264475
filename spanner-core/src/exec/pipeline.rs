//! The staged pipeline (pipelined active object).
//!
//! A fixed sequence of stages, each owning a private queue and a dedicated
//! worker, connected head to tail by channels. Every task enters at stage 0
//! and visits every stage in order; the final stage releases it. Channel
//! semantics give each stage strict FIFO processing and guarantee a task is
//! owned by exactly one stage at any instant, while the per-stage workers
//! let as many tasks be in flight as there are stages.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{Receiver, Sender, channel},
    thread::JoinHandle,
};

use tracing::error;

use super::ExecError;

/// A stage transformation applied to each task passing through.
pub type StageFn<T> = Box<dyn FnMut(&mut T) + Send + 'static>;

enum Message<T> {
    Task(T),
    Shutdown,
}

/// A linear chain of worker-owned stages.
pub struct Pipeline<T: Send + 'static> {
    head: Sender<Message<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Starts one worker per stage function, chained in order.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::EmptyPipeline`] when no stages are supplied.
    pub fn new(stages: Vec<StageFn<T>>) -> Result<Self, ExecError> {
        let stage_count = stages.len();
        let mut next: Option<Sender<Message<T>>> = None;
        let mut workers = Vec::with_capacity(stage_count);

        // Wire the chain tail-first so each worker already knows its
        // successor's queue when it starts.
        for (index, stage) in stages.into_iter().enumerate().rev() {
            let (sender, receiver) = channel();
            let successor = next.take();
            workers.push(std::thread::spawn(move || {
                stage_loop(index, receiver, stage, successor);
            }));
            next = Some(sender);
        }

        let head = next.ok_or(ExecError::EmptyPipeline)?;
        workers.reverse();
        Ok(Self { head, workers })
    }

    /// Enqueues a task at stage 0.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ShuttingDown`] when stage 0 is no longer
    /// receiving.
    pub fn submit(&self, task: T) -> Result<(), ExecError> {
        self.head
            .send(Message::Task(task))
            .map_err(|_| ExecError::ShuttingDown)
    }

    /// Flushes queued tasks through every stage, then joins the workers.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        // The marker drains each queue in FIFO order before the stage exits.
        if self.head.send(Message::Shutdown).is_err() {
            error!("pipeline head hung up before shutdown");
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("pipeline stage worker panicked during shutdown");
            }
        }
    }
}

impl<T: Send + 'static> Drop for Pipeline<T> {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

fn stage_loop<T>(
    index: usize,
    receiver: Receiver<Message<T>>,
    mut stage: StageFn<T>,
    successor: Option<Sender<Message<T>>>,
) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Task(mut task) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| stage(&mut task)));
                if outcome.is_err() {
                    error!(stage = index, "stage function panicked; task passed on as-is");
                }
                if let Some(successor) = &successor {
                    if successor.send(Message::Task(task)).is_err() {
                        error!(stage = index, "next stage hung up; task dropped");
                        return;
                    }
                }
            }
            Message::Shutdown => {
                if let Some(successor) = &successor {
                    // Propagate so downstream stages drain in turn.
                    let _ = successor.send(Message::Shutdown);
                }
                return;
            }
        }
    }
}
