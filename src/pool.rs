//! A fixed-size worker pool consuming a FIFO task queue.
//!
//! `N` long-lived worker threads service a shared queue: an
//! `mpsc::Receiver` behind a `Mutex` stands in for a condvar-guarded
//! queue, since `mpsc::Sender::send` already supplies the "wake one
//! worker" signal a `submit` needs.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use thiserror::Error;

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("worker pool is stopping; task rejected")]
pub struct PoolStoppingError;

/// A bounded set of worker threads draining a shared task queue.
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads, each looping on the shared receiver
    /// until the channel is closed (i.e. until `stop` drops the sender).
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "worker pool needs at least one thread");

        let (sender, receiver) = mpsc::channel::<Task>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("snmp-worker-{id}"))
                    .spawn(move || Self::worker_loop(id, receiver))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        WorkerPool {
            sender: Some(sender),
            workers,
        }
    }

    fn worker_loop(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Task>>>) {
        loop {
            // The lock is only held long enough to pull one task off the
            // queue; the task itself (decode/MIB/encode/send) runs
            // outside the lock so workers don't serialize on each other.
            let task = {
                let guard = receiver.lock().expect("worker pool queue lock poisoned");
                guard.recv()
            };
            match task {
                Ok(task) => task(),
                Err(_) => {
                    log::debug!("worker {id} exiting: task queue closed");
                    break;
                }
            }
        }
    }

    /// Appends `task` to the queue and wakes one worker. Errors if the
    /// pool is stopping (the sender has already been dropped).
    pub fn submit<F>(&self, task: F) -> Result<(), PoolStoppingError>
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.sender {
            Some(sender) => sender.send(Box::new(task)).map_err(|_| PoolStoppingError),
            None => Err(PoolStoppingError),
        }
    }

    /// A cheap, `Clone`-able, `Send` handle that can submit tasks without
    /// holding a reference to the pool itself, used to hand the listener
    /// thread a way to enqueue work without sharing `&WorkerPool` across
    /// the thread boundary.
    pub fn handle(&self) -> PoolHandle {
        PoolHandle(self.sender.clone())
    }

    /// Marks the pool stopping (no further `submit` succeeds), lets every
    /// worker drain whatever is left in the queue, then joins all worker
    /// threads before returning.
    pub fn stop(&mut self) {
        // Dropping the sender closes the channel: once the queue is
        // empty, every worker's blocking `recv` returns `Err` and the
        // worker exits.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A cloneable submission handle independent of the pool's own lifetime.
#[derive(Clone)]
pub struct PoolHandle(Option<mpsc::Sender<Task>>);

impl PoolHandle {
    pub fn submit<F>(&self, task: F) -> Result<(), PoolStoppingError>
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.0 {
            Some(sender) => sender.send(Box::new(task)).map_err(|_| PoolStoppingError),
            None => Err(PoolStoppingError),
        }
    }
}
