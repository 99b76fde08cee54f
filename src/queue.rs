//! # Operation Serializer
//!
//! One FIFO queue per store instance, drained by one worker thread. Jobs run
//! strictly in submission order and never overlap, so backends need no
//! per-path locking: conflicting intents are resolved by ordering plus each
//! operation's own existence checks.
//!
//! A job that fails or panics does not stop the worker. Its failure is
//! delivered only through its own [`Pending`].
//!
//! ```rust
//! use vfstore::{FsRead, FsWrite, OperationQueue, TreeNodeStore};
//!
//! let queue = OperationQueue::new(TreeNodeStore::new());
//! let write = queue.submit(|fs| fs.write("/a.txt", "one"));
//! let read = queue.submit(|fs| fs.read_to_string("/a.txt"));
//! write.wait().unwrap();
//! assert_eq!(read.wait().unwrap(), "one");
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::FsError;

type Job<B> = Box<dyn FnOnce(&B) + Send + 'static>;

/// FIFO executor owning a backend.
pub struct OperationQueue<B: Send + Sync + 'static> {
    backend: Arc<B>,
    sender: Option<Sender<Job<B>>>,
    worker: Option<JoinHandle<()>>,
    submitted: AtomicU64,
}

impl<B: Send + Sync + 'static> OperationQueue<B> {
    /// Take ownership of `backend` and start the worker.
    pub fn new(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Start a worker over a shared backend.
    ///
    /// Anything else holding the `Arc` can reach the backend without going
    /// through the queue and loses the ordering guarantee.
    pub fn from_arc(backend: Arc<B>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job<B>>();
        let worker_backend = Arc::clone(&backend);
        let worker = std::thread::spawn(move || drain(worker_backend.as_ref(), &receiver));
        Self {
            backend,
            sender: Some(sender),
            worker: Some(worker),
            submitted: AtomicU64::new(0),
        }
    }

    /// The backend this queue serializes.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Enqueue `f` without waiting for it to run.
    pub fn submit<R, F>(&self, f: F) -> Pending<R>
    where
        R: Send + 'static,
        F: FnOnce(&B) -> Result<R, FsError> + Send + 'static,
    {
        let (reply, receiver) = crossbeam_channel::bounded(1);
        let seq = self.submitted.fetch_add(1, Ordering::Relaxed);

        let job: Job<B> = Box::new(move |backend: &B| {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| f(backend))) {
                Ok(result) => result,
                Err(payload) => Err(FsError::Internal(panic_message(payload.as_ref()))),
            };
            // The caller may have dropped its Pending.
            let _ = reply.send(outcome);
        });

        tracing::trace!(seq, "operation queued");
        if let Some(sender) = &self.sender {
            if sender.send(job).is_err() {
                tracing::error!(seq, "operation queue worker is gone");
            }
        }
        Pending { receiver }
    }

    /// Enqueue `f` and block until it has run.
    pub fn run<R, F>(&self, f: F) -> Result<R, FsError>
    where
        R: Send + 'static,
        F: FnOnce(&B) -> Result<R, FsError> + Send + 'static,
    {
        self.submit(f).wait()
    }
}

impl<B: Send + Sync + 'static> Drop for OperationQueue<B> {
    /// Close the queue and let the worker finish what is already queued.
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("operation queue worker panicked");
            }
        }
    }
}

fn drain<B>(backend: &B, receiver: &Receiver<Job<B>>) {
    for job in receiver.iter() {
        job(backend);
    }
    tracing::debug!("operation queue drained");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("operation panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("operation panicked: {s}")
    } else {
        "operation panicked".to_string()
    }
}

/// The eventual result of a submitted operation.
#[must_use = "a Pending does nothing unless waited on"]
pub struct Pending<R> {
    receiver: Receiver<Result<R, FsError>>,
}

impl<R> Pending<R> {
    /// Block until the operation has run and return its result.
    pub fn wait(self) -> Result<R, FsError> {
        self.receiver.recv().unwrap_or_else(|_| {
            Err(FsError::Internal(
                "operation was dropped before running".into(),
            ))
        })
    }
}
