//! Background reduction queue.
//!
//! Callers enqueue input lists without blocking. A single worker thread takes
//! one job at a time, skips it when the repository already has a result for
//! its fingerprint, and otherwise runs the reducer and records the url.
//! Failures go to the error handler and the worker carries on; a failed job
//! is not retried, the next enqueue of the same input set tries again.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use super::process::Reduce;
use crate::cache::ReductionRepository;
use crate::error::ReduceError;
use crate::utils::hash::ContentHash;
use crate::{debug, log};

/// How long the idle worker waits for a job before rechecking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Receives every error the worker catches.
pub type ErrorHandler = Box<dyn Fn(ReduceError) + Send + Sync>;

struct Job {
    /// Names the output artifact.
    key: ContentHash,
    /// Identifies the input list in the repository.
    fingerprint: ContentHash,
    urls: String,
}

struct Worker {
    receiver: Receiver<Job>,
    reducer: Arc<dyn Reduce>,
    repository: Arc<ReductionRepository>,
    on_error: ArcSwapOption<ErrorHandler>,
    shutdown: AtomicBool,
}

/// Unbounded job queue drained by one worker thread.
pub struct ReducingQueue {
    sender: Sender<Job>,
    worker: Arc<Worker>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReducingQueue {
    /// Start the worker. It runs until [`shutdown`](Self::shutdown) or drop.
    pub fn new(reducer: Arc<dyn Reduce>, repository: Arc<ReductionRepository>) -> Self {
        let (sender, receiver) = channel::unbounded();
        let worker = Arc::new(Worker {
            receiver,
            reducer,
            repository,
            on_error: ArcSwapOption::empty(),
            shutdown: AtomicBool::new(false),
        });

        let runner = Arc::clone(&worker);
        let handle = thread::Builder::new()
            .name("css-reduce-queue".into())
            .spawn(move || runner.run())
            .ok();
        if handle.is_none() {
            log!("error"; "failed to spawn reduction worker");
        }

        Self {
            sender,
            worker,
            handle: Mutex::new(handle),
        }
    }

    /// Queue `urls` for reduction under their own fingerprint.
    pub fn enqueue(&self, urls: impl Into<String>) {
        let urls = urls.into();
        let fingerprint = ContentHash::of(&urls);
        self.push(Job {
            key: fingerprint,
            fingerprint,
            urls,
        });
    }

    /// Queue `urls` for reduction, naming the artifact after `key`.
    pub fn enqueue_with_key(&self, key: ContentHash, urls: impl Into<String>) {
        let urls = urls.into();
        let fingerprint = ContentHash::of(&urls);
        self.push(Job {
            key,
            fingerprint,
            urls,
        });
    }

    fn push(&self, job: Job) {
        debug!("queue"; "enqueued {}", job.urls);
        if self.sender.send(job).is_err() {
            log!("error"; "reduction worker is gone, dropping job");
        }
    }

    /// Jobs waiting to be picked up.
    pub fn count(&self) -> usize {
        self.sender.len()
    }

    /// Install the error handler, replacing any previous one.
    pub fn set_error_handler(&self, handler: impl Fn(ReduceError) + Send + Sync + 'static) {
        let handler: ErrorHandler = Box::new(handler);
        self.worker.on_error.store(Some(Arc::new(handler)));
    }

    pub fn clear_error_handler(&self) {
        self.worker.on_error.store(None);
    }

    /// Stop the worker after its current job and wait for it to exit.
    ///
    /// Jobs still queued are dropped.
    pub fn shutdown(&self) {
        self.worker.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReducingQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Worker {
    fn run(&self) {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.receiver.recv_timeout(POLL_INTERVAL) {
                Ok(job) => self.execute(job),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("queue"; "worker stopped");
    }

    fn execute(&self, job: Job) {
        if self.repository.contains(job.fingerprint) {
            debug!("queue"; "already reduced: {}", job.urls);
            return;
        }

        log!("queue"; "reducing {}", job.urls);
        let result = catch_unwind(AssertUnwindSafe(|| self.reducer.reduce(job.key, &job.urls)))
            .unwrap_or_else(|payload| Err(ReduceError::Panicked(panic_message(payload))));

        match result {
            Ok(url) => {
                debug!("queue"; "done: {}", url);
                self.repository.add(job.fingerprint, url);
            }
            Err(e) => self.report(e),
        }
    }

    fn report(&self, error: ReduceError) {
        log!("error"; "{}", error);
        if let Some(handler) = self.on_error.load_full()
            && catch_unwind(AssertUnwindSafe(|| (**handler)(error))).is_err()
        {
            log!("error"; "error handler panicked");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
