use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};

/// Owns a dedicated thread running a fallible task to completion, with a single-use channel
/// carrying the outcome back. The owner can poll for a captured failure without blocking, or
/// close the worker to join it and surface the final result. Dropping the worker joins the
/// thread unconditionally so it never leaks.
pub struct Worker {
    handle: Option<JoinHandle<()>>,
    outcome: Receiver<Result<()>>,
}

impl Worker {
    pub fn spawn<F>(task: F) -> Worker
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let (tx, rx) = channel();
        let handle = thread::spawn(move || {
            let outcome = match catch_unwind(AssertUnwindSafe(task)) {
                Ok(result) => result,
                Err(payload) => Err(anyhow!("worker panicked: {}", panic_message(&payload))),
            };
            // The owner may have dropped the receiver already; the outcome is lost then.
            let _ = tx.send(outcome);
        });
        Worker {
            handle: Some(handle),
            outcome: rx,
        }
    }

    /// Poll for a captured failure without blocking. A failure is surfaced at most once; a worker
    /// still running (or one that already reported) checks out clean.
    pub fn check_for_failure(&mut self) -> Result<()> {
        match self.outcome.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(()),
        }
    }

    /// Wait for the task to finish, join the thread, and surface the final outcome.
    pub fn close(mut self) -> Result<()> {
        let outcome = self.outcome.recv().unwrap_or(Ok(()));
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(anyhow!("worker thread panicked"));
            }
        }
        outcome
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
