//! Bounded worker pool.
//!
//! Tasks go through a bounded channel shared by a fixed set of std threads.
//! Submitting never blocks: when every slot is taken the task is refused
//! with `QUEUE_FULL`. A panicking handler is caught so the worker keeps
//! serving the queue.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::error::{ErrorCode, Result, ScrobblerError};

/// A fixed-size pool of workers fed by a bounded queue.
pub struct TaskPool<T: Send + 'static> {
    /// `None` once the pool has been shut down.
    sender: Option<SyncSender<T>>,
    workers: Vec<JoinHandle<()>>,
    capacity: usize,
}

impl<T: Send + 'static> TaskPool<T> {
    /// Starts `workers` threads, each calling `handler` for the tasks it receives.
    ///
    /// At most `capacity` tasks wait in the queue; tasks being processed do
    /// not count against it.
    pub fn new<F>(workers: usize, capacity: usize, handler: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel::<T>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);

        let workers = (0..workers.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                thread::spawn(move || Self::worker_loop(receiver, handler))
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            capacity,
        }
    }

    /// Queues `task` without blocking.
    pub fn submit(&self, task: T) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ScrobblerError::new(ErrorCode::QueueFull, "Task pool is shut down"))?;
        match sender.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ScrobblerError::queue_full(self.capacity)),
            Err(TrySendError::Disconnected(_)) => Err(ScrobblerError::new(
                ErrorCode::QueueFull,
                "Task pool workers have exited",
            )),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting tasks, lets the workers finish what is queued and joins them.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            handle.join().ok();
        }
        debug!("Task pool stopped");
    }

    fn worker_loop<F>(receiver: Arc<Mutex<Receiver<T>>>, handler: Arc<F>)
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        loop {
            let next = {
                let receiver = match receiver.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                receiver.recv()
            };
            let task = match next {
                Ok(task) => task,
                // All senders dropped: the pool is shutting down.
                Err(_) => break,
            };
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| handler(task))) {
                error!("Background task panicked: {}", panic_message(panic.as_ref()));
            }
        }
    }
}

impl<T: Send + 'static> Drop for TaskPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn runs_every_task() {
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let mut pool = TaskPool::new(3, 16, move |n: usize| {
            counter.fetch_add(n, Ordering::SeqCst);
        });
        for n in 1..=10 {
            pool.submit(n).unwrap();
        }
        pool.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 55);
    }

    #[test]
    fn full_queue_refuses_without_blocking() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let started_tx = Mutex::new(started_tx);

        let mut pool = TaskPool::new(1, 1, move |_: u8| {
            started_tx.lock().unwrap().send(()).unwrap();
            release_rx.lock().unwrap().recv().ok();
        });

        pool.submit(1).unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        // The worker is busy; one task fits in the queue.
        pool.submit(2).unwrap();
        let err = pool.submit(3).unwrap_err();
        assert_eq!(err.code, ErrorCode::QueueFull);

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
        pool.shutdown();
    }

    #[test]
    fn panicking_task_does_not_kill_worker() {
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let mut pool = TaskPool::new(1, 4, move |n: u32| {
            if n == 0 {
                panic!("boom");
            }
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pool.submit(0).unwrap();
        pool.submit(1).unwrap();
        pool.submit(2).unwrap();
        pool.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let mut pool = TaskPool::new(2, 2, |_: ()| {});
        assert_eq!(pool.worker_count(), 2);
        assert_eq!(pool.capacity(), 2);
        pool.shutdown();
        pool.shutdown();
        assert!(pool.submit(()).is_err());
    }

    #[test]
    fn panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
