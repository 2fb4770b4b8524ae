//! Background work dispatch.
//!
//! Player callbacks must return immediately, so every network call runs on
//! a [`TaskPool`] worker. The router hands work over through [`TaskSink`].

pub mod pool;
pub mod tasks;

pub use pool::TaskPool;
pub use tasks::{run_task, BackgroundTask, DrainHook, RecommendationHook, TaskContext};

use crate::error::Result;

/// Accepts background tasks without blocking the caller.
pub trait TaskSink: Send + Sync {
    fn submit(&self, task: BackgroundTask) -> Result<()>;
}

impl TaskSink for TaskPool<BackgroundTask> {
    fn submit(&self, task: BackgroundTask) -> Result<()> {
        TaskPool::submit(self, task)
    }
}
