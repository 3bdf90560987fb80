// SPDX-License-Identifier: MPL-2.0

use super::Thread;
use crate::{prelude::*, sched::BurstTime, Kernel};

type ThreadFn = Box<dyn FnOnce(&Arc<Kernel>) + Send + 'static>;

/// Options to create and spawn a new kernel thread.
///
/// ```ignore
/// let id = ThreadOptions::new(|kernel| kernel.sleep(3))
///     .name("sleeper")
///     .spawn(&kernel)?;
/// ```
pub struct ThreadOptions {
    func: ThreadFn,
    name: Option<String>,
    burst_time: BurstTime,
}

impl ThreadOptions {
    pub fn new<F>(func: F) -> Self
    where
        F: FnOnce(&Arc<Kernel>) + Send + 'static,
    {
        Self {
            func: Box::new(func),
            name: None,
            burst_time: BurstTime::ZERO,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the initial burst-time estimate.
    pub fn burst_time(mut self, burst_time: BurstTime) -> Self {
        self.burst_time = burst_time;
        self
    }

    /// Creates the thread and makes it ready to run.
    ///
    /// The thread runs its function and then finishes.
    pub fn spawn(self, kernel: &Arc<Kernel>) -> Result<ThreadId> {
        let Self {
            func,
            name,
            burst_time,
        } = self;

        let id = kernel.threads().insert(|id| {
            let name = name.unwrap_or_else(|| alloc::format!("thread-{}", id.as_u32()));
            Thread::new(id, name, burst_time)
        })?;

        let thread_kernel = kernel.clone();
        let entry = Box::new(move || {
            thread_kernel.thread_begin();
            func(&thread_kernel);
            thread_kernel.finish();
        });
        if let Err(err) = kernel.machine().switcher().stack_allocate(id, entry) {
            kernel.threads().remove(id);
            return Err(err.into());
        }

        let _guard = kernel.machine().interrupt().disable_local();
        kernel.scheduler().ready_to_run(id);
        Ok(id)
    }
}
