// SPDX-License-Identifier: MPL-2.0

//! Kernel threads as seen by the scheduler.

use self::status::ThreadStatus;
use crate::{prelude::*, sched::BurstTime};

pub mod kernel_thread;
pub mod status;
mod table;

pub use self::{kernel_thread::ThreadOptions, table::ThreadTable};

/// The control block of a thread.
///
/// Threads live in a [`ThreadTable`] and are referred to by [`ThreadId`]
/// everywhere else.
#[derive(Debug)]
pub struct Thread {
    id: ThreadId,
    name: String,
    status: ThreadStatus,
    burst_time: BurstTime,
    /// The tick at which the current run segment began.
    start_time: u64,
}

impl Thread {
    pub fn new(id: ThreadId, name: String, burst_time: BurstTime) -> Self {
        Self {
            id,
            name,
            status: ThreadStatus::Init,
            burst_time,
            start_time: 0,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ThreadStatus {
        self.status
    }

    /// Updates the status with the `new` value.
    ///
    /// # Panics
    ///
    /// Panics if the thread cannot move from its current status to `new`.
    pub fn set_status(&mut self, new: ThreadStatus) {
        assert!(
            self.status.can_become(new),
            "thread {} ({}) cannot go from {:?} to {:?}",
            self.id,
            self.name,
            self.status,
            new
        );
        self.status = new;
    }

    pub fn burst_time(&self) -> BurstTime {
        self.burst_time
    }

    pub fn set_burst_time(&mut self, burst_time: BurstTime) {
        self.burst_time = burst_time;
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn set_start_time(&mut self, tick: u64) {
        self.start_time = tick;
    }
}
