// SPDX-License-Identifier: MPL-2.0

//! The simulated machine underneath the Nachos kernel.
//!
//! This crate plays the role that real hardware plus a thin OS framework play
//! for a bare-metal kernel: it provides the interrupt mask, the tick counter,
//! the execution-context transfer primitive, the kernel command line, and the
//! console logger. Everything here is safe Rust; simulated threads are backed
//! by host threads (see [`task::HostSwitch`]).

#![deny(unsafe_code)]

extern crate alloc;

pub mod boot;
mod error;
pub mod irq;
pub mod logger;
pub mod stats;
pub mod task;

use alloc::sync::Arc;

pub use self::error::{Error, Result};
use self::{irq::Interrupt, stats::Statistics, task::ContextSwitch};

/// One simulated CPU together with its devices.
///
/// A kernel owns exactly one `Machine` and shares it with every component
/// that needs to mask interrupts, read the clock, or transfer execution.
pub struct Machine {
    interrupt: Interrupt,
    stats: Statistics,
    switcher: Arc<dyn ContextSwitch>,
}

impl Machine {
    /// Creates a machine that transfers execution with `switcher`.
    ///
    /// Interrupts start disabled, as they do on a CPU coming out of reset.
    pub fn new(switcher: Arc<dyn ContextSwitch>) -> Self {
        Self {
            interrupt: Interrupt::new(),
            stats: Statistics::new(),
            switcher,
        }
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn switcher(&self) -> &dyn ContextSwitch {
        &*self.switcher
    }

    /// Stops the machine after printing the accumulated statistics.
    ///
    /// There is nothing left to run on the simulated CPU, so this never
    /// returns.
    pub fn halt(&self, reason: &str) -> ! {
        log::info!("machine halting: {}", reason);
        self.stats.print();
        panic!("machine halted: {}", reason);
    }
}
