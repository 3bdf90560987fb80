// SPDX-License-Identifier: MPL-2.0

//! The thread scheduler and dispatcher of the Nachos teaching kernel.
//!
//! The kernel runs on one simulated CPU (see [`nachos_machine`]). Disabling
//! interrupts is the only mutual exclusion it relies on, and the only place
//! where a thread stops executing is the context switch inside
//! [`Scheduler::run`](sched::Scheduler::run).
//!
//! The top-level object is [`Kernel`]: it owns the machine, the thread table
//! and the scheduler, and provides the thread operations (spawn, yield, sleep,
//! finish) and the timer interrupt handler.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod error;
mod prelude;
mod runtime;
pub mod sched;
pub mod thread;

#[cfg(test)]
mod test_util;

pub use self::{
    config::KernelConfig,
    error::{Errno, Error},
    runtime::Kernel,
};

pub type Result<T> = core::result::Result<T, Error>;
