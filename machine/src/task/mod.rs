// SPDX-License-Identifier: MPL-2.0

//! Execution contexts and the primitive that transfers the CPU between them.

mod host;

use core::fmt;

pub use self::host::HostSwitch;
use crate::Result;

/// The identity of a simulated thread.
///
/// It is a handle into the kernel's thread table, not an owning pointer: a
/// thread can be marked for destruction while its id is still in use.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ThreadId(u32);

impl ThreadId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The code a new thread starts executing.
pub type ThreadEntry = Box<dyn FnOnce() + Send + 'static>;

/// The machine-dependent execution-context transfer.
///
/// Implementations own the per-thread execution contexts (stacks and saved
/// registers). The kernel decides *which* thread runs; this trait only
/// performs the transfer.
pub trait ContextSwitch: Send + Sync {
    /// Makes the currently executing context the context of `thread`.
    ///
    /// Called once, for the thread that boots the kernel.
    fn adopt(&self, thread: ThreadId);

    /// Prepares a fresh context for `thread` that starts at `entry` the first
    /// time the thread is switched to.
    fn stack_allocate(&self, thread: ThreadId, entry: ThreadEntry) -> Result<()>;

    /// Transfers the CPU from `from` (the caller) to `to`.
    ///
    /// This does not return until some other thread switches back to `from`.
    /// The code after the call therefore runs on behalf of `from`, at a later
    /// time, with whatever interrupt level the switching thread left.
    fn switch(&self, from: ThreadId, to: ThreadId);

    /// Checks the stack sentinel of `thread`.
    fn stack_intact(&self, _thread: ThreadId) -> bool {
        true
    }

    /// Whether `thread` runs a user program whose CPU state must be saved.
    fn has_user_state(&self, _thread: ThreadId) -> bool {
        false
    }

    fn save_user_state(&self, _thread: ThreadId) {}

    fn restore_user_state(&self, _thread: ThreadId) {}

    /// Releases the context of a finished thread.
    ///
    /// Must not be called on the context that is currently executing. The
    /// reclaimed thread never executes again, including an adopted one.
    fn reclaim(&self, thread: ThreadId);
}
