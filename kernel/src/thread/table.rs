// SPDX-License-Identifier: MPL-2.0

use id_alloc::IdAlloc;

use super::Thread;
use crate::prelude::*;

/// The arena all threads live in.
///
/// A slot is created by thread creation and freed only when the scheduler
/// destroys a finished thread, so a [`ThreadId`] stays valid while the
/// thread is marked for destruction.
pub struct ThreadTable {
    inner: SpinLock<Inner>,
}

struct Inner {
    id_alloc: IdAlloc,
    slots: Vec<Option<Thread>>,
}

impl ThreadTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity, || None);
        Self {
            inner: SpinLock::new(Inner {
                id_alloc: IdAlloc::with_capacity(capacity),
                slots,
            }),
        }
    }

    /// Allocates a slot and fills it with the thread built by `new_thread`.
    pub fn insert(&self, new_thread: impl FnOnce(ThreadId) -> Thread) -> Result<ThreadId> {
        let mut inner = self.inner.lock();
        let Some(raw) = inner.id_alloc.alloc() else {
            return_errno_with_message!(Errno::EAGAIN, "the thread table is full");
        };
        let id = ThreadId::new(raw as u32);
        let thread = new_thread(id);
        debug_assert_eq!(thread.id(), id);
        inner.slots[raw] = Some(thread);
        Ok(id)
    }

    /// Removes a thread and frees its slot.
    ///
    /// # Panics
    ///
    /// Panics if there is no thread `id`.
    pub fn remove(&self, id: ThreadId) -> Thread {
        let mut inner = self.inner.lock();
        let Some(thread) = inner.slots.get_mut(id.as_usize()).and_then(Option::take) else {
            panic!("thread {} does not exist", id);
        };
        inner.id_alloc.free(id.as_usize());
        thread
    }

    /// Runs `f` on thread `id`.
    ///
    /// # Panics
    ///
    /// Panics if there is no thread `id`.
    pub fn with<R>(&self, id: ThreadId, f: impl FnOnce(&Thread) -> R) -> R {
        let inner = self.inner.lock();
        match inner.slots.get(id.as_usize()) {
            Some(Some(thread)) => f(thread),
            _ => panic!("thread {} does not exist", id),
        }
    }

    /// Runs `f` on thread `id` mutably.
    ///
    /// # Panics
    ///
    /// Panics if there is no thread `id`.
    pub fn with_mut<R>(&self, id: ThreadId, f: impl FnOnce(&mut Thread) -> R) -> R {
        let mut inner = self.inner.lock();
        match inner.slots.get_mut(id.as_usize()) {
            Some(Some(thread)) => f(thread),
            _ => panic!("thread {} does not exist", id),
        }
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        matches!(self.inner.lock().slots.get(id.as_usize()), Some(Some(_)))
    }

    pub fn name(&self, id: ThreadId) -> String {
        self.with(id, |thread| thread.name().to_string())
    }

    /// The number of threads, including finished ones not yet destroyed.
    pub fn len(&self) -> usize {
        self.inner.lock().slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().slots.len()
    }
}
