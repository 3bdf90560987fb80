// SPDX-License-Identifier: MPL-2.0

//! A context switch backed by host threads.
//!
//! Every simulated thread owns one host thread, and exactly one of them holds
//! the baton at any time. Switching hands the baton to the target and parks
//! the caller until the baton comes back, which gives the transfer its
//! "returns only when rescheduled" semantics without any unsafe code.
//!
//! A thread started here is torn down by unwinding its host stack when it is
//! reclaimed. An adopted host thread, such as the one that booted the kernel,
//! belongs to its caller and cannot be unwound; once reclaimed it blocks
//! forever.

use alloc::{collections::BTreeMap, format, sync::Arc};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use spin::Mutex as SpinLock;

use super::{ContextSwitch, ThreadEntry, ThreadId};
use crate::{Error, Result};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Baton {
    Parked,
    Held,
    Reaped,
}

/// The unwinding payload that tears down the host stack of a reaped thread.
struct Reaped;

struct HostContext {
    baton: Mutex<Baton>,
    wakeup: Condvar,
    host_thread: Mutex<Option<JoinHandle<()>>>,
    /// Whether the host thread was adopted rather than started by the switch.
    adopted: bool,
}

impl HostContext {
    fn new(baton: Baton, adopted: bool) -> Arc<Self> {
        Arc::new(Self {
            baton: Mutex::new(baton),
            wakeup: Condvar::new(),
            host_thread: Mutex::new(None),
            adopted,
        })
    }

    fn baton(&self) -> MutexGuard<'_, Baton> {
        self.baton.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pass(&self, baton: Baton) {
        *self.baton() = baton;
        self.wakeup.notify_all();
    }

    /// Blocks the calling host thread until this context holds the baton.
    ///
    /// A reaped context never gets the baton back. Its stack is unwound if
    /// the switch started it, and it stays blocked if it was adopted.
    fn wait_for_baton(&self) {
        let mut baton = self.baton();
        loop {
            let state = *baton;
            match state {
                Baton::Held => return,
                Baton::Reaped if !self.adopted => {
                    drop(baton);
                    panic::resume_unwind(Box::new(Reaped));
                }
                Baton::Parked | Baton::Reaped => {
                    baton = self
                        .wakeup
                        .wait(baton)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }
}

/// The bookkeeping of a thread that runs a user program.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct UserState {
    pub saves: u64,
    pub restores: u64,
}

/// A [`ContextSwitch`] that runs each simulated thread on a host thread.
pub struct HostSwitch {
    contexts: SpinLock<BTreeMap<ThreadId, Arc<HostContext>>>,
    user_programs: SpinLock<BTreeMap<ThreadId, UserState>>,
}

impl HostSwitch {
    pub fn new() -> Self {
        Self {
            contexts: SpinLock::new(BTreeMap::new()),
            user_programs: SpinLock::new(BTreeMap::new()),
        }
    }

    /// Marks `thread` as running a user program, so its CPU state is saved
    /// and restored around every switch.
    pub fn attach_user_program(&self, thread: ThreadId) {
        self.user_programs.lock().entry(thread).or_default();
    }

    pub fn user_state(&self, thread: ThreadId) -> Option<UserState> {
        self.user_programs.lock().get(&thread).copied()
    }

    /// The number of live execution contexts.
    pub fn num_contexts(&self) -> usize {
        self.contexts.lock().len()
    }

    fn context(&self, thread: ThreadId) -> Arc<HostContext> {
        match self.contexts.lock().get(&thread) {
            Some(context) => context.clone(),
            None => panic!("thread {} has no execution context", thread),
        }
    }
}

impl Default for HostSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextSwitch for HostSwitch {
    fn adopt(&self, thread: ThreadId) {
        let previous = self
            .contexts
            .lock()
            .insert(thread, HostContext::new(Baton::Held, true));
        assert!(previous.is_none(), "thread {} adopted twice", thread);
    }

    fn stack_allocate(&self, thread: ThreadId, entry: ThreadEntry) -> Result<()> {
        if self.contexts.lock().contains_key(&thread) {
            return Err(Error::InvalidArgs);
        }

        let context = HostContext::new(Baton::Parked, false);
        let host_context = context.clone();
        let host_thread = thread::Builder::new()
            .name(format!("nachos-{}", thread.as_u32()))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    host_context.wait_for_baton();
                    entry();
                }));
                let Err(payload) = result else {
                    return;
                };
                if !payload.is::<Reaped>() {
                    // A panic in kernel code on the simulated CPU leaves no
                    // thread holding the baton, so the machine is dead.
                    log::error!("kernel panic on thread {}", thread);
                    std::process::abort();
                }
            })
            .map_err(|_| Error::NoMemory)?;
        *context
            .host_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(host_thread);

        self.contexts.lock().insert(thread, context);
        Ok(())
    }

    fn switch(&self, from: ThreadId, to: ThreadId) {
        let from_context = self.context(from);
        let to_context = self.context(to);

        // Park before handing over, so `to` may switch straight back.
        *from_context.baton() = Baton::Parked;
        to_context.pass(Baton::Held);
        from_context.wait_for_baton();
    }

    fn has_user_state(&self, thread: ThreadId) -> bool {
        self.user_programs.lock().contains_key(&thread)
    }

    fn save_user_state(&self, thread: ThreadId) {
        if let Some(state) = self.user_programs.lock().get_mut(&thread) {
            state.saves += 1;
        }
    }

    fn restore_user_state(&self, thread: ThreadId) {
        if let Some(state) = self.user_programs.lock().get_mut(&thread) {
            state.restores += 1;
        }
    }

    fn reclaim(&self, thread: ThreadId) {
        let Some(context) = self.contexts.lock().remove(&thread) else {
            panic!("thread {} has no execution context to reclaim", thread);
        };
        self.user_programs.lock().remove(&thread);

        context.pass(Baton::Reaped);
        let host_thread = context
            .host_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(host_thread) = host_thread {
            assert_ne!(
                host_thread.thread().id(),
                thread::current().id(),
                "thread {} cannot reclaim its own context",
                thread
            );
            let _ = host_thread.join();
        }
    }
}

#[cfg(test)]
mod test {
    use std::{sync::mpsc, time::Duration};

    use super::*;

    #[test]
    fn switch_runs_entry_and_returns_on_switch_back() {
        let switch = Arc::new(HostSwitch::new());
        let main = ThreadId::new(0);
        let child = ThreadId::new(1);
        switch.adopt(main);

        let (sender, receiver) = mpsc::channel();
        let child_switch = switch.clone();
        switch
            .stack_allocate(
                child,
                Box::new(move || {
                    sender.send("child ran").unwrap();
                    child_switch.switch(child, main);
                    sender.send("child resumed").unwrap();
                    child_switch.switch(child, main);
                }),
            )
            .unwrap();

        switch.switch(main, child);
        assert_eq!(receiver.try_recv().unwrap(), "child ran");
        assert!(receiver.try_recv().is_err());

        switch.switch(main, child);
        assert_eq!(receiver.try_recv().unwrap(), "child resumed");

        switch.reclaim(child);
        assert_eq!(switch.num_contexts(), 1);
    }

    #[test]
    fn reclaimed_adopted_context_blocks_instead_of_unwinding() {
        let switch = Arc::new(HostSwitch::new());
        let main = ThreadId::new(0);
        let child = ThreadId::new(1);
        switch.adopt(main);

        let (sender, receiver) = mpsc::channel();
        let child_switch = switch.clone();
        switch
            .stack_allocate(
                child,
                Box::new(move || {
                    child_switch.reclaim(main);
                    sender.send(child_switch.num_contexts()).unwrap();
                    loop {
                        thread::park();
                    }
                }),
            )
            .unwrap();

        let (returned, returns) = mpsc::channel();
        let boot_switch = switch.clone();
        thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| boot_switch.switch(main, child)));
            returned.send(result.is_ok()).unwrap();
        });

        assert_eq!(receiver.recv_timeout(Duration::from_secs(10)), Ok(1));
        assert!(returns.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn reclaim_thread_that_never_ran() {
        let switch = HostSwitch::new();
        switch.adopt(ThreadId::new(0));
        switch
            .stack_allocate(ThreadId::new(7), Box::new(|| {}))
            .unwrap();
        assert_eq!(switch.num_contexts(), 2);
        switch.reclaim(ThreadId::new(7));
        assert_eq!(switch.num_contexts(), 1);
    }

    #[test]
    fn duplicate_context_is_rejected() {
        let switch = HostSwitch::new();
        switch.adopt(ThreadId::new(0));
        assert_eq!(
            switch.stack_allocate(ThreadId::new(0), Box::new(|| {})),
            Err(Error::InvalidArgs)
        );
    }

    #[test]
    fn user_state_is_counted_only_for_user_programs() {
        let switch = HostSwitch::new();
        let thread = ThreadId::new(3);
        assert!(!switch.has_user_state(thread));
        switch.save_user_state(thread);
        assert_eq!(switch.user_state(thread), None);

        switch.attach_user_program(thread);
        switch.save_user_state(thread);
        switch.restore_user_state(thread);
        switch.restore_user_state(thread);
        assert_eq!(
            switch.user_state(thread),
            Some(UserState {
                saves: 1,
                restores: 2
            })
        );
    }
}
