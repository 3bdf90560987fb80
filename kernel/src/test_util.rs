// SPDX-License-Identifier: MPL-2.0

use nachos_machine::task::{HostSwitch, ThreadEntry};

use crate::{prelude::*, sched::SchedPolicy, Kernel, KernelConfig};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Event {
    Allocate(ThreadId),
    Save(ThreadId),
    CheckStack(ThreadId),
    Switch(ThreadId, ThreadId),
    Restore(ThreadId),
    Reclaim(ThreadId),
}

/// A [`ContextSwitch`] that records what the kernel asks of it.
///
/// In recording mode nothing is executed: `switch` returns at once, as if
/// the target had immediately switched back. In host mode the calls are
/// forwarded to a [`HostSwitch`].
pub(crate) struct TracingSwitch {
    host: Option<HostSwitch>,
    events: SpinLock<Vec<Event>>,
    user_programs: SpinLock<Vec<ThreadId>>,
    overflowed: SpinLock<Vec<ThreadId>>,
}

impl TracingSwitch {
    pub(crate) fn recording() -> Arc<Self> {
        Arc::new(Self::new(None))
    }

    pub(crate) fn host() -> Arc<Self> {
        Arc::new(Self::new(Some(HostSwitch::new())))
    }

    fn new(host: Option<HostSwitch>) -> Self {
        Self {
            host,
            events: SpinLock::new(Vec::new()),
            user_programs: SpinLock::new(Vec::new()),
            overflowed: SpinLock::new(Vec::new()),
        }
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.lock().clear();
    }

    pub(crate) fn count(&self, event: Event) -> usize {
        self.events.lock().iter().filter(|&&e| e == event).count()
    }

    pub(crate) fn attach_user_program(&self, thread: ThreadId) {
        self.user_programs.lock().push(thread);
    }

    pub(crate) fn overflow_stack(&self, thread: ThreadId) {
        self.overflowed.lock().push(thread);
    }

    pub(crate) fn num_host_contexts(&self) -> Option<usize> {
        self.host.as_ref().map(HostSwitch::num_contexts)
    }

    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl ContextSwitch for TracingSwitch {
    fn adopt(&self, thread: ThreadId) {
        if let Some(host) = &self.host {
            host.adopt(thread);
        }
    }

    fn stack_allocate(&self, thread: ThreadId, entry: ThreadEntry) -> nachos_machine::Result<()> {
        self.record(Event::Allocate(thread));
        match &self.host {
            Some(host) => host.stack_allocate(thread, entry),
            None => Ok(()),
        }
    }

    fn switch(&self, from: ThreadId, to: ThreadId) {
        self.record(Event::Switch(from, to));
        if let Some(host) = &self.host {
            host.switch(from, to);
        }
    }

    fn stack_intact(&self, thread: ThreadId) -> bool {
        self.record(Event::CheckStack(thread));
        !self.overflowed.lock().contains(&thread)
    }

    fn has_user_state(&self, thread: ThreadId) -> bool {
        self.user_programs.lock().contains(&thread)
    }

    fn save_user_state(&self, thread: ThreadId) {
        self.record(Event::Save(thread));
    }

    fn restore_user_state(&self, thread: ThreadId) {
        self.record(Event::Restore(thread));
    }

    fn reclaim(&self, thread: ThreadId) {
        self.record(Event::Reclaim(thread));
        if let Some(host) = &self.host {
            host.reclaim(thread);
        }
    }
}

pub(crate) fn boot(policy: SchedPolicy, switch: &Arc<TracingSwitch>) -> Arc<Kernel> {
    Kernel::boot(KernelConfig::default().with_policy(policy), switch.clone()).unwrap()
}
