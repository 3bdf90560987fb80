// SPDX-License-Identifier: MPL-2.0

use crate::{
    prelude::*,
    thread::{status::ThreadStatus, ThreadTable},
};

/// Owns the CPU: which thread runs, and which finished thread awaits
/// destruction.
pub(super) struct Dispatcher {
    state: SpinLock<DispatchState>,
    machine: Arc<Machine>,
    threads: Arc<ThreadTable>,
}

struct DispatchState {
    current: ThreadId,
    /// A finished thread whose stack may still be in use.
    to_be_destroyed: Option<ThreadId>,
}

impl Dispatcher {
    pub(super) fn new(
        boot_thread: ThreadId,
        machine: Arc<Machine>,
        threads: Arc<ThreadTable>,
    ) -> Self {
        Self {
            state: SpinLock::new(DispatchState {
                current: boot_thread,
                to_be_destroyed: None,
            }),
            machine,
            threads,
        }
    }

    pub(super) fn current(&self) -> ThreadId {
        self.state.lock().current
    }

    pub(super) fn to_be_destroyed(&self) -> Option<ThreadId> {
        self.state.lock().to_be_destroyed
    }

    /// Transfers the CPU from the current thread to `next`.
    ///
    /// If `finishing` is set, the current thread is never scheduled again and
    /// is destroyed by the next thread to run; this call then never returns.
    /// Otherwise it returns once some thread switches back to the current
    /// thread.
    pub(super) fn run(&self, next: ThreadId, finishing: bool) {
        let irq = self.machine.interrupt();
        let switcher = self.machine.switcher();
        assert_eq!(irq.level(), IrqLevel::Off, "run with interrupts enabled");

        let old = {
            let mut state = self.state.lock();
            let old = state.current;
            assert_ne!(old, next, "thread {} switches to itself", next);
            if finishing {
                assert!(
                    state.to_be_destroyed.is_none(),
                    "thread {} finishes while thread {:?} is still pending destruction",
                    old,
                    state.to_be_destroyed
                );
                state.to_be_destroyed = Some(old);
            }
            old
        };
        self.threads.with(old, |thread| {
            assert!(
                !thread.status().is_running(),
                "thread {} gives up the CPU while still running",
                old
            );
        });

        if switcher.has_user_state(old) {
            switcher.save_user_state(old);
        }
        assert!(switcher.stack_intact(old), "stack overflow in thread {}", old);

        let now = self.machine.stats().ticks();
        self.state.lock().current = next;
        self.threads.with_mut(next, |thread| {
            assert!(
                thread.status().is_ready(),
                "thread {} is dispatched while {:?}",
                next,
                thread.status()
            );
            thread.set_status(ThreadStatus::Running);
            thread.set_start_time(now);
        });
        self.machine.stats().record_context_switch();

        debug!(
            "switching from thread {} ({}) to thread {} ({})",
            old,
            self.threads.name(old),
            next,
            self.threads.name(next)
        );
        switcher.switch(old, next);

        // From here on this runs for `old` again, resumed by whichever thread
        // switched back to it.
        assert_eq!(
            irq.level(),
            IrqLevel::Off,
            "thread {} resumed with interrupts enabled",
            old
        );
        debug!("now in thread {} ({})", old, self.threads.name(old));

        self.check_to_be_destroyed();
        if switcher.has_user_state(old) {
            switcher.restore_user_state(old);
        }
    }

    /// Lets the current thread keep the CPU after it gave it up and nobody
    /// else became ready.
    pub(super) fn resume_current(&self) {
        let current = self.current();
        let now = self.machine.stats().ticks();
        self.threads.with_mut(current, |thread| {
            thread.set_status(ThreadStatus::Running);
            thread.set_start_time(now);
        });
    }

    /// Destroys the thread that finished before the current one was switched
    /// to, if any.
    pub(super) fn check_to_be_destroyed(&self) {
        let Some(corpse) = self.state.lock().to_be_destroyed.take() else {
            return;
        };
        assert_ne!(
            corpse,
            self.current(),
            "thread {} would be destroyed on its own stack",
            corpse
        );

        let thread = self.threads.remove(corpse);
        debug_assert!(thread.status().is_terminated());
        self.machine.switcher().reclaim(corpse);
        debug!("destroyed thread {} ({})", corpse, thread.name());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        sched::BurstTime,
        test_util::{Event, TracingSwitch},
        thread::Thread,
    };

    struct Setup {
        switch: Arc<TracingSwitch>,
        machine: Arc<Machine>,
        threads: Arc<ThreadTable>,
        dispatcher: Dispatcher,
        main: ThreadId,
    }

    fn setup() -> Setup {
        let switch = TracingSwitch::recording();
        let machine = Arc::new(Machine::new(switch.clone()));
        let threads = Arc::new(ThreadTable::with_capacity(8));
        let main = add_thread(&threads, "main", ThreadStatus::Running);
        let dispatcher = Dispatcher::new(main, machine.clone(), threads.clone());
        Setup {
            switch,
            machine,
            threads,
            dispatcher,
            main,
        }
    }

    fn add_thread(threads: &ThreadTable, name: &str, status: ThreadStatus) -> ThreadId {
        let id = threads
            .insert(|id| Thread::new(id, name.to_string(), BurstTime::ZERO))
            .unwrap();
        threads.with_mut(id, |thread| thread.set_status(status));
        id
    }

    #[test]
    #[should_panic(expected = "still pending destruction")]
    fn cannot_finish_while_a_corpse_is_unclaimed() {
        let setup = setup();
        let corpse = add_thread(&setup.threads, "corpse", ThreadStatus::Ready);
        let next = add_thread(&setup.threads, "next", ThreadStatus::Ready);
        setup.dispatcher.state.lock().to_be_destroyed = Some(corpse);

        setup.dispatcher.run(next, true);
    }

    #[test]
    #[should_panic(expected = "run with interrupts enabled")]
    fn run_requires_disabled_interrupts() {
        let setup = setup();
        let next = add_thread(&setup.threads, "next", ThreadStatus::Ready);
        setup.machine.interrupt().enable_local();

        setup.dispatcher.run(next, false);
    }

    #[test]
    #[should_panic(expected = "switches to itself")]
    fn run_to_the_current_thread() {
        let setup = setup();
        setup.dispatcher.run(setup.main, false);
    }

    #[test]
    #[should_panic(expected = "gives up the CPU while still running")]
    fn outgoing_thread_must_be_queued_blocked_or_finished() {
        let setup = setup();
        let next = add_thread(&setup.threads, "next", ThreadStatus::Ready);
        setup.dispatcher.run(next, false);
    }

    #[test]
    fn check_to_be_destroyed_without_a_corpse() {
        let setup = setup();
        setup.dispatcher.check_to_be_destroyed();
        assert!(setup.switch.events().is_empty());
        assert_eq!(setup.threads.len(), 1);
    }

    #[test]
    fn resume_current_restamps_the_start_time() {
        let setup = setup();
        setup
            .threads
            .with_mut(setup.main, |thread| thread.set_status(ThreadStatus::Blocked));
        setup
            .threads
            .with_mut(setup.main, |thread| thread.set_status(ThreadStatus::Ready));
        setup
            .machine
            .stats()
            .advance(nachos_machine::stats::TickKind::Idle);

        setup.dispatcher.resume_current();

        setup.threads.with(setup.main, |thread| {
            assert!(thread.status().is_running());
            assert_eq!(thread.start_time(), 1);
        });
        assert!(!setup.switch.events().contains(&Event::Switch(setup.main, setup.main)));
    }
}
