// SPDX-License-Identifier: MPL-2.0

//! Thread scheduling.
//!
//! The [`Scheduler`] combines the ready queue, the alarm clock for sleeping
//! threads, and the dispatcher that owns the CPU. Every operation expects
//! interrupts to be disabled, which is the only mutual exclusion on the
//! single simulated CPU; the locks inside only give the state interior
//! mutability and are never held across a context switch.

mod alarm;
mod burst;
mod dispatcher;
mod policy;
mod ready_queue;

use nachos_machine::stats::TickKind;

pub use self::{
    alarm::{AlarmClock, SleepRecord},
    burst::BurstTime,
    policy::SchedPolicy,
    ready_queue::{ReadyQueue, SchedInfo},
};
use self::dispatcher::Dispatcher;
use crate::{
    prelude::*,
    thread::{status::ThreadStatus, ThreadTable},
};

/// A ready thread, with the burst time it had when it became ready.
///
/// A queued thread does not run, so its burst time cannot change while it
/// waits in the queue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct ReadyThread {
    id: ThreadId,
    burst_time: BurstTime,
}

impl SchedInfo for ReadyThread {
    fn burst_time(&self) -> BurstTime {
        self.burst_time
    }
}

struct Queues {
    ready: ReadyQueue<ReadyThread>,
    alarm: AlarmClock,
}

/// The scheduler of the single CPU.
pub struct Scheduler {
    queues: SpinLock<Queues>,
    dispatcher: Dispatcher,
    machine: Arc<Machine>,
    threads: Arc<ThreadTable>,
}

impl Scheduler {
    /// Creates a scheduler whose CPU is held by `boot_thread`.
    pub fn new(
        policy: SchedPolicy,
        boot_thread: ThreadId,
        machine: Arc<Machine>,
        threads: Arc<ThreadTable>,
    ) -> Self {
        info!("{} scheduling", policy);
        Self {
            queues: SpinLock::new(Queues {
                ready: ReadyQueue::new(policy),
                alarm: AlarmClock::new(),
            }),
            dispatcher: Dispatcher::new(boot_thread, machine.clone(), threads.clone()),
            machine,
            threads,
        }
    }

    pub fn policy(&self) -> SchedPolicy {
        self.queues.lock().ready.policy()
    }

    /// Changes the policy. Fails with `EBUSY` if any thread is ready.
    pub fn set_policy(&self, policy: SchedPolicy) -> Result<()> {
        self.queues.lock().ready.set_policy(policy)?;
        info!("{} scheduling", policy);
        Ok(())
    }

    /// The thread that owns the CPU.
    pub fn current(&self) -> ThreadId {
        self.dispatcher.current()
    }

    /// The finished thread waiting to be destroyed, if any.
    pub fn to_be_destroyed(&self) -> Option<ThreadId> {
        self.dispatcher.to_be_destroyed()
    }

    /// Marks `thread` ready and queues it.
    pub fn ready_to_run(&self, thread: ThreadId) {
        self.assert_irq_disabled();
        debug!("putting thread {} ({}) on the ready list", thread, self.threads.name(thread));

        let burst_time = self.threads.with_mut(thread, |thread| {
            thread.set_status(ThreadStatus::Ready);
            thread.burst_time()
        });
        self.queues.lock().ready.append(ReadyThread {
            id: thread,
            burst_time,
        });
    }

    /// Dequeues the next thread to run, if there is one.
    ///
    /// The thread stays `Ready` until it is passed to [`Self::run`].
    pub fn find_next_to_run(&self) -> Option<ThreadId> {
        self.assert_irq_disabled();
        self.queues
            .lock()
            .ready
            .remove_front()
            .map(|ready| ready.id)
    }

    /// Dispatches `next`, which must come from [`Self::find_next_to_run`].
    ///
    /// The current thread must already be queued or blocked somewhere, or be
    /// `finishing`. This returns only when the current thread is switched
    /// back to, which never happens if it is finishing.
    pub fn run(&self, next: ThreadId, finishing: bool) {
        let queued = self.queues.lock().ready.iter().any(|ready| ready.id == next);
        assert!(!queued, "thread {} is run while still on the ready list", next);
        self.dispatcher.run(next, finishing);
    }

    /// Destroys the finished thread that gave the CPU to the current one.
    pub fn check_to_be_destroyed(&self) {
        self.dispatcher.check_to_be_destroyed();
    }

    /// Puts the current thread to sleep for `ticks` timer ticks.
    ///
    /// The burst that ends here updates the thread's burst-time estimate.
    /// Returns after the thread has woken up and been dispatched again.
    pub fn put_to_sleep(&self, ticks: u32) {
        let _guard = self.machine.interrupt().disable_local();
        let current = self.current();
        let now = self.machine.stats().ticks();

        self.threads.with_mut(current, |thread| {
            let actual_burst = now.saturating_sub(thread.start_time());
            thread.set_burst_time(thread.burst_time().smoothed(actual_burst));
            thread.set_start_time(now);
            debug!(
                "thread {} ({}) sleeps for {} ticks after a {}-tick burst, estimate {}",
                current,
                thread.name(),
                ticks,
                actual_burst,
                thread.burst_time()
            );
        });
        self.queues.lock().alarm.insert(current, ticks);
        self.threads
            .with_mut(current, |thread| thread.set_status(ThreadStatus::Blocked));

        self.relinquish_cpu(false);
    }

    /// Advances the alarm clock by one tick, readying every thread whose sleep
    /// ends. Returns whether any thread woke up.
    pub fn tick(&self) -> bool {
        self.assert_irq_disabled();
        let mut woken = Vec::new();
        self.queues.lock().alarm.tick(|thread| woken.push(thread));

        for &thread in &woken {
            trace!("thread {} wakes up", thread);
            self.ready_to_run(thread);
        }
        !woken.is_empty()
    }

    pub fn is_sleep_queue_empty(&self) -> bool {
        self.queues.lock().alarm.is_empty()
    }

    /// The ready threads, in dispatch order.
    pub fn ready_threads(&self) -> Vec<ThreadId> {
        self.queues
            .lock()
            .ready
            .iter()
            .map(|ready| ready.id)
            .collect()
    }

    /// The sleeping threads, soonest to wake first.
    pub fn sleeping_threads(&self) -> Vec<SleepRecord> {
        self.queues.lock().alarm.iter().copied().collect()
    }

    /// Logs the ready list.
    pub fn print(&self) {
        info!("Ready list contents ({}):", self.policy());
        for ready in self.queues.lock().ready.iter() {
            info!(
                "  thread {} ({}), burst {}",
                ready.id,
                self.threads.name(ready.id),
                ready.burst_time
            );
        }
    }

    /// Checks that no thread is in two places at once, i.e. running, ready,
    /// sleeping, or awaiting destruction.
    ///
    /// # Panics
    ///
    /// Panics if a thread is found in more than one place.
    pub fn verify(&self) {
        let mut seen = Vec::new();
        seen.push(self.current());
        seen.extend(self.to_be_destroyed());
        {
            let queues = self.queues.lock();
            seen.extend(queues.ready.iter().map(|ready| ready.id));
            seen.extend(queues.alarm.iter().map(SleepRecord::thread));
        }
        seen.sort();
        for pair in seen.windows(2) {
            assert_ne!(pair[0], pair[1], "thread {} is in two places", pair[0]);
        }
    }

    /// Gives the CPU to the next ready thread.
    ///
    /// The current thread must already be blocked or terminated. While no
    /// thread is ready, the CPU idles until a sleeping thread wakes up.
    pub(crate) fn relinquish_cpu(&self, finishing: bool) {
        self.assert_irq_disabled();
        let next = loop {
            if let Some(next) = self.find_next_to_run() {
                break next;
            }
            self.idle();
        };

        if next == self.current() {
            debug_assert!(!finishing);
            self.dispatcher.resume_current();
        } else {
            self.run(next, finishing);
        }
    }

    /// Gives the CPU to the next ready thread, if any, and queues the current
    /// one behind it.
    pub(crate) fn yield_current(&self) {
        let _guard = self.machine.interrupt().disable_local();
        let current = self.current();
        if let Some(next) = self.find_next_to_run() {
            self.ready_to_run(current);
            self.run(next, false);
        }
    }

    /// Terminates the current thread.
    pub(crate) fn exit_current(&self) -> ! {
        // Interrupts are never enabled again on this thread.
        self.machine.interrupt().set_level(IrqLevel::Off);
        let current = self.current();
        debug!("finishing thread {} ({})", current, self.threads.name(current));
        self.threads
            .with_mut(current, |thread| thread.set_status(ThreadStatus::Terminated));

        self.relinquish_cpu(true);
        unreachable!("finished thread {} was scheduled again", current);
    }

    /// Waits for the next timer interrupt with nothing to run.
    fn idle(&self) {
        if self.is_sleep_queue_empty() {
            self.machine
                .halt("no threads ready or runnable, and no pending alarms");
        }
        self.machine.stats().advance(TickKind::Idle);
        self.tick();
    }

    fn assert_irq_disabled(&self) {
        assert_eq!(
            self.machine.interrupt().level(),
            IrqLevel::Off,
            "the scheduler is used with interrupts enabled"
        );
    }
}
