// SPDX-License-Identifier: MPL-2.0

use nachos_machine::{boot::kcmdline::KCmdlineArg, logger, stats::TickKind};

use crate::{
    config::KernelConfig,
    prelude::*,
    sched::{BurstTime, Scheduler},
    thread::{status::ThreadStatus, Thread, ThreadTable},
};

/// The kernel: one machine, its threads, and the scheduler that runs them.
///
/// The thread that calls [`Kernel::boot`] becomes the kernel's first thread,
/// named `main`.
pub struct Kernel {
    config: KernelConfig,
    machine: Arc<Machine>,
    threads: Arc<ThreadTable>,
    scheduler: Scheduler,
}

impl Kernel {
    pub fn boot(config: KernelConfig, switcher: Arc<dyn ContextSwitch>) -> Result<Arc<Self>> {
        logger::init(config.log_level);
        let machine = Arc::new(Machine::new(switcher));
        let threads = Arc::new(ThreadTable::with_capacity(config.max_threads));

        let main = threads.insert(|id| Thread::new(id, "main".to_string(), BurstTime::ZERO))?;
        threads.with_mut(main, |thread| thread.set_status(ThreadStatus::Running));
        machine.switcher().adopt(main);

        let scheduler = Scheduler::new(config.policy, main, machine.clone(), threads.clone());
        machine.interrupt().enable_local();
        info!("kernel booted with {:?}", config);

        Ok(Arc::new(Self {
            config,
            machine,
            threads,
            scheduler,
        }))
    }

    /// Boots with the logger and configuration taken from a kernel command
    /// line, e.g. `log_level=debug sched.policy=sjf`.
    pub fn boot_with_cmdline(cmdline: &str, switcher: Arc<dyn ContextSwitch>) -> Result<Arc<Self>> {
        let config = KernelConfig::from_cmdline(&KCmdlineArg::from(cmdline))?;
        Self::boot(config, switcher)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn threads(&self) -> &ThreadTable {
        &self.threads
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The thread that is executing.
    pub fn current(&self) -> ThreadId {
        self.scheduler.current()
    }

    /// Lets the next ready thread run, if there is one.
    pub fn yield_now(&self) {
        self.scheduler.yield_current();
    }

    /// Blocks the current thread for `ticks` timer ticks.
    pub fn sleep(&self, ticks: u32) {
        self.scheduler.put_to_sleep(ticks);
    }

    /// Terminates the current thread.
    ///
    /// The boot thread may finish too; the kernel carries on with the other
    /// threads and the caller of [`Kernel::boot`] never regains control.
    pub fn finish(&self) -> ! {
        self.scheduler.exit_current()
    }

    /// Delivers one timer interrupt to the current thread.
    ///
    /// The handler advances the clock and wakes the threads whose sleep ended.
    /// If the policy is time-sliced, or a thread woke up, the current thread
    /// yields once the handler has returned.
    pub fn timer_interrupt(&self) {
        let irq = self.machine.interrupt();
        irq.enter_handler(|| {
            let now = self.machine.stats().advance(TickKind::System);
            trace!("timer interrupt at tick {}", now);
            let woken = self.scheduler.tick();
            if woken || self.scheduler.policy().is_time_sliced() {
                irq.yield_on_return();
            }
        });
        if irq.take_yield_on_return() {
            self.yield_now();
        }
    }

    /// Keeps the current thread busy until every other thread has been
    /// destroyed.
    ///
    /// Each round takes a timer interrupt and then yields, so this works for
    /// policies without time slicing too.
    pub fn wait_for_others(&self) {
        while self.threads.len() > 1 {
            self.timer_interrupt();
            self.yield_now();
        }
    }

    /// The entry routine of every spawned thread, run before its body.
    pub(crate) fn thread_begin(&self) {
        self.scheduler.check_to_be_destroyed();
        self.machine.interrupt().enable_local();
        debug!(
            "thread {} ({}) begins",
            self.current(),
            self.threads.name(self.current())
        );
    }
}
