// SPDX-License-Identifier: MPL-2.0

//! The interrupt mask of the simulated CPU.
//!
//! On a single processor, disabling interrupts is the only mutual exclusion
//! the scheduler relies on. The mask is a plain flag, so code that switches
//! to another thread with interrupts disabled finds them still disabled when
//! it is switched back to.

use core::sync::atomic::{AtomicBool, Ordering};

/// The level of the interrupt mask.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IrqLevel {
    /// Interrupts are masked.
    Off,
    /// Interrupts are delivered.
    On,
}

/// The interrupt controller of the simulated CPU.
pub struct Interrupt {
    enabled: AtomicBool,
    in_handler: AtomicBool,
    yield_on_return: AtomicBool,
}

impl Interrupt {
    pub(crate) const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            in_handler: AtomicBool::new(false),
            yield_on_return: AtomicBool::new(false),
        }
    }

    /// Sets the interrupt level and returns the previous one.
    pub fn set_level(&self, level: IrqLevel) -> IrqLevel {
        let was_enabled = self
            .enabled
            .swap(level == IrqLevel::On, Ordering::SeqCst);
        if level == IrqLevel::On {
            debug_assert!(
                !self.in_interrupt_context(),
                "interrupts must stay disabled inside an interrupt handler"
            );
        }
        if was_enabled {
            IrqLevel::On
        } else {
            IrqLevel::Off
        }
    }

    pub fn level(&self) -> IrqLevel {
        if self.is_local_enabled() {
            IrqLevel::On
        } else {
            IrqLevel::Off
        }
    }

    pub fn is_local_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable_local(&self) {
        self.set_level(IrqLevel::On);
    }

    /// Disables interrupts until the returned guard is dropped.
    ///
    /// # Example
    ///
    /// ```ignore
    /// {
    ///     let _guard = machine.interrupt().disable_local();
    ///     // interrupts are masked here
    /// }
    /// // the previous level is restored here
    /// ```
    #[must_use]
    pub fn disable_local(&self) -> DisabledLocalIrqGuard<'_> {
        let was_enabled = self.set_level(IrqLevel::Off) == IrqLevel::On;
        DisabledLocalIrqGuard {
            interrupt: self,
            was_enabled,
        }
    }

    /// Runs `handler` as an interrupt handler.
    ///
    /// Interrupts are masked for the duration of the handler and restored
    /// afterwards. Handlers do not nest.
    pub fn enter_handler<R>(&self, handler: impl FnOnce() -> R) -> R {
        let _guard = self.disable_local();
        let nested = self.in_handler.swap(true, Ordering::SeqCst);
        assert!(!nested, "interrupt handlers cannot nest");
        let ret = handler();
        self.in_handler.store(false, Ordering::SeqCst);
        ret
    }

    pub fn in_interrupt_context(&self) -> bool {
        self.in_handler.load(Ordering::SeqCst)
    }

    /// Asks the interrupted thread to yield once the handler returns.
    ///
    /// Switching threads inside a handler is not allowed, so the handler
    /// only records the request.
    pub fn yield_on_return(&self) {
        assert!(
            self.in_interrupt_context(),
            "yield-on-return can only be requested by an interrupt handler"
        );
        self.yield_on_return.store(true, Ordering::SeqCst);
    }

    /// Consumes a pending yield-on-return request.
    pub fn take_yield_on_return(&self) -> bool {
        self.yield_on_return.swap(false, Ordering::SeqCst)
    }
}

/// A guard for disabled local IRQs.
pub struct DisabledLocalIrqGuard<'a> {
    interrupt: &'a Interrupt,
    was_enabled: bool,
}

impl DisabledLocalIrqGuard<'_> {
    /// Whether interrupts were enabled when the guard was created.
    pub fn was_enabled(&self) -> bool {
        self.was_enabled
    }
}

impl Drop for DisabledLocalIrqGuard<'_> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.interrupt.enable_local();
        }
    }
}
