// SPDX-License-Identifier: MPL-2.0

//! Performance counters of the simulated machine.

use core::sync::atomic::{AtomicU64, Ordering};

/// What the CPU was doing when a tick elapsed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickKind {
    /// A thread was running.
    System,
    /// No thread was ready, so the CPU was waiting for the next interrupt.
    Idle,
}

/// Counters of elapsed time and scheduling activity.
///
/// `total_ticks` is the clock every burst-time computation reads; it only
/// ever increases.
#[derive(Debug, Default)]
pub struct Statistics {
    total_ticks: AtomicU64,
    idle_ticks: AtomicU64,
    system_ticks: AtomicU64,
    context_switches: AtomicU64,
}

impl Statistics {
    pub(crate) const fn new() -> Self {
        Self {
            total_ticks: AtomicU64::new(0),
            idle_ticks: AtomicU64::new(0),
            system_ticks: AtomicU64::new(0),
            context_switches: AtomicU64::new(0),
        }
    }

    /// The current tick.
    pub fn ticks(&self) -> u64 {
        self.total_ticks.load(Ordering::Relaxed)
    }

    /// Advances the clock by one tick and returns the new tick.
    pub fn advance(&self, kind: TickKind) -> u64 {
        match kind {
            TickKind::System => self.system_ticks.fetch_add(1, Ordering::Relaxed),
            TickKind::Idle => self.idle_ticks.fetch_add(1, Ordering::Relaxed),
        };
        self.total_ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks.load(Ordering::Relaxed)
    }

    pub fn system_ticks(&self) -> u64 {
        self.system_ticks.load(Ordering::Relaxed)
    }

    pub fn context_switches(&self) -> u64 {
        self.context_switches.load(Ordering::Relaxed)
    }

    pub fn record_context_switch(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn print(&self) {
        log::info!(
            "Ticks: total {}, idle {}, system {}",
            self.ticks(),
            self.idle_ticks(),
            self.system_ticks()
        );
        log::info!("Context switches: {}", self.context_switches());
    }
}
