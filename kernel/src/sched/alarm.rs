// SPDX-License-Identifier: MPL-2.0

use crate::prelude::*;

/// A thread sleeping until its remaining ticks run out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SleepRecord {
    thread: ThreadId,
    remaining_ticks: u32,
}

impl SleepRecord {
    pub fn new(thread: ThreadId, remaining_ticks: u32) -> Self {
        Self {
            thread,
            remaining_ticks,
        }
    }

    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    fn decrease(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
    }

    fn is_expired(&self) -> bool {
        self.remaining_ticks == 0
    }
}

/// The sleeping threads, soonest to wake first.
///
/// The wake order of threads whose records expire on the same tick is
/// unspecified.
#[derive(Default)]
pub struct AlarmClock {
    records: VecDeque<SleepRecord>,
}

impl AlarmClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `thread` to sleep for `ticks` ticks.
    ///
    /// A record of zero ticks expires on the next tick.
    pub fn insert(&mut self, thread: ThreadId, ticks: u32) {
        debug_assert!(!self.contains(thread), "thread {} sleeps twice", thread);

        let record = SleepRecord::new(thread, ticks);
        let index = self
            .records
            .partition_point(|queued| queued.remaining_ticks <= ticks);
        self.records.insert(index, record);
    }

    /// Advances the alarm clock by one tick.
    ///
    /// Every record loses one tick, since several may expire on the same
    /// tick. `wake` is called with the thread of each expired record. Returns
    /// whether any thread woke up.
    pub fn tick(&mut self, mut wake: impl FnMut(ThreadId)) -> bool {
        self.records.iter_mut().for_each(SleepRecord::decrease);

        let mut woken = false;
        while self.records.front().is_some_and(SleepRecord::is_expired) {
            let Some(record) = self.records.pop_front() else {
                break;
            };
            wake(record.thread());
            woken = true;
        }
        woken
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn contains(&self, thread: ThreadId) -> bool {
        self.records.iter().any(|record| record.thread() == thread)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SleepRecord> {
        self.records.iter()
    }
}
