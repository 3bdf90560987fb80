// SPDX-License-Identifier: MPL-2.0

use core::{cmp::Ordering, fmt, str::FromStr};

use int_to_c_enum::TryFromInt;

use super::ready_queue::SchedInfo;
use crate::prelude::*;

/// The order in which ready threads are dispatched.
///
/// The policy is chosen when the scheduler is constructed. The numeric
/// values are the ones accepted on the kernel command line.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, TryFromInt)]
#[repr(u8)]
pub enum SchedPolicy {
    /// Plain FIFO with time slicing.
    #[default]
    RoundRobin = 0,
    /// Shortest estimated burst time first.
    ShortestJobFirst = 1,
    /// Arrival order, without time slicing.
    FirstComeFirstServed = 3,
}

impl SchedPolicy {
    /// Ranks a thread about to be queued against one already queued.
    ///
    /// A new thread is inserted before the first queued thread it ranks
    /// `Less` than. Round-robin has no ordering and always appends.
    ///
    /// First-come-first-served ranks every thread `Greater`, so a new thread
    /// never overtakes anyone and the queue stays in arrival order.
    pub fn compare<T: SchedInfo>(&self, new: &T, queued: &T) -> Option<Ordering> {
        match self {
            SchedPolicy::RoundRobin => None,
            SchedPolicy::ShortestJobFirst => Some(new.burst_time().cmp(&queued.burst_time())),
            SchedPolicy::FirstComeFirstServed => Some(Ordering::Greater),
        }
    }

    /// Whether the running thread is preempted on every timer tick.
    pub fn is_time_sliced(&self) -> bool {
        *self == SchedPolicy::RoundRobin
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchedPolicy::RoundRobin => "RR",
            SchedPolicy::ShortestJobFirst => "SJF",
            SchedPolicy::FirstComeFirstServed => "FCFS",
        }
    }
}

impl fmt::Display for SchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchedPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("rr") {
            return Ok(SchedPolicy::RoundRobin);
        }
        if s.eq_ignore_ascii_case("sjf") {
            return Ok(SchedPolicy::ShortestJobFirst);
        }
        if s.eq_ignore_ascii_case("fcfs") {
            return Ok(SchedPolicy::FirstComeFirstServed);
        }
        let Ok(raw) = s.parse::<u8>() else {
            return_errno_with_message!(Errno::EINVAL, "unknown scheduling policy");
        };
        Ok(SchedPolicy::try_from(raw)?)
    }
}
