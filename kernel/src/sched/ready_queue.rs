// SPDX-License-Identifier: MPL-2.0

use core::cmp::Ordering;

use super::{burst::BurstTime, policy::SchedPolicy};
use crate::prelude::*;

/// The scheduling information a [`ReadyQueue`] orders its entities by.
pub trait SchedInfo {
    fn burst_time(&self) -> BurstTime;
}

/// The queue of threads that are ready to run.
///
/// One queue type serves every [`SchedPolicy`]; the policy only decides
/// where [`append`](Self::append) inserts. Insertion is stable: an entity is
/// placed before the first queued entity it ranks strictly less than, so
/// entities of equal rank leave in the order they arrived.
pub struct ReadyQueue<T> {
    policy: SchedPolicy,
    entities: VecDeque<T>,
}

impl<T: SchedInfo + PartialEq> ReadyQueue<T> {
    pub fn new(policy: SchedPolicy) -> Self {
        Self {
            policy,
            entities: VecDeque::new(),
        }
    }

    pub fn policy(&self) -> SchedPolicy {
        self.policy
    }

    /// Switches to another policy. Only allowed while the queue is empty, as
    /// queued entities were ordered by the old policy.
    pub fn set_policy(&mut self, policy: SchedPolicy) -> Result<()> {
        if !self.entities.is_empty() {
            return_errno_with_message!(Errno::EBUSY, "the ready queue is not empty");
        }
        self.policy = policy;
        Ok(())
    }

    pub fn append(&mut self, entity: T) {
        debug_assert!(
            !self.entities.contains(&entity),
            "an entity is queued twice"
        );

        let index = self
            .entities
            .iter()
            .position(|queued| self.policy.compare(&entity, queued) == Some(Ordering::Less))
            .unwrap_or(self.entities.len());
        self.entities.insert(index, entity);
    }

    pub fn remove_front(&mut self) -> Option<T> {
        self.entities.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entities.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(PartialEq, Debug)]
    struct Job {
        name: char,
        burst: u64,
    }

    impl SchedInfo for Job {
        fn burst_time(&self) -> BurstTime {
            BurstTime::from_ticks(self.burst)
        }
    }

    fn queue_with(policy: SchedPolicy, jobs: &[(char, u64)]) -> ReadyQueue<Job> {
        let mut queue = ReadyQueue::new(policy);
        for &(name, burst) in jobs {
            queue.append(Job { name, burst });
        }
        queue
    }

    fn drain(mut queue: ReadyQueue<Job>) -> String {
        let mut order = String::new();
        while let Some(job) = queue.remove_front() {
            order.push(job.name);
        }
        order
    }

    #[test]
    fn rr_is_fifo() {
        let queue = queue_with(SchedPolicy::RoundRobin, &[('A', 9), ('B', 1), ('C', 5)]);
        assert_eq!(drain(queue), "ABC");
    }

    #[test]
    fn fcfs_is_fifo_regardless_of_burst() {
        let queue = queue_with(
            SchedPolicy::FirstComeFirstServed,
            &[('A', 30), ('B', 10), ('C', 20), ('D', 10)],
        );
        assert_eq!(drain(queue), "ABCD");
    }

    #[test]
    fn sjf_orders_by_burst() {
        let queue = queue_with(
            SchedPolicy::ShortestJobFirst,
            &[('A', 30), ('B', 10), ('C', 20)],
        );
        assert_eq!(drain(queue), "BCA");
    }

    #[test]
    fn sjf_keeps_insertion_order_among_equals() {
        let queue = queue_with(
            SchedPolicy::ShortestJobFirst,
            &[('A', 5), ('B', 1), ('C', 5), ('D', 1), ('E', 5)],
        );
        assert_eq!(drain(queue), "BDACE");
    }

    #[test]
    fn remove_front_on_empty_queue() {
        let mut queue: ReadyQueue<Job> = ReadyQueue::new(SchedPolicy::RoundRobin);
        assert!(queue.is_empty());
        assert_eq!(queue.remove_front(), None);
    }

    #[test]
    fn removed_entity_is_gone_until_appended_again() {
        let mut queue = queue_with(SchedPolicy::RoundRobin, &[('A', 0), ('B', 0)]);
        let a = queue.remove_front().unwrap();
        assert_eq!(a.name, 'A');
        assert!(queue.iter().all(|job| job.name != 'A'));
        assert_eq!(queue.len(), 1);

        queue.append(a);
        assert_eq!(drain(queue), "BA");
    }

    #[test]
    fn policy_changes_only_when_empty() {
        let mut queue = queue_with(SchedPolicy::RoundRobin, &[('A', 0)]);
        assert_eq!(
            queue
                .set_policy(SchedPolicy::ShortestJobFirst)
                .map_err(|err| err.error()),
            Err(Errno::EBUSY)
        );
        queue.remove_front();
        queue.set_policy(SchedPolicy::ShortestJobFirst).unwrap();
        assert_eq!(queue.policy(), SchedPolicy::ShortestJobFirst);
    }
}
