// SPDX-License-Identifier: MPL-2.0

use int_to_c_enum::TryFromInt;

/// The scheduling state of a thread.
#[derive(Clone, Copy, PartialEq, Eq, Debug, TryFromInt)]
#[repr(u8)]
pub enum ThreadStatus {
    /// Created but never made ready.
    Init = 0,
    Ready = 1,
    Running = 2,
    /// Waiting for something, e.g. for its sleep to end.
    Blocked = 3,
    /// Finished; destroyed once another thread runs.
    Terminated = 4,
}

impl ThreadStatus {
    pub fn is_ready(&self) -> bool {
        *self == ThreadStatus::Ready
    }

    pub fn is_running(&self) -> bool {
        *self == ThreadStatus::Running
    }

    pub fn is_terminated(&self) -> bool {
        *self == ThreadStatus::Terminated
    }

    /// Whether a thread in this state may move to `next`.
    ///
    /// `Init -> Running` only happens to the thread that boots the kernel,
    /// which is already executing when it is registered.
    pub fn can_become(&self, next: ThreadStatus) -> bool {
        use ThreadStatus::*;

        matches!(
            (*self, next),
            (Init, Ready)
                | (Init, Running)
                | (Ready, Running)
                | (Running, Ready)
                | (Running, Blocked)
                | (Running, Terminated)
                | (Blocked, Ready)
        )
    }
}

impl From<ThreadStatus> for u8 {
    fn from(value: ThreadStatus) -> Self {
        value as u8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn legal_transitions() {
        use ThreadStatus::*;

        assert!(Init.can_become(Ready));
        assert!(Ready.can_become(Running));
        assert!(Running.can_become(Ready));
        assert!(Running.can_become(Blocked));
        assert!(Blocked.can_become(Ready));
        assert!(Running.can_become(Terminated));

        assert!(!Ready.can_become(Ready));
        assert!(!Blocked.can_become(Running));
        assert!(!Terminated.can_become(Ready));
        assert!(!Ready.can_become(Blocked));
    }

    #[test]
    fn raw_round_trip() {
        assert!(matches!(
            ThreadStatus::try_from(3u8),
            Ok(ThreadStatus::Blocked)
        ));
        assert_eq!(u8::from(ThreadStatus::Terminated), 4);
        assert!(ThreadStatus::try_from(9u8).is_err());
    }
}
