// SPDX-License-Identifier: MPL-2.0

use core::fmt;

const FRAC_BITS: u32 = 8;
const FRAC_MASK: u64 = (1 << FRAC_BITS) - 1;

/// An estimate of how many ticks a thread runs before it blocks again.
///
/// The value is a fixed-point number of ticks with 8 fractional bits, so
/// that the kernel never touches floating-point registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct BurstTime(u64);

impl BurstTime {
    pub const ZERO: Self = Self(0);

    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks.saturating_mul(1 << FRAC_BITS))
    }

    /// The whole ticks of the estimate, rounded down.
    pub const fn whole_ticks(self) -> u64 {
        self.0 >> FRAC_BITS
    }

    /// Folds the length of the last burst into the estimate.
    ///
    /// `new = 0.5 * old + 0.5 * actual`, rounded down to the fixed-point
    /// resolution.
    pub const fn smoothed(self, actual_ticks: u64) -> Self {
        let actual = Self::from_ticks(actual_ticks).0;
        Self((self.0 >> 1) + (actual >> 1) + (self.0 & actual & 1))
    }
}

impl fmt::Display for BurstTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundredths = ((self.0 & FRAC_MASK) * 100) >> FRAC_BITS;
        write!(f, "{}.{:02}", self.whole_ticks(), hundredths)
    }
}
