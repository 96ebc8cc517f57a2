//! Narrow view of the external scheduler's notion of "now".
//!
//! Socket behavior never depends on time. The clock only stamps trace records
//! so a host simulator can line bus activity up with its own timeline.

use std::cell::Cell;
use std::fmt;

/// Simulation timestamp in picoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimTime(pub u64);

impl SimTime {
    /// Start of simulation.
    pub const ZERO: Self = Self(0);

    /// Builds a timestamp from nanoseconds, saturating on overflow.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos.saturating_mul(1_000))
    }

    /// Raw picosecond count.
    #[must_use]
    pub const fn as_picos(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ps", self.0)
    }
}

/// Source of the current simulation time.
pub trait SimClock {
    /// Returns the current simulation time.
    fn now(&self) -> SimTime;
}

/// Clock advanced by hand, for harnesses without a scheduler.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<SimTime>,
}

impl ManualClock {
    /// Creates a clock at [`SimTime::ZERO`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jumps to `time`.
    pub fn set(&self, time: SimTime) {
        self.now.set(time);
    }

    /// Moves forward by `delta` picoseconds.
    pub fn advance(&self, delta: u64) {
        let SimTime(now) = self.now.get();
        self.now.set(SimTime(now.saturating_add(delta)));
    }
}

impl SimClock for ManualClock {
    fn now(&self) -> SimTime {
        self.now.get()
    }
}
