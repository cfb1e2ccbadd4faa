//! Round countdown in tenths of a second

use serde::{Deserialize, Serialize};

/// Result of a clock update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockSignal {
    /// Tenths of a second left
    Running(u32),
    Expired,
}

/// Countdown driven by an external timer signal.
///
/// Time is an integer count of tenths of a second. Once expired, every
/// further update is ignored so a late timer callback cannot end the round
/// a second time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundClock {
    initial: u32,
    remaining: u32,
    expired: bool,
}

impl RoundClock {
    pub fn new(initial: u32) -> Self {
        Self {
            initial,
            remaining: initial,
            expired: false,
        }
    }

    /// One timer signal: remove one tenth of a second
    pub fn tick(&mut self) -> ClockSignal {
        if self.expired {
            return ClockSignal::Expired;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            return ClockSignal::Expired;
        }
        ClockSignal::Running(self.remaining)
    }

    pub fn add_time(&mut self, delta: u32) -> ClockSignal {
        if self.expired {
            return ClockSignal::Expired;
        }
        self.remaining = self.remaining.saturating_add(delta);
        ClockSignal::Running(self.remaining)
    }

    /// Floors at zero; the round ends on the next tick
    pub fn subtract_time(&mut self, delta: u32) -> ClockSignal {
        if self.expired {
            return ClockSignal::Expired;
        }
        self.remaining = self.remaining.saturating_sub(delta);
        ClockSignal::Running(self.remaining)
    }

    /// End the countdown immediately
    pub fn expire(&mut self) -> bool {
        if self.expired {
            return false;
        }
        self.remaining = 0;
        self.expired = true;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn initial(&self) -> u32 {
        self.initial
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whether the clock is inside the last `window` tenths
    pub fn within_last(&self, window: u32) -> bool {
        !self.expired && self.remaining <= window
    }

    /// Remaining share of the starting time, for progress bars (may exceed 1.0)
    pub fn fraction(&self) -> f32 {
        if self.initial == 0 {
            0.0
        } else {
            self.remaining as f32 / self.initial as f32
        }
    }

    /// Format the remaining time as `SS.s`
    pub fn display(&self) -> String {
        format!("{}.{}", self.remaining / 10, self.remaining % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ticks_down_to_expiry() {
        let mut clock = RoundClock::new(3);
        assert_eq!(clock.tick(), ClockSignal::Running(2));
        assert_eq!(clock.tick(), ClockSignal::Running(1));
        assert_eq!(clock.tick(), ClockSignal::Expired);
        assert!(clock.is_expired());
    }

    #[test]
    fn test_subtract_floors_at_zero() {
        let mut clock = RoundClock::new(20);
        assert_eq!(clock.subtract_time(30), ClockSignal::Running(0));
        assert_eq!(clock.remaining(), 0);
        assert_eq!(clock.tick(), ClockSignal::Expired);
    }

    #[test]
    fn test_expired_clock_ignores_updates() {
        let mut clock = RoundClock::new(1);
        assert_eq!(clock.tick(), ClockSignal::Expired);
        assert_eq!(clock.add_time(50), ClockSignal::Expired);
        assert_eq!(clock.subtract_time(5), ClockSignal::Expired);
        assert_eq!(clock.tick(), ClockSignal::Expired);
        assert_eq!(clock.remaining(), 0);
        assert!(!clock.expire());
    }

    #[test]
    fn test_fever_window() {
        let mut clock = RoundClock::new(101);
        assert!(!clock.within_last(100));
        clock.tick();
        assert!(clock.within_last(100));
        clock.add_time(10);
        assert!(!clock.within_last(100));
    }

    #[test]
    fn test_display() {
        let clock = RoundClock::new(123);
        assert_eq!(clock.display(), "12.3");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Tick,
        Add(u32),
        Sub(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Tick),
            (0u32..100).prop_map(Op::Add),
            (0u32..400).prop_map(Op::Sub),
        ]
    }

    proptest! {
        #[test]
        fn prop_never_negative_and_expiry_sticks(
            initial in 0u32..600,
            ops in proptest::collection::vec(op(), 0..200),
        ) {
            let mut clock = RoundClock::new(initial);
            let mut was_expired = false;
            for op in ops {
                let before = clock.remaining();
                match op {
                    Op::Tick => { clock.tick(); }
                    Op::Add(d) => { clock.add_time(d); }
                    Op::Sub(d) => { clock.subtract_time(d); }
                }
                if was_expired {
                    prop_assert_eq!(clock.remaining(), before);
                }
                was_expired = clock.is_expired();
            }
        }
    }
}
