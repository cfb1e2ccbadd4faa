//! Tick-driven one-shot timers owned by the round controller

/// A slot holding at most one armed timer.
///
/// The controller owns one slot per scheduled callback (feedback debounce,
/// recall reveal). Re-arming replaces the pending timer, and cancelling or
/// dropping the slot releases it, so a timer can never fire into a round
/// that has already moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSlot {
    label: &'static str,
    remaining: Option<u32>,
}

impl TimerSlot {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            remaining: None,
        }
    }

    /// Fire after `ticks` calls to [`advance`](Self::advance); 0 fires on the next call
    pub fn arm(&mut self, ticks: u32) {
        tracing::trace!(timer = self.label, ticks, "armed");
        self.remaining = Some(ticks);
    }

    pub fn cancel(&mut self) {
        if self.remaining.take().is_some() {
            tracing::trace!(timer = self.label, "cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Advance by one tick. Returns true exactly once, when the timer fires.
    pub fn advance(&mut self) -> bool {
        match self.remaining {
            None => false,
            Some(0) | Some(1) => {
                self.remaining = None;
                true
            }
            Some(n) => {
                self.remaining = Some(n - 1);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once() {
        let mut slot = TimerSlot::new("test");
        slot.arm(3);
        assert!(!slot.advance());
        assert!(!slot.advance());
        assert!(slot.advance());
        assert!(!slot.advance());
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_zero_fires_next_tick() {
        let mut slot = TimerSlot::new("test");
        slot.arm(0);
        assert!(slot.advance());
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut slot = TimerSlot::new("test");
        slot.arm(1);
        slot.cancel();
        assert!(!slot.advance());
    }

    #[test]
    fn test_rearm_replaces() {
        let mut slot = TimerSlot::new("test");
        slot.arm(1);
        slot.arm(2);
        assert!(!slot.advance());
        assert!(slot.advance());
    }
}
