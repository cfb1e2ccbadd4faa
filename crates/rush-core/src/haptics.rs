use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HapticKind {
    Correct,
    Incorrect,
    Rare,
    RoundOver,
}

/// Best-effort device feedback. Implementations must not block or fail.
pub trait HapticFeedback: Send + Sync {
    fn trigger(&self, kind: HapticKind);
}

/// Feedback sink for platforms without haptics
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl HapticFeedback for NoHaptics {
    fn trigger(&self, kind: HapticKind) {
        tracing::trace!(?kind, "haptics disabled");
    }
}
