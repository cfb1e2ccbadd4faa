use crate::category::Category;
use crate::clock::RoundClock;
use crate::name::PlayerName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Countdown running, picks accepted
    Active,
    /// Countdown over, chained recall stages running
    Bonus,
    /// Score finalized
    Ended,
}

/// State of the round in progress. The controller owns the only instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSession {
    pub category: Category,
    pub player: PlayerName,
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub correct: u32,
    pub incorrect: u32,
    /// Points earned in recall stages
    pub bonus_awarded: u32,
    pub clock: RoundClock,
    pub status: SessionStatus,
}

impl RoundSession {
    pub fn new(category: Category, player: PlayerName, initial_time: u32) -> Self {
        Self {
            category,
            player,
            score: 0,
            streak: 0,
            best_streak: 0,
            correct: 0,
            incorrect: 0,
            bonus_awarded: 0,
            clock: RoundClock::new(initial_time),
            status: SessionStatus::Active,
        }
    }

    /// Tenths of a second left
    pub fn time_remaining(&self) -> u32 {
        self.clock.remaining()
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active && !self.clock.is_expired()
    }
}

/// Final result of a round, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub category: Category,
    pub player: PlayerName,
    pub score: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub best_streak: u32,
    pub bonus_awarded: u32,
}

impl From<RoundSession> for RoundOutcome {
    fn from(session: RoundSession) -> Self {
        Self {
            category: session.category,
            player: session.player,
            score: session.score,
            correct: session.correct,
            incorrect: session.incorrect,
            best_streak: session.best_streak,
            bonus_awarded: session.bonus_awarded,
        }
    }
}
