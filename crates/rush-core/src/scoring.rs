use crate::config::{CategoryConfig, TierTable};
use crate::item::{ChoiceSet, Tier};
use crate::session::RoundSession;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why a pick was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Feedback of the previous pick is still showing
    FeedbackPending,
    /// The round is over or was never started
    RoundOver,
    /// Index is not one of the offered choices
    OutOfRange,
}

/// What a pick did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceResult {
    Correct {
        tier: Tier,
        points: u32,
        /// Tier bonus plus streak bonus, in tenths
        time_bonus: u32,
        streak: u32,
    },
    Incorrect {
        penalty: u32,
    },
    /// Answer to a recall stage
    Recall {
        correct: bool,
        bonus: u32,
    },
    Rejected(RejectReason),
}

impl ChoiceResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ChoiceResult::Rejected(_))
    }
}

/// Applies points, streaks, bonuses and penalties to a session
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    tiers: TierTable,
    penalty: u32,
    streak_bonus: u32,
}

impl ScoringEngine {
    /// Streak length from which every correct pick earns the streak bonus
    pub const STREAK_THRESHOLD: u32 = 2;

    pub fn new(config: &CategoryConfig) -> Self {
        Self {
            tiers: config.tiers.clone(),
            penalty: config.penalty,
            streak_bonus: config.streak_bonus,
        }
    }

    /// Resolve a pick against the current set.
    ///
    /// Nothing changes when the pick is rejected: while feedback is pending,
    /// once the round has ended, or for an index outside the set.
    pub fn resolve(
        &self,
        session: &mut RoundSession,
        set: &ChoiceSet,
        index: usize,
        feedback_pending: bool,
    ) -> ChoiceResult {
        if !session.is_active() {
            return ChoiceResult::Rejected(RejectReason::RoundOver);
        }
        if feedback_pending {
            return ChoiceResult::Rejected(RejectReason::FeedbackPending);
        }
        if index >= set.len() {
            return ChoiceResult::Rejected(RejectReason::OutOfRange);
        }

        if set.is_correct(index) {
            let tier = set.tier();
            let points = self.tiers.points(tier);
            session.score += points;
            session.streak += 1;
            session.best_streak = session.best_streak.max(session.streak);
            session.correct += 1;

            let mut time_bonus = self.tiers.time_bonus(tier);
            if session.streak >= Self::STREAK_THRESHOLD {
                time_bonus += self.streak_bonus;
            }
            if time_bonus > 0 {
                session.clock.add_time(time_bonus);
            }

            debug!(score = session.score, streak = session.streak, ?tier, time_bonus, "correct pick");
            ChoiceResult::Correct {
                tier,
                points,
                time_bonus,
                streak: session.streak,
            }
        } else {
            session.clock.subtract_time(self.penalty);
            session.streak = 0;
            session.incorrect += 1;

            debug!(remaining = session.time_remaining(), penalty = self.penalty, "wrong pick");
            ChoiceResult::Incorrect {
                penalty: self.penalty,
            }
        }
    }
}
