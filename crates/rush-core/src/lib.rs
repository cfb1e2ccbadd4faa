//! Core of the rush mini-games
//!
//! Provides:
//! - A tick-driven round engine: countdown clock, choice-set generator with
//!   rare tiers and a late-round fever boost, scoring with streak bonuses, and
//!   chained recall stages after the countdown
//! - A leaderboard facade with remote/local fallback and per-player ranking

pub mod bonus;
pub mod catalog;
pub mod category;
pub mod clock;
pub mod config;
pub mod dice;
pub mod error;
pub mod generator;
pub mod haptics;
pub mod item;
pub mod leaderboard;
pub mod name;
pub mod ranking;
pub mod round;
pub mod scoring;
pub mod session;
pub mod timer;

pub use bonus::{DistractorLog, RecallStage};
pub use category::Category;
pub use clock::{ClockSignal, RoundClock};
pub use config::{
    BonusStageSpec, CategoryConfig, FeverConfig, GameConfig, LeaderboardConfig, RecallKind, RemoteSetting,
    TierSpec, TierTable,
};
pub use dice::{Dice, RngDice};
pub use error::{ConfigError, LeaderboardError, LeaderboardResult, NameError, RemoteError, StorageError};
pub use generator::ItemGenerator;
pub use haptics::{HapticFeedback, HapticKind, NoHaptics};
pub use item::{ChoiceSet, Item, Tier};
pub use leaderboard::{
    Backend, LeaderboardStatus, LeaderboardStore, MemoryStore, MemoryTable, PersistenceProvider,
    RemoteTableProvider, ScoreEntry, Submission, WsTable,
};
pub use name::{NameValidator, PlayerName, MAX_NAME_CHARS};
pub use ranking::{aggregate, Period, RankingView};
pub use round::{RoundController, RoundPhase, StartError};
pub use scoring::{ChoiceResult, RejectReason, ScoringEngine};
pub use session::{RoundOutcome, RoundSession, SessionStatus};

/// Length of one timer signal; the clock counts in these tenths of a second
pub const TICK_MILLIS: u64 = 100;
