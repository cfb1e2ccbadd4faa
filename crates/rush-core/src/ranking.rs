//! Period filtering and per-player aggregation of score entries

use crate::category::Category;
use crate::leaderboard::{Backend, ScoreEntry};
use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    All,
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::All, Period::Daily, Period::Weekly, Period::Monthly];

    pub fn label(self) -> &'static str {
        match self {
            Period::All => "All time",
            Period::Daily => "Today",
            Period::Weekly => "This week",
            Period::Monthly => "This month",
        }
    }

    /// Start of the period containing `now`, in the time zone of `now`.
    ///
    /// Days start at midnight, weeks on Monday, months on the 1st. `All` has
    /// no cutoff.
    pub fn cutoff<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let start = match self {
            Period::All => return None,
            Period::Daily => today,
            Period::Weekly => {
                let back = u64::from(now.weekday().num_days_from_monday());
                today.checked_sub_days(Days::new(back)).unwrap_or(today)
            }
            Period::Monthly => today.with_day(1).unwrap_or(today),
        };
        Some(local_midnight(&now.timezone(), start))
    }

    pub fn next(self) -> Self {
        match self {
            Period::All => Period::Daily,
            Period::Daily => Period::Weekly,
            Period::Weekly => Period::Monthly,
            Period::Monthly => Period::All,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Period::All),
            "daily" | "day" | "today" => Ok(Period::Daily),
            "weekly" | "week" => Ok(Period::Weekly),
            "monthly" | "month" => Ok(Period::Monthly),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.with_timezone(&Utc),
        // Midnight skipped by a DST jump
        LocalResult::None => tz.from_utc_datetime(&midnight).with_timezone(&Utc),
    }
}

/// Inclusive: an entry created exactly at the cutoff is kept
pub fn within_period(entry: &ScoreEntry, cutoff: Option<DateTime<Utc>>) -> bool {
    cutoff.map_or(true, |c| entry.created_at >= c)
}

fn beats(candidate: &ScoreEntry, current: &ScoreEntry) -> bool {
    candidate.score > current.score
        || (candidate.score == current.score && candidate.created_at < current.created_at)
}

/// Best entry per player, highest score first, at most `limit` entries.
///
/// Ties on score keep the earliest entry. Equal scores across players rank
/// the earlier entry first.
pub fn aggregate(entries: impl IntoIterator<Item = ScoreEntry>, limit: usize) -> Vec<ScoreEntry> {
    let mut best: HashMap<String, ScoreEntry> = HashMap::new();
    for entry in entries {
        match best.entry(entry.player_name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                if beats(&entry, slot.get()) {
                    slot.insert(entry);
                }
            }
        }
    }

    let mut ranked: Vec<ScoreEntry> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.player_name.cmp(&b.player_name))
    });
    ranked.truncate(limit);
    ranked
}

/// Period filter followed by [`aggregate`]
pub fn rank<Tz: TimeZone>(
    entries: impl IntoIterator<Item = ScoreEntry>,
    period: Period,
    now: &DateTime<Tz>,
    limit: usize,
) -> Vec<ScoreEntry> {
    let cutoff = period.cutoff(now);
    aggregate(
        entries.into_iter().filter(|e| within_period(e, cutoff)),
        limit,
    )
}

/// A computed ranking. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingView {
    pub category: Category,
    pub period: Period,
    pub source: Backend,
    pub entries: Vec<ScoreEntry>,
}

impl RankingView {
    pub fn new(category: Category, period: Period, source: Backend, entries: Vec<ScoreEntry>) -> Self {
        Self {
            category,
            period,
            source,
            entries,
        }
    }

    /// Top `limit` entries, for the short list under a finished round
    pub fn compact(&self, limit: usize) -> &[ScoreEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    /// 1-based position of `player`
    pub fn rank_of(&self, player: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.player_name == player)
            .map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
