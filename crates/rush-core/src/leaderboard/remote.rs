//! Remote score table seam and its in-memory stand-in

use super::entry::{NewScore, ScoreEntry};
use crate::category::Category;
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Row ordering of a select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOrder {
    /// Score descending, then oldest first
    ScoreDesc,
    /// Newest first
    NewestFirst,
}

/// Filtered, ordered, limited select on the score table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub category: Category,
    pub player_name: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub since: Option<DateTime<Utc>>,
    pub order: TableOrder,
    pub limit: usize,
}

impl TableQuery {
    pub fn ranking(category: Category, since: Option<DateTime<Utc>>, limit: usize) -> Self {
        Self {
            category,
            player_name: None,
            since,
            order: TableOrder::ScoreDesc,
            limit,
        }
    }

    pub fn player(category: Category, player: &str, order: TableOrder, limit: usize) -> Self {
        Self {
            category,
            player_name: Some(player.to_string()),
            since: None,
            order,
            limit,
        }
    }

    pub fn matches(&self, entry: &ScoreEntry) -> bool {
        entry.category == self.category
            && self
                .player_name
                .as_deref()
                .map_or(true, |name| entry.player_name == name)
            && self.since.map_or(true, |since| entry.created_at >= since)
    }

    /// Run the query over rows held in memory
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a ScoreEntry>) -> Vec<ScoreEntry> {
        let mut out: Vec<ScoreEntry> = rows.into_iter().filter(|e| self.matches(e)).cloned().collect();
        sort_rows(&mut out, self.order);
        out.truncate(self.limit);
        out
    }
}

pub fn sort_rows(rows: &mut [ScoreEntry], order: TableOrder) {
    match order {
        TableOrder::ScoreDesc => rows.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.created_at.cmp(&b.created_at))
        }),
        TableOrder::NewestFirst => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// Shared score table reached over the network
#[async_trait]
pub trait RemoteTableProvider: Send + Sync {
    async fn insert(&self, score: NewScore) -> Result<ScoreEntry, RemoteError>;

    async fn select(&self, query: TableQuery) -> Result<Vec<ScoreEntry>, RemoteError>;

    /// Backend name for display
    fn name(&self) -> &'static str;
}

/// In-memory table for tests and offline play
pub struct MemoryTable {
    rows: Mutex<Vec<ScoreEntry>>,
    available: AtomicBool,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Set whether calls should succeed
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Insert a row as-is, bypassing availability
    pub fn insert_raw(&self, entry: ScoreEntry) {
        self.lock().push(entry);
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ScoreEntry>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Network("table unavailable".into()))
        }
    }
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteTableProvider for MemoryTable {
    async fn insert(&self, score: NewScore) -> Result<ScoreEntry, RemoteError> {
        self.check()?;
        let entry = ScoreEntry::from_new(&score);
        self.lock().push(entry.clone());
        Ok(entry)
    }

    async fn select(&self, query: TableQuery) -> Result<Vec<ScoreEntry>, RemoteError> {
        self.check()?;
        Ok(query.apply(self.lock().iter()))
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::PlayerName;
    use chrono::{Duration, TimeZone};

    fn entry(player: &str, score: u32, minute: u32, category: Category) -> ScoreEntry {
        ScoreEntry {
            id: format!("{}-{}", player, minute),
            player_name: player.into(),
            score,
            category,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let table = MemoryTable::new();
        table.insert_raw(entry("Aki", 5, 0, Category::Flag));
        table.insert_raw(entry("Ren", 9, 1, Category::Flag));
        table.insert_raw(entry("Mio", 9, 0, Category::Flag));
        table.insert_raw(entry("Sora", 50, 2, Category::Island));

        let rows = table
            .select(TableQuery::ranking(Category::Flag, None, 10))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|e| e.player_name.as_str()).collect();
        assert_eq!(names, vec!["Mio", "Ren", "Aki"]);

        let since = Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap();
        let rows = table
            .select(TableQuery::ranking(Category::Flag, Some(since), 10))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player_name, "Ren");
    }

    #[tokio::test]
    async fn test_player_history_newest_first() {
        let table = MemoryTable::new();
        for minute in 0..5 {
            table.insert_raw(entry("Aki", minute, minute, Category::Color));
        }
        let rows = table
            .select(TableQuery::player(Category::Color, "Aki", TableOrder::NewestFirst, 3))
            .await
            .unwrap();
        let scores: Vec<_> = rows.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![4, 3, 2]);
        assert!(rows[0].created_at - rows[1].created_at == Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_unavailable_table() {
        let table = MemoryTable::new();
        table.set_available(false);
        let new = NewScore {
            category: Category::Flag,
            player_name: PlayerName::parse("Aki").unwrap(),
            score: 1,
            created_at: Utc::now(),
        };
        assert!(matches!(table.insert(new).await, Err(RemoteError::Network(_))));
        assert_eq!(table.count(), 0);
    }
}
