//! Leaderboard facade over a remote table and the local score cache
//!
//! Every call tries the remote table first when one is configured and falls
//! back to the local cache on any failure. A single call never mixes rows
//! from both backends.

mod entry;
mod persistence;
mod remote;
mod ws;

pub use entry::{Backend, NewScore, ScoreEntry, Submission};
pub use persistence::{MemoryStore, PersistenceProvider};
pub use remote::{sort_rows, MemoryTable, RemoteTableProvider, TableOrder, TableQuery};
pub use ws::WsTable;

use crate::category::Category;
use crate::config::{LeaderboardConfig, RemoteSetting};
use crate::error::{LeaderboardError, LeaderboardResult, RemoteError, StorageError};
use crate::name::{NameValidator, PlayerName};
use crate::ranking::{aggregate, within_period, Period, RankingView};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Current instant and the start of a period, resolved in the clock's own zone
type Clock = Arc<dyn Fn(Period) -> (DateTime<Utc>, Option<DateTime<Utc>>) + Send + Sync>;

fn zoned<Tz>(now: impl Fn() -> DateTime<Tz> + Send + Sync + 'static) -> Clock
where
    Tz: TimeZone + 'static,
{
    Arc::new(move |period| {
        let now = now();
        (now.with_timezone(&Utc), period.cutoff(&now))
    })
}

/// Which backends are in play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardStatus {
    pub remote: Option<&'static str>,
    pub local: &'static str,
    /// Whether the last remote call failed and the local cache answered
    pub using_fallback: bool,
}

impl LeaderboardStatus {
    /// Backend that answered the last call
    pub fn active(&self) -> Backend {
        if self.remote.is_some() && !self.using_fallback {
            Backend::Remote
        } else {
            Backend::Local
        }
    }
}

pub struct LeaderboardStore {
    config: LeaderboardConfig,
    local: Arc<dyn PersistenceProvider>,
    remote: Option<Arc<dyn RemoteTableProvider>>,
    clock: Clock,
    fell_back: AtomicBool,
    /// Held across the read-modify-write of the local cache
    local_lock: Mutex<()>,
}

impl std::fmt::Debug for LeaderboardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardStore")
            .field("local", &self.local.name())
            .field("remote", &self.remote.as_ref().map(|r| r.name()))
            .finish()
    }
}

impl LeaderboardStore {
    pub fn new(
        config: LeaderboardConfig,
        local: Arc<dyn PersistenceProvider>,
        remote: Option<Arc<dyn RemoteTableProvider>>,
    ) -> Self {
        Self {
            config,
            local,
            remote,
            clock: zoned(Local::now),
            fell_back: AtomicBool::new(false),
            local_lock: Mutex::new(()),
        }
    }

    /// Build the remote backend from the configured setting
    pub fn from_config(config: LeaderboardConfig, local: Arc<dyn PersistenceProvider>) -> Self {
        let remote = match &config.remote {
            RemoteSetting::Disabled => None,
            RemoteSetting::Enabled {
                endpoint,
                api_key,
                timeout_secs,
            } => {
                info!(%endpoint, "remote leaderboard enabled");
                Some(Arc::new(WsTable::new(endpoint.as_str(), api_key.as_str(), *timeout_secs))
                    as Arc<dyn RemoteTableProvider>)
            }
        };
        Self::new(config, local, remote)
    }

    /// Replace the wall clock used for timestamps and period cutoffs.
    ///
    /// Cutoffs are resolved in the zone of the returned time, so a zone with
    /// daylight saving must be passed as itself rather than as a fixed offset.
    pub fn with_clock<Tz>(mut self, now: impl Fn() -> DateTime<Tz> + Send + Sync + 'static) -> Self
    where
        Tz: TimeZone + 'static,
    {
        self.clock = zoned(now);
        self
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    pub fn status(&self) -> LeaderboardStatus {
        LeaderboardStatus {
            remote: self.remote.as_ref().map(|r| r.name()),
            local: self.local.name(),
            using_fallback: self.fell_back.load(Ordering::SeqCst),
        }
    }

    /// Store a score. Succeeds when at least one backend took it.
    pub async fn submit(&self, category: Category, player_name: &str, score: u32) -> LeaderboardResult<Submission> {
        let player = NameValidator::validate(player_name)?;
        let (created_at, _) = (self.clock)(Period::All);
        let new = NewScore {
            category,
            player_name: player,
            score,
            created_at,
        };

        let remote_err = match &self.remote {
            Some(remote) => match remote.insert(new.clone()).await {
                Ok(entry) => {
                    self.remote_ok();
                    info!(%category, player = %entry.player_name, score, "score submitted remotely");
                    return Ok(Submission {
                        entry,
                        backend: Backend::Remote,
                    });
                }
                Err(e) => Some(self.remote_failed("submit", e)),
            },
            None => None,
        };

        let entry = ScoreEntry::from_new(&new);
        match self.append_local(&entry).await {
            Ok(()) => {
                info!(%category, player = %entry.player_name, score, "score saved locally");
                Ok(Submission {
                    entry,
                    backend: Backend::Local,
                })
            }
            Err(local) => Err(unavailable(remote_err, local)),
        }
    }

    /// Best entry per player for `period`, highest first
    pub async fn query(&self, category: Category, period: Period) -> LeaderboardResult<RankingView> {
        let (_, cutoff) = (self.clock)(period);
        let limit = self.config.detail_limit;

        let remote_err = match &self.remote {
            Some(remote) => {
                let query = TableQuery::ranking(category, cutoff, self.config.fetch_limit);
                match remote.select(query).await {
                    Ok(rows) => {
                        self.remote_ok();
                        debug!(%category, ?period, rows = rows.len(), "remote ranking fetched");
                        let entries = aggregate(rows.into_iter().filter(|e| within_period(e, cutoff)), limit);
                        return Ok(RankingView::new(category, period, Backend::Remote, entries));
                    }
                    Err(e) => Some(self.remote_failed("query", e)),
                }
            }
            None => None,
        };

        let rows = self
            .load_local(category)
            .await
            .map_err(|local| unavailable(remote_err, local))?;
        let entries = aggregate(rows.into_iter().filter(|e| within_period(e, cutoff)), limit);
        Ok(RankingView::new(category, period, Backend::Local, entries))
    }

    /// Highest score of `player_name`, 0 when none
    pub async fn best_score(&self, category: Category, player_name: &str) -> LeaderboardResult<u32> {
        let player = NameValidator::validate(player_name)?;
        let query = TableQuery::player(category, player.as_str(), TableOrder::ScoreDesc, 1);
        let rows = self.player_rows(category, &player, query).await?;
        Ok(rows.first().map_or(0, |e| e.score))
    }

    /// Scores of `player_name`, newest first
    pub async fn history(&self, category: Category, player_name: &str) -> LeaderboardResult<Vec<ScoreEntry>> {
        let player = NameValidator::validate(player_name)?;
        let query = TableQuery::player(
            category,
            player.as_str(),
            TableOrder::NewestFirst,
            self.config.history_limit,
        );
        self.player_rows(category, &player, query).await
    }

    async fn player_rows(
        &self,
        category: Category,
        player: &PlayerName,
        query: TableQuery,
    ) -> LeaderboardResult<Vec<ScoreEntry>> {
        let remote_err = match &self.remote {
            Some(remote) => match remote.select(query.clone()).await {
                Ok(rows) => {
                    self.remote_ok();
                    return Ok(rows);
                }
                Err(e) => Some(self.remote_failed("player lookup", e)),
            },
            None => None,
        };

        let rows = self
            .load_local(category)
            .await
            .map_err(|local| unavailable(remote_err, local))?;
        debug!(%category, %player, "player rows from local cache");
        Ok(query.apply(rows.iter()))
    }

    /// Cached entries of `category`. Unreadable JSON counts as empty.
    async fn load_local(&self, category: Category) -> Result<Vec<ScoreEntry>, StorageError> {
        let key = category.storage_key();
        let Some(raw) = self.local.get(&key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<ScoreEntry>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(%key, error = %e, "discarding corrupt local rankings");
                Ok(Vec::new())
            }
        }
    }

    /// Append, keep highest scores first, cap the list
    async fn append_local(&self, entry: &ScoreEntry) -> Result<(), StorageError> {
        let _guard = self.local_lock.lock().await;
        let key = entry.category.storage_key();
        let mut entries = self.load_local(entry.category).await?;
        entries.push(entry.clone());
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(self.config.local_cap);

        let json = serde_json::to_string(&entries).map_err(|e| StorageError::Write {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.local.set(&key, json).await
    }

    fn remote_ok(&self) {
        self.fell_back.store(false, Ordering::SeqCst);
    }

    fn remote_failed(&self, op: &str, err: RemoteError) -> RemoteError {
        warn!(op, error = %err, "remote leaderboard failed, using local cache");
        self.fell_back.store(true, Ordering::SeqCst);
        err
    }
}

fn unavailable(remote: Option<RemoteError>, local: StorageError) -> LeaderboardError {
    match remote {
        Some(remote) => LeaderboardError::BothBackendsFailed { remote, local },
        None => LeaderboardError::Storage(local),
    }
}
