//! File-backed key-value store under the user's data directory

use async_trait::async_trait;
use rush_core::{Category, PersistenceProvider, StorageError};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// One JSON file per key
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_local_dir>/rush`, or `./rush-data` when there is none
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("rush"))
            .unwrap_or_else(|| PathBuf::from("rush-data"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_key(key)))
    }

    /// Unique per write so concurrent writers never share a temp file
    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.tmp", safe_key(key), Uuid::new_v4().simple()))
    }
}

fn safe_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

#[async_trait]
impl PersistenceProvider for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let write_err = |e: std::io::Error| StorageError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        // Write then rename so a crash never leaves half a file
        let path = self.path(key);
        let tmp = self.temp_path(key);
        tokio::fs::write(&tmp, value).await.map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        debug!(path = %path.display(), "saved");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "File"
    }
}

const PROFILE_KEY: &str = "player_profile";

/// Remembered between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub player_name: String,
    pub category: Category,
    pub haptics_enabled: bool,
    pub dark_mode: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            category: Category::Strawberry,
            haptics_enabled: true,
            dark_mode: true,
        }
    }
}

impl Profile {
    /// Missing or unreadable profiles fall back to defaults
    pub async fn load(store: &dyn PersistenceProvider) -> Self {
        match store.get(PROFILE_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read profile");
                Self::default()
            }
        }
    }

    pub async fn save(&self, store: &dyn PersistenceProvider) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| StorageError::Write {
            key: PROFILE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        store.set(PROFILE_KEY, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rush_core::{Backend, LeaderboardConfig, LeaderboardStore, Period};
    use std::sync::Arc;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rush-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let store = FileStore::new(temp_dir("roundtrip"));
        assert_eq!(store.get("flag_game_rankings").await.unwrap(), None);
        store.set("flag_game_rankings", "[]".into()).await.unwrap();
        assert_eq!(
            store.get("flag_game_rankings").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(store.dir().join("flag_game_rankings.json").exists());
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn test_keys_are_sanitized() {
        let store = FileStore::new(temp_dir("sanitize"));
        store.set("../escape", "x".into()).await.unwrap();
        assert!(store.dir().join("___escape.json").exists());
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_one_key() {
        let store = Arc::new(FileStore::new(temp_dir("concurrent-set")));
        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set("flag_game_rankings", format!("[{}]", i)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let raw = store.get("flag_game_rankings").await.unwrap().unwrap();
        assert!(raw.starts_with('[') && raw.ends_with(']'));
        let leftovers = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submits_keep_every_score() {
        let files = Arc::new(FileStore::new(temp_dir("concurrent-submit")));
        let store = Arc::new(LeaderboardStore::new(LeaderboardConfig::default(), files.clone(), None));
        let tasks: Vec<_> = (0..10u32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.submit(Category::Flag, &format!("p{}", i), i).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().backend, Backend::Local);
        }

        let view = store.query(Category::Flag, Period::All).await.unwrap();
        assert_eq!(view.len(), 10);
        let _ = std::fs::remove_dir_all(files.dir());
    }

    #[tokio::test]
    async fn test_profile_defaults_and_save() {
        let store = FileStore::new(temp_dir("profile"));
        assert_eq!(Profile::load(&store).await, Profile::default());

        let profile = Profile {
            player_name: "Aki".into(),
            category: Category::Flag,
            haptics_enabled: false,
            dark_mode: false,
        };
        profile.save(&store).await.unwrap();
        assert_eq!(Profile::load(&store).await, profile);

        // Older files without the newer fields keep the defaults
        store
            .set(PROFILE_KEY, r#"{"player_name":"Ren"}"#.into())
            .await
            .unwrap();
        let partial = Profile::load(&store).await;
        assert_eq!(partial.player_name, "Ren");
        assert!(partial.haptics_enabled);

        store.set(PROFILE_KEY, "{broken".into()).await.unwrap();
        assert_eq!(Profile::load(&store).await, Profile::default());
        let _ = std::fs::remove_dir_all(store.dir());
    }
}
