use crate::category::Category;
use crate::name::PlayerName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One submitted score. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub id: String,
    pub player_name: String,
    pub score: u32,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

impl ScoreEntry {
    /// Stamp a new score with a fresh id
    pub fn from_new(score: &NewScore) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            player_name: score.player_name.as_str().to_string(),
            score: score.score,
            category: score.category,
            created_at: score.created_at,
        }
    }
}

/// A score about to be inserted; the backend assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub category: Category,
    pub player_name: PlayerName,
    pub score: u32,
    pub created_at: DateTime<Utc>,
}

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Remote,
    Local,
}

/// A stored score and the backend that took it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub entry: ScoreEntry,
    pub backend: Backend,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Remote => write!(f, "Remote"),
            Backend::Local => write!(f, "Local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_json_shape() {
        let entry = ScoreEntry {
            id: "1".into(),
            player_name: "Aki".into(),
            score: 12,
            category: Category::Strawberry,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["playerName"], "Aki");
        assert_eq!(json["category"], "strawberry");
        assert_eq!(json["createdAt"], "2024-05-01T09:30:00Z");
    }

    #[test]
    fn test_fresh_ids() {
        let new = NewScore {
            category: Category::Flag,
            player_name: PlayerName::parse("Aki").unwrap(),
            score: 3,
            created_at: Utc::now(),
        };
        assert_ne!(ScoreEntry::from_new(&new).id, ScoreEntry::from_new(&new).id);
    }
}
