//! Tunable game and leaderboard configuration

use crate::category::Category;
use crate::catalog::ItemSource;
use crate::error::ConfigError;
use crate::item::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Points and time bonus for one tier, with its base probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSpec {
    pub tier: Tier,
    /// Chance per choice set outside the fever window
    #[serde(default)]
    pub probability: f64,
    pub points: u32,
    /// Tenths of a second added on a correct pick
    #[serde(default)]
    pub time_bonus: u32,
    /// Replaces the target's glyph when this tier is rolled
    #[serde(default)]
    pub glyph: Option<String>,
    /// Replaces the target's name in the prompt when this tier is rolled
    #[serde(default)]
    pub label: Option<String>,
}

impl TierSpec {
    pub fn normal(points: u32, time_bonus: u32) -> Self {
        Self {
            tier: Tier::Normal,
            probability: 1.0,
            points,
            time_bonus,
            glyph: None,
            label: None,
        }
    }

    pub fn rare(tier: Tier, probability: f64, points: u32, time_bonus: u32) -> Self {
        Self {
            tier,
            probability,
            points,
            time_bonus,
            glyph: None,
            label: None,
        }
    }

    pub fn dressed(mut self, glyph: &str, label: &str) -> Self {
        self.glyph = Some(glyph.to_string());
        self.label = Some(label.to_string());
        self
    }
}

/// Declarative tier table. Missing tiers have probability 0; a missing
/// Normal tier scores 1 point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierTable {
    specs: Vec<TierSpec>,
}

impl TierTable {
    pub fn new(specs: Vec<TierSpec>) -> Self {
        Self { specs }
    }

    pub fn get(&self, tier: Tier) -> Option<&TierSpec> {
        self.specs.iter().find(|s| s.tier == tier)
    }

    pub fn points(&self, tier: Tier) -> u32 {
        self.get(tier)
            .map(|s| s.points)
            .unwrap_or(if tier == Tier::Normal { 1 } else { 0 })
    }

    pub fn time_bonus(&self, tier: Tier) -> u32 {
        self.get(tier).map(|s| s.time_bonus).unwrap_or(0)
    }

    pub fn probability(&self, tier: Tier) -> f64 {
        self.get(tier).map(|s| s.probability).unwrap_or(0.0)
    }

    pub fn specs(&self) -> &[TierSpec] {
        &self.specs
    }
}

/// Late-round boost of the rare tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeverConfig {
    /// Final stretch of the countdown, in tenths of a second
    pub window: u32,
    /// Applied to rare-tier probabilities while inside the window
    pub multiplier: f64,
}

impl Default for FeverConfig {
    fn default() -> Self {
        Self {
            window: 100,
            multiplier: 10.0,
        }
    }
}

/// What a recall bonus stage asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallKind {
    /// The decoy shown most recently
    LastDistractor,
    /// The first decoy of the round
    FirstDistractor,
}

/// One entry of the ordered chained-bonus list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusStageSpec {
    pub kind: RecallKind,
    /// Chance that this stage runs, rolled independently of the others
    pub probability: f64,
    /// Points added for a correct recall
    pub bonus: u32,
    /// Options offered, answer included
    pub option_count: usize,
    /// Ticks the result stays on screen before moving on
    pub reveal_ticks: u32,
}

impl BonusStageSpec {
    pub fn new(kind: RecallKind, probability: f64) -> Self {
        Self {
            kind,
            probability,
            bonus: 2,
            option_count: 4,
            reveal_ticks: 20,
        }
    }
}

/// Everything that shapes a round of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Starting time in tenths of a second
    pub initial_time: u32,
    /// Tenths of a second removed on a wrong pick
    pub penalty: u32,
    pub choice_count: usize,
    pub tiers: TierTable,
    pub fever: FeverConfig,
    /// Tenths of a second added per correct pick while the streak is 2 or more
    pub streak_bonus: u32,
    /// Ticks the feedback of a pick stays up; input is dropped meanwhile
    pub feedback_ticks: u32,
    pub bonus_stages: Vec<BonusStageSpec>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            initial_time: 300,
            penalty: 30,
            choice_count: 2,
            // Rare tiers are opt-in per category
            tiers: TierTable::new(vec![TierSpec::normal(1, 0)]),
            fever: FeverConfig::default(),
            streak_bonus: 5,
            feedback_ticks: 3,
            bonus_stages: Vec::new(),
        }
    }
}

impl CategoryConfig {
    pub fn defaults(category: Category) -> Self {
        match category {
            Category::Strawberry => Self::strawberry(),
            Category::Island | Category::Flag | Category::Square => Self::default(),
            Category::Color => Self::color(),
        }
    }

    pub fn strawberry() -> Self {
        Self {
            tiers: TierTable::new(vec![
                TierSpec::normal(1, 0),
                TierSpec::rare(Tier::Rare, 0.03, 3, 10).dressed("🍰", "cake"),
                TierSpec::rare(Tier::UltraRare, 0.01, 5, 50).dressed("🎂", "whole cake"),
            ]),
            fever: FeverConfig {
                window: 100,
                multiplier: 5.0,
            },
            bonus_stages: vec![
                BonusStageSpec::new(RecallKind::LastDistractor, 1.0),
                BonusStageSpec::new(RecallKind::FirstDistractor, 0.5),
            ],
            ..Self::default()
        }
    }

    /// Every correct colour buys back a second
    pub fn color() -> Self {
        Self {
            tiers: TierTable::new(vec![TierSpec::normal(1, 10)]),
            ..Self::default()
        }
    }

    pub fn validate(&self, category: Category) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { category, reason };

        if self.choice_count < 2 {
            return Err(invalid(format!(
                "choice_count must be at least 2, got {}",
                self.choice_count
            )));
        }
        let capacity = ItemSource::for_category(category).decoy_capacity();
        if self.choice_count - 1 > capacity {
            return Err(invalid(format!(
                "choice_count {} needs {} decoys but the pool has {}",
                self.choice_count,
                self.choice_count - 1,
                capacity
            )));
        }
        for spec in self.tiers.specs() {
            if !(0.0..=1.0).contains(&spec.probability) {
                return Err(invalid(format!(
                    "{:?} probability {} is outside [0, 1]",
                    spec.tier, spec.probability
                )));
            }
        }
        if !self.fever.multiplier.is_finite() || self.fever.multiplier < 0.0 {
            return Err(invalid(format!(
                "fever multiplier {} must be a non-negative number",
                self.fever.multiplier
            )));
        }
        for stage in &self.bonus_stages {
            if !(0.0..=1.0).contains(&stage.probability) {
                return Err(invalid(format!(
                    "{:?} stage probability {} is outside [0, 1]",
                    stage.kind, stage.probability
                )));
            }
            if stage.option_count < 2 {
                return Err(invalid(format!(
                    "{:?} stage needs at least 2 options",
                    stage.kind
                )));
            }
        }
        Ok(())
    }
}

/// Per-category configuration for every game mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    categories: BTreeMap<Category, CategoryConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL
                .into_iter()
                .map(|c| (c, CategoryConfig::defaults(c)))
                .collect(),
        }
    }
}

impl GameConfig {
    /// Parse JSON; categories the document leaves out get their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: GameConfig = serde_json::from_str(json)?;
        for category in Category::ALL {
            config
                .categories
                .entry(category)
                .or_insert_with(|| CategoryConfig::defaults(category));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (category, config) in &self.categories {
            config.validate(*category)?;
        }
        Ok(())
    }

    pub fn category(&self, category: Category) -> CategoryConfig {
        self.categories
            .get(&category)
            .cloned()
            .unwrap_or_else(|| CategoryConfig::defaults(category))
    }

    pub fn set_category(&mut self, category: Category, config: CategoryConfig) {
        self.categories.insert(category, config);
    }
}

/// Remote leaderboard connection, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RemoteSetting {
    Disabled,
    Enabled {
        endpoint: String,
        api_key: String,
        timeout_secs: u64,
    },
}

impl RemoteSetting {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Read `RUSH_REMOTE_URL`, `RUSH_API_KEY` and `RUSH_REMOTE_TIMEOUT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Disabled unless both the endpoint and the key are present and non-empty
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match (present("RUSH_REMOTE_URL"), present("RUSH_API_KEY")) {
            (Some(endpoint), Some(api_key)) => {
                let timeout_secs = present("RUSH_REMOTE_TIMEOUT")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);
                RemoteSetting::Enabled {
                    endpoint: endpoint.trim().to_string(),
                    api_key: api_key.trim().to_string(),
                    timeout_secs,
                }
            }
            _ => RemoteSetting::Disabled,
        }
    }
}

/// Leaderboard limits and backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    pub remote: RemoteSetting,
    /// Entries kept in each local cache
    pub local_cap: usize,
    /// Rows fetched remotely before de-duplication
    pub fetch_limit: usize,
    /// Size of the full ranking view
    pub detail_limit: usize,
    /// Size of the compact ranking view
    pub compact_limit: usize,
    /// Entries returned by a player's history
    pub history_limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            remote: RemoteSetting::Disabled,
            local_cap: 30,
            fetch_limit: 100,
            detail_limit: 30,
            compact_limit: 10,
            history_limit: 100,
        }
    }
}

impl LeaderboardConfig {
    pub fn from_env() -> Self {
        Self {
            remote: RemoteSetting::from_env(),
            ..Self::default()
        }
    }

    pub fn with_remote(mut self, remote: RemoteSetting) -> Self {
        self.remote = remote;
        self
    }
}
