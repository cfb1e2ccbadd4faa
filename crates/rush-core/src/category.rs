use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The independent game modes. Each keeps its own leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Strawberry,
    Island,
    Flag,
    Color,
    Square,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Strawberry,
        Category::Island,
        Category::Flag,
        Category::Color,
        Category::Square,
    ];

    /// Stable key used in JSON and on the command line
    pub fn key(self) -> &'static str {
        match self {
            Self::Strawberry => "strawberry",
            Self::Island => "island",
            Self::Flag => "flag",
            Self::Color => "color",
            Self::Square => "square",
        }
    }

    /// Value of the `game_type` column in the remote table
    pub fn game_type(self) -> &'static str {
        match self {
            Self::Strawberry => "strawberry_rush",
            Self::Island => "island_rush",
            Self::Flag => "flag_rush",
            Self::Color => "color_rush",
            Self::Square => "square_rush",
        }
    }

    pub fn from_game_type(game_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.game_type() == game_type)
    }

    /// Key of the local ranking cache for this category
    pub fn storage_key(self) -> String {
        format!("{}_game_rankings", self.key())
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Strawberry => "Strawberry Rush",
            Self::Island => "Island Rush",
            Self::Flag => "Flag Rush",
            Self::Color => "Color Rush",
            Self::Square => "Square Rush",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.key() == wanted || c.game_type() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|c| c.key()).collect();
                format!("unknown category '{}' (expected one of {})", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>(), Ok(category));
            assert_eq!(Category::from_game_type(category.game_type()), Some(category));
        }
    }

    #[test]
    fn test_storage_keys_are_category_scoped() {
        assert_eq!(Category::Strawberry.storage_key(), "strawberry_game_rankings");
        assert_eq!(Category::Flag.storage_key(), "flag_game_rankings");
    }

    #[test]
    fn test_unknown_category() {
        let err = "chess".parse::<Category>().unwrap_err();
        assert!(err.contains("chess"));
    }

    #[test]
    fn test_serde_uses_key() {
        let json = serde_json::to_string(&Category::Island).unwrap();
        assert_eq!(json, "\"island\"");
    }
}
