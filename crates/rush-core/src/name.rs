use crate::error::NameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted player name, in characters
pub const MAX_NAME_CHARS: usize = 12;

/// A trimmed, non-empty player name of at most [`MAX_NAME_CHARS`] characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        NameValidator::validate(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NameValidator::validate(&value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

/// Trims and length-checks names before a round can start
pub struct NameValidator;

impl NameValidator {
    pub fn validate(raw: &str) -> Result<PlayerName, NameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        // Characters, not bytes: names are often Japanese
        let len = trimmed.chars().count();
        if len > MAX_NAME_CHARS {
            return Err(NameError::TooLong {
                len,
                max: MAX_NAME_CHARS,
            });
        }
        Ok(PlayerName(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_whitespace() {
        let name = NameValidator::validate("  Aki ").unwrap();
        assert_eq!(name.as_str(), "Aki");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(NameValidator::validate(""), Err(NameError::Empty));
        assert_eq!(NameValidator::validate("   "), Err(NameError::Empty));
    }

    #[test]
    fn test_length_limit_counts_characters() {
        assert!(NameValidator::validate("いちごだいすきプレイヤー").is_ok());
        assert!(NameValidator::validate("abcdefghijkl").is_ok());
        assert_eq!(
            NameValidator::validate("abcdefghijklm"),
            Err(NameError::TooLong { len: 13, max: 12 })
        );
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<PlayerName>("\"Aki\"").is_ok());
        assert!(serde_json::from_str::<PlayerName>("\"\"").is_err());
    }
}
