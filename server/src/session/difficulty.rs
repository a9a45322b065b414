use std::fmt;
use std::str::FromStr;

use engine::SearchParams;
use serde::{Deserialize, Serialize};

use super::commands::SessionError;

/// Strength tier of the automated player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Search depth and target Elo for this tier.
    ///
    /// Beginner's 1200 sits below Stockfish's `UCI_Elo` minimum of 1320; the
    /// engine ignores it and the oracle logs a warning when it is applied.
    pub fn search_params(self) -> SearchParams {
        let (depth, elo) = match self {
            Self::Beginner => (8, 1200),
            Self::Intermediate => (12, 1600),
            Self::Advanced => (18, 2200),
        };
        SearchParams {
            depth,
            target_elo: Some(elo),
        }
    }
}

impl FromStr for Difficulty {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| SessionError::InvalidDifficulty(s.to_string()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
