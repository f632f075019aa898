//! Difficulty ladder for percentile tests.

use serde::{Deserialize, Serialize};

/// Named difficulty steps and the flat modifier each one applies to the target number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Simple,
    Easy,
    Routine,
    #[default]
    Average,
    Challenging,
    Difficult,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 8] = [
        Difficulty::Simple,
        Difficulty::Easy,
        Difficulty::Routine,
        Difficulty::Average,
        Difficulty::Challenging,
        Difficulty::Difficult,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    pub fn modifier(&self) -> i32 {
        match self {
            Difficulty::Simple => 30,
            Difficulty::Easy => 20,
            Difficulty::Routine => 10,
            Difficulty::Average => 0,
            Difficulty::Challenging => -10,
            Difficulty::Difficult => -20,
            Difficulty::Hard => -30,
            Difficulty::VeryHard => -40,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Difficulty::Simple => "simple",
            Difficulty::Easy => "easy",
            Difficulty::Routine => "routine",
            Difficulty::Average => "average",
            Difficulty::Challenging => "challenging",
            Difficulty::Difficult => "difficult",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very_hard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Simple => "Simple",
            Difficulty::Easy => "Easy",
            Difficulty::Routine => "Routine",
            Difficulty::Average => "Average",
            Difficulty::Challenging => "Challenging",
            Difficulty::Difficult => "Difficult",
            Difficulty::Hard => "Hard",
            Difficulty::VeryHard => "Very Hard",
        }
    }

    /// Look up a difficulty by key.
    ///
    /// Unknown keys fall back to [`Difficulty::Average`] (a zero modifier) rather
    /// than failing, so a stale preference or a typo never blocks a commit.
    pub fn from_key_or_default(key: &str) -> Self {
        Self::from_key(key).unwrap_or_default()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|d| d.key() == normalized)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:+})", self.label(), self.modifier())
    }
}
