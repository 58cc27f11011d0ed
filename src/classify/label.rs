//! Disaster-risk labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Disaster-risk category predicted for a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterLabel {
    NoDisaster,
    Flood,
    Drought,
    Storm,
}

impl DisasterLabel {
    /// All labels in enumeration order. Vote ties resolve to the earliest.
    pub const ALL: [DisasterLabel; 4] = [
        DisasterLabel::NoDisaster,
        DisasterLabel::Flood,
        DisasterLabel::Drought,
        DisasterLabel::Storm,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DisasterLabel::NoDisaster => "no_disaster",
            DisasterLabel::Flood => "flood",
            DisasterLabel::Drought => "drought",
            DisasterLabel::Storm => "storm",
        }
    }

    /// Parses a label name, ignoring case and `_`/`-`/space separators.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "nodisaster" | "none" => Some(DisasterLabel::NoDisaster),
            "flood" => Some(DisasterLabel::Flood),
            "drought" => Some(DisasterLabel::Drought),
            "storm" => Some(DisasterLabel::Storm),
            _ => None,
        }
    }
}

impl fmt::Display for DisasterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
