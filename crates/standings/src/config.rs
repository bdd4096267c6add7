use std::collections::HashSet;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::RankError;
use crate::roster::{Category, RosterRecord, StaticRoster};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    pub name: String,
    /// Competition ids in display order.
    pub competitions: Vec<String>,
    #[serde(default)]
    pub reducer: ScoreReducer,
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Fixed offset used for the cycle completion timestamp.
    #[serde(default = "default_offset", deserialize_with = "deserialize_offset")]
    pub utc_offset: FixedOffset,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// CSV export of the curated roster, relative to the config file.
    #[serde(default)]
    pub roster_file: Option<String>,
    /// Inline roster. Mutually exclusive with `roster_file`.
    #[serde(default)]
    pub roster: Vec<RosterRecord>,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub kaggle: KaggleConfig,
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// How duplicate submissions for one team in one competition collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreReducer {
    #[default]
    Max,
    Sum,
}

impl ScoreReducer {
    pub fn apply(self, current: f64, next: f64) -> f64 {
        match self {
            Self::Max => current.max(next),
            Self::Sum => current + next,
        }
    }
}

/// Order among teams with equal totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Canonical name ascending (by normalized key, then canonical spelling).
    #[default]
    Name,
    /// Keep aggregator order (normalized key ascending).
    InputOrder,
}

// ---------------------------------------------------------------------------
// Labels + Kaggle
// ---------------------------------------------------------------------------

/// Display titles for the two category tables.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct Labels {
    #[serde(default = "default_public_label")]
    pub public: String,
    #[serde(default = "default_private_label")]
    pub private: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            public: default_public_label(),
            private: default_private_label(),
        }
    }
}

impl Labels {
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Public => &self.public,
            Category::Private => &self.private,
        }
    }
}

fn default_public_label() -> String {
    "Public".into()
}

fn default_private_label() -> String {
    "Private".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct KaggleConfig {
    #[serde(default = "default_kaggle_base_url")]
    pub base_url: String,
}

impl Default for KaggleConfig {
    fn default() -> Self {
        Self {
            base_url: default_kaggle_base_url(),
        }
    }
}

fn default_kaggle_base_url() -> String {
    "https://www.kaggle.com/api/v1".into()
}

fn default_cache_ttl() -> u64 {
    60
}

// Brasília time (no DST since 2019).
fn default_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap_or_else(|| Utc.fix())
}

fn deserialize_offset<'de, D>(deserializer: D) -> Result<FixedOffset, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc_offset(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid utc_offset '{raw}' (expected +HH:MM or -HH:MM)"))
    })
}

/// Parse `+HH:MM`, `-HH:MM`, `Z` or `UTC`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl BoardConfig {
    pub fn from_toml(input: &str) -> Result<Self, RankError> {
        let config: BoardConfig =
            toml::from_str(input).map_err(|e| RankError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RankError> {
        if self.name.trim().is_empty() {
            return Err(RankError::ConfigValidation("name must not be empty".into()));
        }

        if self.competitions.is_empty() {
            return Err(RankError::ConfigValidation(
                "at least 1 competition is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for competition in &self.competitions {
            if competition.trim().is_empty() {
                return Err(RankError::ConfigValidation(
                    "competition ids must not be blank".into(),
                ));
            }
            if !seen.insert(competition.as_str()) {
                return Err(RankError::ConfigValidation(format!(
                    "competition '{competition}' listed twice"
                )));
            }
        }

        if self.roster_file.is_some() && !self.roster.is_empty() {
            return Err(RankError::ConfigValidation(
                "roster_file and [[roster]] are mutually exclusive".into(),
            ));
        }

        Ok(())
    }

    /// The inline `[[roster]]` table as a roster source.
    pub fn static_roster(&self) -> StaticRoster {
        StaticRoster::new(self.roster.clone())
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterSource;

    const VALID: &str = r#"
name = "Olimpíada IA 2025"
competitions = ["aprendizado-de-maquina-2-fase", "visao-computacional-2-fase"]

[labels]
public = "Escolas Públicas"
private = "Escolas Privadas"

[[roster]]
name = "Cristal Neural"
category = "publica"

[[roster]]
name = "Stack"
category = "privada"
approved = false
"#;

    #[test]
    fn parse_valid() {
        let config = BoardConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Olimpíada IA 2025");
        assert_eq!(config.competitions.len(), 2);
        assert_eq!(config.reducer, ScoreReducer::Max);
        assert_eq!(config.tie_break, TieBreak::Name);
        assert_eq!(config.utc_offset.local_minus_utc(), -3 * 3600);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.labels.public, "Escolas Públicas");
        assert_eq!(config.kaggle.base_url, "https://www.kaggle.com/api/v1");
        assert!(config.roster_file.is_none());

        let records = config.static_roster().load().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].approved);
        assert!(!records[1].approved);
    }

    #[test]
    fn parse_policies() {
        let input = r#"
name = "Sheets variant"
competitions = ["a", "b"]
reducer = "sum"
tie_break = "input_order"
utc_offset = "+05:30"
cache_ttl_secs = 0
roster_file = "roster.csv"
"#;
        let config = BoardConfig::from_toml(input).unwrap();
        assert_eq!(config.reducer, ScoreReducer::Sum);
        assert_eq!(config.tie_break, TieBreak::InputOrder);
        assert_eq!(config.utc_offset.local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(config.cache_ttl(), std::time::Duration::ZERO);
        assert_eq!(config.roster_file.as_deref(), Some("roster.csv"));
    }

    #[test]
    fn reject_unknown_reducer() {
        let input = r#"
name = "x"
competitions = ["a"]
reducer = "mean"
"#;
        let err = BoardConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, RankError::ConfigParse(_)));
    }

    #[test]
    fn reject_no_competitions() {
        let err = BoardConfig::from_toml("name = \"x\"\ncompetitions = []\n").unwrap_err();
        assert!(err.to_string().contains("at least 1 competition"));
    }

    #[test]
    fn reject_duplicate_competition() {
        let err =
            BoardConfig::from_toml("name = \"x\"\ncompetitions = [\"a\", \"a\"]\n").unwrap_err();
        assert!(err.to_string().contains("'a' listed twice"));
    }

    #[test]
    fn reject_roster_file_with_inline_roster() {
        let input = r#"
name = "x"
competitions = ["a"]
roster_file = "roster.csv"

[[roster]]
name = "Stack"
category = "privada"
"#;
        let err = BoardConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn reject_bad_offset() {
        let input = "name = \"x\"\ncompetitions = [\"a\"]\nutc_offset = \"America/Sao_Paulo\"\n";
        let err = BoardConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("invalid utc_offset"));
    }

    #[test]
    fn reject_unknown_field() {
        let input = "name = \"x\"\ncompetitions = [\"a\"]\nway = 2\n";
        assert!(BoardConfig::from_toml(input).is_err());
    }

    #[test]
    fn offset_parsing() {
        assert_eq!(parse_utc_offset("-03:00").unwrap().local_minus_utc(), -10800);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("03:00").is_none());
        assert!(parse_utc_offset("+3:00").is_none());
        assert!(parse_utc_offset("+15:00").is_none());
    }

    #[test]
    fn reducers() {
        assert_eq!(ScoreReducer::Max.apply(0.7, 0.9), 0.9);
        assert_eq!(ScoreReducer::Max.apply(0.9, 0.7), 0.9);
        assert_eq!(ScoreReducer::Sum.apply(0.5, 0.25), 0.75);
    }
}
