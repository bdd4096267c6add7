use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::normalize::normalize;
use crate::roster::Category;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One leaderboard entry for one team in one competition.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScoreRow {
    pub team_name: String,
    pub competition: String,
    pub score: f64,
    pub key: String,
}

impl RawScoreRow {
    pub fn new(team_name: impl Into<String>, competition: impl Into<String>, score: f64) -> Self {
        let team_name = team_name.into();
        let key = normalize(&team_name);
        Self {
            team_name,
            competition: competition.into(),
            score,
            key,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// One team's scores pivoted across every configured competition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTeamRecord {
    pub key: String,
    /// First raw spelling seen for this key.
    pub display_name: String,
    /// Configured competition order; missing competitions hold 0.0.
    pub scores: Vec<(String, f64)>,
    pub total: f64,
}

impl AggregatedTeamRecord {
    pub fn score(&self, competition: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(c, _)| c == competition)
            .map(|(_, s)| *s)
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTeamRecord {
    pub rank: usize,
    pub key: String,
    pub name: String,
    pub category: Category,
    pub total: f64,
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub public: Vec<RankedTeamRecord>,
    pub private: Vec<RankedTeamRecord>,
}

impl Rankings {
    pub fn get(&self, category: Category) -> &[RankedTeamRecord] {
        match category {
            Category::Public => &self.public,
            Category::Private => &self.private,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.private.is_empty()
    }

    pub fn len(&self) -> usize {
        self.public.len() + self.private.len()
    }
}

// ---------------------------------------------------------------------------
// Cycle status + report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleStatus {
    Success,
    Warning { reasons: Vec<String> },
    Failure { cause: String },
}

impl CycleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "updated",
            Self::Warning { .. } => "waiting for data",
            Self::Failure { .. } => "technical failure",
        }
    }

    /// Stable machine name, matching the JSON `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning { .. } => "warning",
            Self::Failure { .. } => "failure",
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning { reasons } => write!(f, "warning: {}", reasons.join("; ")),
            Self::Failure { cause } => write!(f, "failure: {cause}"),
        }
    }
}

/// Per-competition fetch result recorded in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub competition: String,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub meta: CycleMeta,
    pub status: CycleStatus,
    pub rankings: Rankings,
    /// Leaderboard names with no approved roster entry.
    pub unmatched: Vec<String>,
    pub fetch: Vec<FetchOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleMeta {
    pub board_name: String,
    pub competitions: Vec<String>,
    pub engine_version: String,
    pub completed_at: DateTime<FixedOffset>,
}

impl CycleMeta {
    /// Dashboard-style timestamp, e.g. `16/10/2026 14:05:09`.
    pub fn completed_at_display(&self) -> String {
        self.completed_at.format("%d/%m/%Y %H:%M:%S").to_string()
    }
}
