use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RankError;
use crate::normalize::normalize;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Public,
    Private,
}

impl Category {
    /// Parse a roster category label. Accepts the English labels and the
    /// Portuguese ones the curated spreadsheet uses.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "public" | "publica" => Some(Self::Public),
            "private" | "privada" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source records
// ---------------------------------------------------------------------------

/// One row as the roster source delivers it, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterRecord {
    pub name: String,
    pub category: String,
    #[serde(default = "default_approved")]
    pub approved: bool,
}

fn default_approved() -> bool {
    true
}

impl RosterRecord {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            approved: true,
        }
    }
}

/// Where the authoritative roster comes from (static table, CSV export, ...).
pub trait RosterSource {
    fn load(&self) -> Result<Vec<RosterRecord>, RankError>;
}

/// Roster held in memory, typically the `[[roster]]` table of the config.
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    records: Vec<RosterRecord>,
}

impl StaticRoster {
    pub fn new(records: Vec<RosterRecord>) -> Self {
        Self { records }
    }
}

impl RosterSource for StaticRoster {
    fn load(&self) -> Result<Vec<RosterRecord>, RankError> {
        Ok(self.records.clone())
    }
}

/// Parse the CSV export of the curated roster spreadsheet.
///
/// Required columns: `team`, `category`. Optional: `approved`
/// (`true/false`, `yes/no`, `sim/nao`, `1/0`; blank means approved).
pub fn parse_roster_csv(csv_data: &str) -> Result<Vec<RosterRecord>, RankError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| RankError::RosterUnavailable(e.to_string()))?
        .iter()
        .map(|h| normalize(h))
        .collect();

    let idx = |name: &str| headers.iter().position(|h| h == name);

    let team_idx = idx("team")
        .ok_or_else(|| RankError::RosterUnavailable("missing column 'team'".into()))?;
    let category_idx = idx("category")
        .ok_or_else(|| RankError::RosterUnavailable("missing column 'category'".into()))?;
    let approved_idx = idx("approved");

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| RankError::RosterUnavailable(e.to_string()))?;
        let name = record.get(team_idx).unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }
        let approved = match approved_idx.and_then(|i| record.get(i)) {
            None => true,
            Some(raw) => parse_flag(raw).ok_or_else(|| {
                RankError::RosterUnavailable(format!(
                    "row {}: cannot parse approved flag '{raw}'",
                    line + 2
                ))
            })?,
        };
        records.push(RosterRecord {
            name,
            category: record.get(category_idx).unwrap_or("").to_string(),
            approved,
        });
    }

    Ok(records)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match normalize(raw).as_str() {
        "" | "true" | "yes" | "sim" | "1" | "x" => Some(true),
        "false" | "no" | "nao" | "0" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub canonical_name: String,
    pub category: Category,
}

/// Normalized team name -> roster entry. Built once per cycle.
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    entries: BTreeMap<String, RosterEntry>,
}

impl RosterIndex {
    /// Build the index from approved records.
    ///
    /// Fails on blank names, categories outside Public/Private, and on two
    /// names that collapse to the same key.
    pub fn build(records: &[RosterRecord]) -> Result<Self, RankError> {
        let mut entries: BTreeMap<String, RosterEntry> = BTreeMap::new();

        for record in records.iter().filter(|r| r.approved) {
            let key = normalize(&record.name);
            if key.is_empty() {
                return Err(RankError::RosterUnavailable(format!(
                    "roster entry with blank name (category '{}')",
                    record.category
                )));
            }
            let category =
                Category::parse(&record.category).ok_or_else(|| RankError::InvalidCategory {
                    team: record.name.clone(),
                    value: record.category.clone(),
                })?;

            if let Some(existing) = entries.get(&key) {
                return Err(RankError::DuplicateRosterKey {
                    key,
                    first: existing.canonical_name.clone(),
                    second: record.name.clone(),
                });
            }

            entries.insert(
                key,
                RosterEntry {
                    canonical_name: record.name.trim().to_string(),
                    category,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn lookup(&self, key: &str) -> Option<&RosterEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, category: Category) -> usize {
        self.entries.values().filter(|e| e.category == category).count()
    }
}
