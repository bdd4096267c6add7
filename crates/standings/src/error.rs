use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RankError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no competitions, bad offset, etc.).
    ConfigValidation(String),
    /// One competition's leaderboard could not be fetched or parsed.
    Fetch { competition: String, message: String },
    /// Roster source unreachable or malformed.
    RosterUnavailable(String),
    /// Two approved roster names collapse to the same normalized key.
    DuplicateRosterKey { key: String, first: String, second: String },
    /// Roster category outside Public/Private.
    InvalidCategory { team: String, value: String },
    /// An output sink rejected the report.
    Publish(String),
}

impl fmt::Display for RankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Fetch { competition, message } => {
                write!(f, "competition '{competition}': {message}")
            }
            Self::RosterUnavailable(msg) => write!(f, "roster unavailable: {msg}"),
            Self::DuplicateRosterKey { key, first, second } => {
                write!(f, "roster entries '{first}' and '{second}' collide on key '{key}'")
            }
            Self::InvalidCategory { team, value } => {
                write!(f, "team '{team}': invalid category '{value}' (expected public or private)")
            }
            Self::Publish(msg) => write!(f, "publish error: {msg}"),
        }
    }
}

impl std::error::Error for RankError {}
