//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `podium` exit codes.
//! Schedulers (cron, CI) read them to decide whether to alert.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | cycle            | Refresh cycle outcome and config codes   |
//! | 50-59   | fetch            | Leaderboard download (Kaggle API)        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use podium_standings::{CycleStatus, RankError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (write errors, sink failures).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Cycle (3-9)
// =============================================================================

/// Cycle finished with `Warning` (no data yet, or some competitions failed).
pub const EXIT_CYCLE_WARNING: u8 = 3;

/// Cycle finished with `Failure` (roster unavailable or invalid).
pub const EXIT_CYCLE_FAILURE: u8 = 4;

/// Board config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

// =============================================================================
// Fetch (50-59)
// =============================================================================

/// No Kaggle credentials (flags, env vars and kaggle.json all empty).
pub const EXIT_FETCH_NOT_AUTH: u8 = 50;

/// Auth rejected by upstream (401/403).
pub const EXIT_FETCH_AUTH: u8 = 51;

/// Bad request rejected by upstream (400, unknown competition).
pub const EXIT_FETCH_VALIDATION: u8 = 52;

/// Rate limited after retries (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 53;

/// Upstream error (5xx), network failure after retries, or an
/// unreadable leaderboard payload.
pub const EXIT_FETCH_UPSTREAM: u8 = 54;

/// Map a finished cycle to its exit code.
pub fn cycle_exit_code(status: &CycleStatus) -> u8 {
    match status {
        CycleStatus::Success => EXIT_SUCCESS,
        CycleStatus::Warning { .. } => EXIT_CYCLE_WARNING,
        CycleStatus::Failure { .. } => EXIT_CYCLE_FAILURE,
    }
}

/// Map an engine error to its exit code.
pub fn rank_error_exit_code(err: &RankError) -> u8 {
    match err {
        RankError::ConfigParse(_) | RankError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        RankError::RosterUnavailable(_)
        | RankError::DuplicateRosterKey { .. }
        | RankError::InvalidCategory { .. } => EXIT_CYCLE_FAILURE,
        RankError::Fetch { .. } => EXIT_FETCH_UPSTREAM,
        RankError::Publish(_) => EXIT_ERROR,
    }
}
