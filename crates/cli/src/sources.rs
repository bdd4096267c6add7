//! File-backed roster and score sources.

use std::path::PathBuf;

use podium_standings::roster::parse_roster_csv;
use podium_standings::source::parse_leaderboard_csv;
use podium_standings::{RankError, RawScoreRow, RosterRecord, RosterSource, ScoreSource};

use crate::fetch::read_leaderboard_payload;

/// CSV export of the curated roster spreadsheet (`team,category,approved`).
pub struct CsvRosterFile {
    path: PathBuf,
}

impl CsvRosterFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RosterSource for CsvRosterFile {
    fn load(&self) -> Result<Vec<RosterRecord>, RankError> {
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            RankError::RosterUnavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        parse_roster_csv(&data)
    }
}

/// Offline leaderboards: `<dir>/<competition>.csv`, or `<competition>.zip`
/// as downloaded from Kaggle.
///
/// A competition with neither file has no entries yet.
pub struct DirScoreSource {
    dir: PathBuf,
}

impl DirScoreSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl ScoreSource for DirScoreSource {
    fn fetch(&mut self, competition: &str) -> Result<Vec<RawScoreRow>, RankError> {
        let fetch_err = |message: String| RankError::Fetch {
            competition: competition.to_string(),
            message,
        };

        let candidates = [
            self.dir.join(format!("{competition}.csv")),
            self.dir.join(format!("{competition}.zip")),
        ];
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            log::debug!("competition '{competition}': no file in {}", self.dir.display());
            return Ok(Vec::new());
        };

        let bytes = std::fs::read(path)
            .map_err(|e| fetch_err(format!("cannot read {}: {e}", path.display())))?;
        let csv = read_leaderboard_payload(&bytes)
            .map_err(|e| fetch_err(format!("{}: {e}", path.display())))?;
        parse_leaderboard_csv(competition, &csv)
    }
}
