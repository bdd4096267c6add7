use crate::error::RankError;
use crate::model::RawScoreRow;

/// Where leaderboard rows come from. Called once per competition per cycle.
///
/// An empty `Ok` means the competition has no entries yet; an `Err` is a
/// fetch failure for that competition only.
pub trait ScoreSource {
    fn fetch(&mut self, competition: &str) -> Result<Vec<RawScoreRow>, RankError>;
}

impl<S: ScoreSource + ?Sized> ScoreSource for Box<S> {
    fn fetch(&mut self, competition: &str) -> Result<Vec<RawScoreRow>, RankError> {
        (**self).fetch(competition)
    }
}

/// Team name and score columns of a downloaded leaderboard CSV.
const TEAM_COLUMN: &str = "TeamName";
const SCORE_COLUMN: &str = "Score";

/// Parse a public leaderboard CSV (`TeamId,TeamName,SubmissionDate,Score`).
///
/// Only `TeamName` and `Score` are required. Rows with a blank team name or
/// an unparseable score are skipped with a warning.
pub fn parse_leaderboard_csv(
    competition: &str,
    csv_data: &str,
) -> Result<Vec<RawScoreRow>, RankError> {
    let fetch_err = |message: String| RankError::Fetch {
        competition: competition.to_string(),
        message,
    };

    let data = csv_data.trim_start_matches('\u{feff}');
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| fetch_err(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, RankError> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| fetch_err(format!("leaderboard missing column '{name}'")))
    };
    let team_idx = idx(TEAM_COLUMN)?;
    let score_idx = idx(SCORE_COLUMN)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| fetch_err(e.to_string()))?;
        let team = record.get(team_idx).unwrap_or("").trim();
        if team.is_empty() {
            continue;
        }
        let raw_score = record.get(score_idx).unwrap_or("").trim();
        match raw_score.parse::<f64>() {
            Ok(score) if score.is_finite() => {
                rows.push(RawScoreRow::new(team, competition, score));
            }
            _ => {
                log::warn!("competition '{competition}': team '{team}' has unparseable score '{raw_score}', skipped");
            }
        }
    }

    Ok(rows)
}
