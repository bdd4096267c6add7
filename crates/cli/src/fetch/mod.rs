//! `podium fetch`: download every competition's leaderboard to disk.
//!
//! Also home of the Kaggle client `podium run` uses for live cycles.

mod common;
mod kaggle;

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

pub use kaggle::{resolve_credentials, KaggleClient, KaggleScoreSource};

use crate::{load_board, CliError};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Decode a leaderboard payload: either plain CSV text or a zip archive
/// whose first `.csv` entry is the leaderboard.
pub fn read_leaderboard_payload(bytes: &[u8]) -> Result<String, String> {
    if !bytes.starts_with(ZIP_MAGIC) {
        return String::from_utf8(bytes.to_vec())
            .map_err(|e| format!("leaderboard is not valid UTF-8: {e}"));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("cannot read leaderboard archive: {e}"))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format!("cannot read leaderboard archive: {e}"))?;
        if !entry.name().to_ascii_lowercase().ends_with(".csv") {
            continue;
        }
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| format!("cannot read {}: {e}", entry.name()))?;
        return Ok(text);
    }

    Err("leaderboard archive has no .csv entry".to_string())
}

pub fn cmd_fetch(
    config_path: PathBuf,
    out_dir: PathBuf,
    username: Option<String>,
    key: Option<String>,
) -> Result<(), CliError> {
    let (config, _) = load_board(&config_path)?;
    let credentials = resolve_credentials(username, key)?;
    let client = KaggleClient::with_base_url(credentials, config.kaggle.base_url.as_str())?;

    std::fs::create_dir_all(&out_dir).map_err(|e| {
        CliError::io(format!("cannot create {}: {e}", out_dir.display()))
    })?;

    for competition in &config.competitions {
        let csv = client.download_leaderboard(competition)?;
        let path = snapshot_path(&out_dir, competition);
        std::fs::write(&path, &csv)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        let rows = csv.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
        eprintln!("{competition}: {rows} rows -> {}", path.display());
    }

    Ok(())
}

fn snapshot_path(dir: &Path, competition: &str) -> PathBuf {
    dir.join(format!("{competition}.csv"))
}
