//! Kaggle leaderboard download.
//!
//! `GET {base}/competitions/{id}/leaderboard/download` with HTTP basic auth
//! returns a zip archive holding one CSV (`TeamId,TeamName,SubmissionDate,Score`).

use std::path::{Path, PathBuf};

use podium_standings::source::parse_leaderboard_csv;
use podium_standings::{RankError, RawScoreRow, ScoreSource};
use serde::Deserialize;

use super::common::{resolve_secret, FetchClient};
use super::read_leaderboard_payload;
use crate::exit_codes;
use crate::CliError;

// ── Credentials ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

/// Shape of `~/.kaggle/kaggle.json` as written by the Kaggle tooling.
#[derive(Deserialize)]
struct KaggleJson {
    username: String,
    key: String,
}

/// Resolve credentials: `--username/--key` > `KAGGLE_USERNAME/KAGGLE_KEY`
/// > `kaggle.json` (in `$KAGGLE_CONFIG_DIR` or `~/.kaggle`) > error.
pub fn resolve_credentials(
    username: Option<String>,
    key: Option<String>,
) -> Result<KaggleCredentials, CliError> {
    let config_dir = std::env::var_os("KAGGLE_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".kaggle")));
    let kaggle_json = config_dir.map(|dir| dir.join("kaggle.json"));

    resolve_credentials_from(
        username,
        key,
        std::env::var("KAGGLE_USERNAME").ok(),
        std::env::var("KAGGLE_KEY").ok(),
        kaggle_json.as_deref(),
    )
}

fn resolve_credentials_from(
    username_flag: Option<String>,
    key_flag: Option<String>,
    env_username: Option<String>,
    env_key: Option<String>,
    kaggle_json: Option<&Path>,
) -> Result<KaggleCredentials, CliError> {
    let username = resolve_secret(username_flag, "--username", env_username)?;
    let key = resolve_secret(key_flag, "--key", env_key)?;

    if let (Some(username), Some(key)) = (&username, &key) {
        return Ok(KaggleCredentials {
            username: username.clone(),
            key: key.clone(),
        });
    }

    // Fill whichever half is missing from kaggle.json
    if let Some(path) = kaggle_json.filter(|p| p.is_file()) {
        let text = std::fs::read_to_string(path).map_err(|e| {
            not_auth(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: KaggleJson = serde_json::from_str(&text).map_err(|e| {
            not_auth(format!("cannot parse {}: {e}", path.display()))
        })?;
        log::debug!("using Kaggle credentials from {}", path.display());
        return Ok(KaggleCredentials {
            username: username.unwrap_or(file.username),
            key: key.unwrap_or(file.key),
        });
    }

    Err(not_auth("missing Kaggle credentials".to_string()).with_hint(
        "use --username/--key, set KAGGLE_USERNAME/KAGGLE_KEY, or create ~/.kaggle/kaggle.json",
    ))
}

fn not_auth(message: String) -> CliError {
    CliError {
        code: exit_codes::EXIT_FETCH_NOT_AUTH,
        message,
        hint: None,
    }
}

// ── Kaggle client ───────────────────────────────────────────────────

/// Kaggle API errors look like `{"code": 403, "message": "..."}`.
fn extract_kaggle_error(body: &serde_json::Value, status: u16) -> String {
    body["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

pub struct KaggleClient {
    client: FetchClient,
    credentials: KaggleCredentials,
    base_url: String,
}

impl KaggleClient {
    pub fn with_base_url(
        credentials: KaggleCredentials,
        base_url: impl Into<String>,
    ) -> Result<Self, CliError> {
        Ok(Self {
            client: FetchClient::new("Kaggle", extract_kaggle_error)?,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    fn with_initial_backoff(mut self, backoff: std::time::Duration) -> Self {
        self.client = self.client.with_initial_backoff(backoff);
        self
    }

    /// Download one competition's public leaderboard and return its CSV text.
    pub fn download_leaderboard(&self, competition: &str) -> Result<String, CliError> {
        let url = format!(
            "{}/competitions/{}/leaderboard/download",
            self.base_url, competition
        );
        let username = &self.credentials.username;
        let key = &self.credentials.key;

        let body = self
            .client
            .request_bytes(|http| http.get(&url).basic_auth(username, Some(key)))?;

        read_leaderboard_payload(&body).map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!("competition '{competition}': {e}"),
            hint: None,
        })
    }
}

/// `ScoreSource` over the Kaggle API.
pub struct KaggleScoreSource {
    client: KaggleClient,
}

impl KaggleScoreSource {
    pub fn new(client: KaggleClient) -> Self {
        Self { client }
    }
}

impl ScoreSource for KaggleScoreSource {
    fn fetch(&mut self, competition: &str) -> Result<Vec<RawScoreRow>, RankError> {
        let csv = self
            .client
            .download_leaderboard(competition)
            .map_err(|e| RankError::Fetch {
                competition: competition.to_string(),
                message: e.message,
            })?;
        parse_leaderboard_csv(competition, &csv)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
