//! Shared HTTP plumbing for leaderboard downloads.
//!
//! - `FetchClient`: HTTP client with retry / backoff / error classification
//! - `resolve_secret`: flag > env > error

use std::thread;
use std::time::Duration;

use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

pub(super) const MAX_RETRIES: u32 = 3;
pub(super) const USER_AGENT: &str = concat!("podium/", env!("CARGO_PKG_VERSION"));

// ── FetchClient ─────────────────────────────────────────────────────

/// Shared HTTP client that handles retry, backoff, and error classification.
///
/// Callers own the URL and auth. They pass a request-building closure to
/// [`FetchClient::request_bytes`], which runs the retry loop and maps HTTP
/// status codes to the standard fetch exit codes.
pub(super) struct FetchClient {
    http: reqwest::blocking::Client,
    source_name: String,
    error_extractor: fn(&serde_json::Value, u16) -> String,
    initial_backoff: Duration,
}

impl FetchClient {
    pub(super) fn new(
        source_name: &str,
        error_extractor: fn(&serde_json::Value, u16) -> String,
    ) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: exit_codes::EXIT_ERROR,
                message: format!("cannot build HTTP client: {e}"),
                hint: None,
            })?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            error_extractor,
            initial_backoff: Duration::from_secs(1),
        })
    }

    /// First retry delay; doubles on every further attempt.
    #[cfg(test)]
    pub(super) fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Make a request with retry + exponential backoff and return the raw
    /// response body.
    ///
    /// `build_request` is called once per attempt and must return a fully
    /// configured `RequestBuilder` (URL, auth, headers).
    pub(super) fn request_bytes(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<Vec<u8>, CliError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            let outcome = match build_request(&self.http).send() {
                Ok(resp) => self.classify(resp)?,
                Err(e) => Attempt::Retry(e.to_string(), None),
            };

            let (reason, status) = match outcome {
                Attempt::Done(body) => return Ok(body),
                Attempt::Retry(reason, status) => (reason, status),
            };

            if attempt == MAX_RETRIES {
                let code = match status {
                    Some(429) => exit_codes::EXIT_FETCH_RATE_LIMIT,
                    _ => exit_codes::EXIT_FETCH_UPSTREAM,
                };
                let what = if status == Some(429) { "rate limited" } else { "upstream error" };
                return Err(CliError {
                    code,
                    message: format!(
                        "{} {} after {} retries ({})",
                        self.source_name, what, MAX_RETRIES, reason,
                    ),
                    hint: None,
                });
            }

            attempt += 1;
            log::warn!(
                "retry {}/{} in {}ms ({})",
                attempt,
                MAX_RETRIES,
                backoff.as_millis(),
                reason,
            );
            thread::sleep(backoff);
            backoff *= 2;
        }
    }

    fn classify(&self, resp: reqwest::blocking::Response) -> Result<Attempt, CliError> {
        let status = resp.status().as_u16();

        // Retryable: 429, 5xx
        if status == 429 || status >= 500 {
            return Ok(Attempt::Retry(format!("HTTP {status}"), Some(status)));
        }

        if status >= 400 {
            let body: serde_json::Value = resp
                .text()
                .ok()
                .and_then(|t| serde_json::from_str(&t).ok())
                .unwrap_or(serde_json::Value::Null);
            let msg = (self.error_extractor)(&body, status);
            let (code, what) = match status {
                401 | 403 => (exit_codes::EXIT_FETCH_AUTH, "auth failed"),
                400 | 404 => (exit_codes::EXIT_FETCH_VALIDATION, "request rejected"),
                _ => (exit_codes::EXIT_FETCH_UPSTREAM, "error"),
            };
            return Err(CliError {
                code,
                message: format!("{} {} ({}): {}", self.source_name, what, status, msg),
                hint: None,
            });
        }

        let body = resp.bytes().map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!("failed to read {} response body: {}", self.source_name, e),
            hint: None,
        })?;
        Ok(Attempt::Done(body.to_vec()))
    }
}

enum Attempt {
    Done(Vec<u8>),
    Retry(String, Option<u16>),
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Resolve a secret: flag value > environment variable > `None`.
///
/// A flag that is present but blank is an error rather than a fallthrough.
pub(super) fn resolve_secret(
    flag: Option<String>,
    flag_name: &str,
    env_value: Option<String>,
) -> Result<Option<String>, CliError> {
    if let Some(value) = flag {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            return Err(CliError {
                code: exit_codes::EXIT_FETCH_NOT_AUTH,
                message: format!("{flag_name} must not be empty"),
                hint: None,
            });
        }
        return Ok(Some(trimmed));
    }

    Ok(env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

// ── Tests ───────────────────────────────────────────────────────────
