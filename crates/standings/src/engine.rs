use std::panic::{self, AssertUnwindSafe};

use crate::aggregate::aggregate;
use crate::config::BoardConfig;
use crate::error::RankError;
use crate::model::{CycleMeta, CycleReport, CycleStatus, FetchOutcome, RawScoreRow, Rankings};
use crate::reconcile::{reconcile, Reconciliation};
use crate::roster::{RosterIndex, RosterSource};
use crate::source::ScoreSource;

/// Consumer of a finished cycle (snapshot file, backup log, dashboard, ...).
pub trait OutputSink {
    fn name(&self) -> &str;
    fn publish(&mut self, report: &CycleReport) -> Result<(), RankError>;
}

/// Run one refresh cycle: load roster, fetch every competition, aggregate,
/// reconcile, rank.
///
/// Never fails. Roster errors and errors inside aggregation/reconciliation
/// produce `Failure` with empty rankings; missing data produces `Warning`.
pub fn run_cycle(
    config: &BoardConfig,
    roster: &dyn RosterSource,
    scores: &mut dyn ScoreSource,
) -> CycleReport {
    let index = match roster.load().and_then(|records| RosterIndex::build(&records)) {
        Ok(index) => index,
        Err(e) => {
            log::error!("roster: {e}");
            let status = CycleStatus::Failure { cause: e.to_string() };
            return finish(config, status, Reconciliation::default(), Vec::new());
        }
    };
    log::debug!("roster: {} approved team(s)", index.len());

    let (rows, fetch) = fetch_all(config, scores);
    let failures: Vec<String> = fetch
        .iter()
        .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {e}", o.competition)))
        .collect();

    if rows.is_empty() {
        let reasons = if failures.is_empty() {
            vec!["no leaderboard entries yet".to_string()]
        } else {
            failures
        };
        log::warn!("no score data this cycle ({})", reasons.join("; "));
        let status = CycleStatus::Warning { reasons };
        return finish(config, status, Reconciliation::default(), fetch);
    }

    let ranked = guarded(|| {
        let aggregated = aggregate(&rows, &config.competitions, config.reducer);
        reconcile(&aggregated, &index, config.tie_break)
    });

    match ranked {
        Ok(reconciliation) => {
            let status = if failures.is_empty() {
                CycleStatus::Success
            } else {
                CycleStatus::Warning { reasons: failures }
            };
            finish(config, status, reconciliation, fetch)
        }
        Err(cause) => {
            log::error!("ranking aborted: {cause}");
            finish(config, CycleStatus::Failure { cause }, Reconciliation::default(), fetch)
        }
    }
}

/// Deliver a report to every sink. All sinks are attempted; the first
/// error is returned.
pub fn publish(report: &CycleReport, sinks: &mut [&mut dyn OutputSink]) -> Result<(), RankError> {
    let mut first_err = None;
    for sink in sinks.iter_mut() {
        match sink.publish(report) {
            Ok(()) => log::debug!("published to {}", sink.name()),
            Err(e) => {
                log::error!("sink {}: {e}", sink.name());
                first_err.get_or_insert(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn fetch_all(
    config: &BoardConfig,
    scores: &mut dyn ScoreSource,
) -> (Vec<RawScoreRow>, Vec<FetchOutcome>) {
    let mut rows = Vec::new();
    let mut outcomes = Vec::with_capacity(config.competitions.len());

    for competition in &config.competitions {
        match scores.fetch(competition) {
            Ok(fetched) => {
                log::info!("competition '{competition}': {} leaderboard row(s)", fetched.len());
                outcomes.push(FetchOutcome {
                    competition: competition.clone(),
                    rows: fetched.len(),
                    error: None,
                });
                rows.extend(fetched);
            }
            Err(e) => {
                log::warn!("competition '{competition}': fetch failed: {e}");
                let message = match e {
                    RankError::Fetch { message, .. } => message,
                    other => other.to_string(),
                };
                outcomes.push(FetchOutcome {
                    competition: competition.clone(),
                    rows: 0,
                    error: Some(message),
                });
            }
        }
    }

    (rows, outcomes)
}

fn finish(
    config: &BoardConfig,
    status: CycleStatus,
    reconciliation: Reconciliation,
    fetch: Vec<FetchOutcome>,
) -> CycleReport {
    let Reconciliation { rankings, unmatched } = reconciliation;
    let rankings = match status {
        CycleStatus::Failure { .. } => Rankings::default(),
        _ => rankings,
    };
    CycleReport {
        meta: CycleMeta {
            board_name: config.name.clone(),
            competitions: config.competitions.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            completed_at: chrono::Utc::now().with_timezone(&config.utc_offset),
        },
        status,
        rankings,
        unmatched,
        fetch,
    }
}

/// Run a ranking step, turning a panic into its message.
fn guarded<T>(step: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(step)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "ranking panicked".to_string()
    }
}
