//! `podium run` / `podium validate`.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use podium_standings::cache::CachedScoreSource;
use podium_standings::{
    publish, run_cycle, BoardConfig, Category, CycleStatus, OutputSink, RosterIndex,
    RosterSource, ScoreSource,
};

use crate::exit_codes::{cycle_exit_code, EXIT_INVALID_CONFIG};
use crate::fetch::{resolve_credentials, KaggleClient, KaggleScoreSource};
use crate::sinks::{BackupLogSink, JsonSnapshotSink, Snapshot, SummarySink};
use crate::sources::{CsvRosterFile, DirScoreSource};
use crate::{load_board, CliError};

pub struct RunArgs {
    pub config: PathBuf,
    pub scores_dir: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub watch: Option<u64>,
    pub username: Option<String>,
    pub key: Option<String>,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (config, base_dir) = load_board(&args.config)?;

    let roster = roster_source(&config, &base_dir);
    let inner = score_source(&config, args.scores_dir, args.username, args.key)?;
    let mut scores = CachedScoreSource::new(inner, config.cache_ttl());

    let mut summary = SummarySink::stderr(config.labels.clone());
    let mut snapshot = args
        .output
        .map(|path| JsonSnapshotSink::new(path, config.labels.clone()));
    let mut backup = args.backup.map(BackupLogSink::new);

    let mut sinks: Vec<&mut dyn OutputSink> = Vec::new();
    sinks.push(&mut summary);
    if let Some(sink) = snapshot.as_mut() {
        sinks.push(sink);
    }
    if let Some(sink) = backup.as_mut() {
        sinks.push(sink);
    }

    let interval = args.watch.map(|secs| Duration::from_secs(secs.max(1)));
    let mut roster_stamp = RosterStamp::new(config.roster_file.as_ref().map(|f| base_dir.join(f)));

    loop {
        let report = run_cycle(&config, roster.as_ref(), &mut scores);
        let published = publish(&report, &mut sinks);

        if args.json {
            let json = Snapshot::new(&report, &config.labels)
                .to_json()
                .map_err(CliError::rank)?;
            println!("{json}");
        }

        let Some(interval) = interval else {
            published.map_err(CliError::rank)?;
            return cycle_result(&report.status);
        };

        // Sink errors are already logged; keep the dashboard refreshing.
        log::debug!("next cycle in {}s", interval.as_secs());
        std::thread::sleep(interval);

        if roster_stamp.changed() {
            log::info!("roster file changed; refreshing leaderboards");
            scores.invalidate();
        }
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, base_dir) = load_board(&config_path)?;

    let index = roster_source(&config, &base_dir)
        .load()
        .and_then(|records| RosterIndex::build(&records))
        .map_err(|e| CliError {
            code: EXIT_INVALID_CONFIG,
            message: e.to_string(),
            hint: None,
        })?;

    eprintln!(
        "valid: '{}' ({} competitions, {} {} / {} {} teams)",
        config.name,
        config.competitions.len(),
        index.count(Category::Public),
        config.labels.public,
        index.count(Category::Private),
        config.labels.private,
    );
    if index.is_empty() {
        log::warn!("roster is empty; every cycle will produce empty rankings");
    }
    Ok(())
}

fn roster_source(config: &BoardConfig, base_dir: &Path) -> Box<dyn RosterSource> {
    match &config.roster_file {
        Some(file) => Box::new(CsvRosterFile::new(base_dir.join(file))),
        None => Box::new(config.static_roster()),
    }
}

fn score_source(
    config: &BoardConfig,
    scores_dir: Option<PathBuf>,
    username: Option<String>,
    key: Option<String>,
) -> Result<Box<dyn ScoreSource>, CliError> {
    if let Some(dir) = scores_dir {
        log::debug!("reading leaderboards from {}", dir.display());
        return Ok(Box::new(DirScoreSource::new(dir)));
    }
    let credentials = resolve_credentials(username, key)?;
    let client = KaggleClient::with_base_url(credentials, config.kaggle.base_url.as_str())?;
    Ok(Box::new(KaggleScoreSource::new(client)))
}

/// Modification time of the roster file, polled between watch cycles.
/// An edited roster forces a fresh download on the next cycle.
struct RosterStamp {
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
}

impl RosterStamp {
    fn new(path: Option<PathBuf>) -> Self {
        let modified = path.as_deref().and_then(modified_at);
        Self { path, modified }
    }

    fn changed(&mut self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let current = modified_at(path);
        if current == self.modified {
            return false;
        }
        self.modified = current;
        true
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn cycle_result(status: &CycleStatus) -> Result<(), CliError> {
    let message = match status {
        CycleStatus::Success => return Ok(()),
        CycleStatus::Warning { .. } => "standings not fully updated".to_string(),
        CycleStatus::Failure { cause } => format!("cycle failed: {cause}"),
    };
    Err(CliError {
        code: cycle_exit_code(status),
        message,
        hint: None,
    })
}
