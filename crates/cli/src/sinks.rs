//! Where a finished cycle goes: JSON snapshot, append-only backup log,
//! human summary on stderr.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use podium_standings::config::Labels;
use podium_standings::{Category, CycleReport, CycleStatus, OutputSink, RankError};
use serde::Serialize;

// ── Snapshot document ───────────────────────────────────────────────

/// Dashboard payload: the report plus the display strings a page needs.
#[derive(Serialize)]
pub struct Snapshot<'a> {
    pub status_label: &'a str,
    pub updated_at: String,
    pub labels: &'a Labels,
    #[serde(flatten)]
    pub report: &'a CycleReport,
}

impl<'a> Snapshot<'a> {
    pub fn new(report: &'a CycleReport, labels: &'a Labels) -> Self {
        Self {
            status_label: report.status.label(),
            updated_at: report.meta.completed_at_display(),
            labels,
            report,
        }
    }

    pub fn to_json(&self) -> Result<String, RankError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RankError::Publish(format!("JSON serialization error: {e}")))
    }
}

/// Overwrites `path` with the latest snapshot each cycle.
pub struct JsonSnapshotSink {
    path: PathBuf,
    labels: Labels,
}

impl JsonSnapshotSink {
    pub fn new(path: PathBuf, labels: Labels) -> Self {
        Self { path, labels }
    }
}

impl OutputSink for JsonSnapshotSink {
    fn name(&self) -> &str {
        "json snapshot"
    }

    fn publish(&mut self, report: &CycleReport) -> Result<(), RankError> {
        let json = Snapshot::new(report, &self.labels).to_json()?;
        std::fs::write(&self.path, json).map_err(|e| {
            RankError::Publish(format!("cannot write {}: {e}", self.path.display()))
        })?;
        log::info!("wrote {}", self.path.display());
        Ok(())
    }
}

// ── Backup log ──────────────────────────────────────────────────────

const BACKUP_HEADER: [&str; 6] = ["completed_at", "status", "category", "rank", "team", "total"];

/// Append-only CSV history: one line per ranked team per cycle, or a
/// single status line when the cycle produced no rankings.
pub struct BackupLogSink {
    path: PathBuf,
}

impl BackupLogSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl OutputSink for BackupLogSink {
    fn name(&self) -> &str {
        "backup log"
    }

    fn publish(&mut self, report: &CycleReport) -> Result<(), RankError> {
        let publish_err =
            |e: &dyn std::fmt::Display| RankError::Publish(format!("{}: {e}", self.path.display()));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| publish_err(&e))?;
        let is_new = file.metadata().map_err(|e| publish_err(&e))?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        if is_new {
            writer.write_record(BACKUP_HEADER).map_err(|e| publish_err(&e))?;
        }

        let completed_at = report.meta.completed_at.to_rfc3339();
        let status = report.status.kind();

        if report.rankings.is_empty() {
            writer
                .write_record([completed_at.as_str(), status, "", "", "", ""])
                .map_err(|e| publish_err(&e))?;
        }
        for category in [Category::Public, Category::Private] {
            for team in report.rankings.get(category) {
                writer
                    .write_record([
                        completed_at.clone(),
                        status.to_string(),
                        category.to_string(),
                        team.rank.to_string(),
                        team.name.clone(),
                        team.total.to_string(),
                    ])
                    .map_err(|e| publish_err(&e))?;
            }
        }

        writer.flush().map_err(|e| publish_err(&e))?;
        log::debug!("appended cycle to {}", self.path.display());
        Ok(())
    }
}

// ── Human summary ───────────────────────────────────────────────────

/// Plain-text tables, one per category, followed by warnings.
pub struct SummarySink<W: Write> {
    out: W,
    labels: Labels,
}

impl SummarySink<std::io::Stderr> {
    pub fn stderr(labels: Labels) -> Self {
        Self {
            out: std::io::stderr(),
            labels,
        }
    }
}

impl<W: Write> SummarySink<W> {
    fn write_summary(&mut self, report: &CycleReport) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(
            out,
            "{}: {} at {}",
            report.meta.board_name,
            report.status.label(),
            report.meta.completed_at_display(),
        )?;

        for category in [Category::Public, Category::Private] {
            let teams = report.rankings.get(category);
            if teams.is_empty() {
                continue;
            }
            writeln!(out)?;
            writeln!(out, "{}", self.labels.get(category))?;
            let width = teams.iter().map(|t| t.name.chars().count()).max().unwrap_or(0);
            for team in teams {
                let scores: Vec<String> = report
                    .meta
                    .competitions
                    .iter()
                    .map(|c| format!("{:.5}", team.scores.get(c).copied().unwrap_or(0.0)))
                    .collect();
                writeln!(
                    out,
                    "{:>4}  {:<width$}  {}  total {:.5}",
                    team.rank,
                    team.name,
                    scores.join("  "),
                    team.total,
                    width = width,
                )?;
            }
        }

        if !report.unmatched.is_empty() {
            writeln!(out)?;
            writeln!(out, "not on roster: {}", report.unmatched.join(", "))?;
        }
        match &report.status {
            CycleStatus::Success => {}
            CycleStatus::Warning { reasons } => {
                for reason in reasons {
                    writeln!(out, "warning: {reason}")?;
                }
            }
            CycleStatus::Failure { cause } => writeln!(out, "failure: {cause}")?,
        }
        out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputSink for SummarySink<W> {
    fn name(&self) -> &str {
        "summary"
    }

    fn publish(&mut self, report: &CycleReport) -> Result<(), RankError> {
        self.write_summary(report)
            .map_err(|e| RankError::Publish(format!("cannot write summary: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_standings::roster::{RosterRecord, StaticRoster};
    use podium_standings::{run_cycle, BoardConfig, RawScoreRow, ScoreSource};

    struct OneComp;

    impl ScoreSource for OneComp {
        fn fetch(&mut self, competition: &str) -> Result<Vec<RawScoreRow>, RankError> {
            if competition != "comp1" {
                return Ok(Vec::new());
            }
            Ok(vec![
                RawScoreRow::new("Stack", "comp1", 0.9),
                RawScoreRow::new("PyLinux", "comp1", 0.8),
                RawScoreRow::new("Ghost", "comp1", 0.7),
            ])
        }
    }

    fn config() -> BoardConfig {
        BoardConfig::from_toml(
            r#"
name = "Test Board"
competitions = ["comp1", "comp2"]

[labels]
public = "Escolas Públicas"
private = "Escolas Privadas"
"#,
        )
        .unwrap()
    }

    fn report() -> CycleReport {
        let roster = StaticRoster::new(vec![
            RosterRecord::new("Stack", "privada"),
            RosterRecord::new("PyLinux", "publica"),
        ]);
        run_cycle(&config(), &roster, &mut OneComp)
    }

    fn empty_report() -> CycleReport {
        run_cycle(&config(), &StaticRoster::default(), &mut OneComp)
    }

    #[test]
    fn snapshot_includes_labels_and_status() {
        let config = config();
        let report = report();
        let json: serde_json::Value =
            serde_json::from_str(&Snapshot::new(&report, &config.labels).to_json().unwrap())
                .unwrap();

        assert_eq!(json["status_label"], "updated");
        assert_eq!(json["status"]["kind"], "success");
        assert_eq!(json["labels"]["public"], "Escolas Públicas");
        assert_eq!(json["rankings"]["private"][0]["name"], "Stack");
        assert_eq!(json["unmatched"][0], "Ghost");
        assert!(json["meta"]["completed_at"].is_string());
    }

    #[test]
    fn json_sink_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standings.json");
        let mut sink = JsonSnapshotSink::new(path.clone(), config().labels);

        sink.publish(&report()).unwrap();
        sink.publish(&empty_report()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["rankings"]["public"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn json_sink_unwritable_path_is_publish_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink =
            JsonSnapshotSink::new(dir.path().join("missing/standings.json"), Labels::default());
        let err = sink.publish(&report()).unwrap_err();
        assert!(matches!(err, RankError::Publish(_)));
    }

    #[test]
    fn backup_log_appends_with_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut sink = BackupLogSink::new(path.clone());

        sink.publish(&report()).unwrap();
        sink.publish(&empty_report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "completed_at,status,category,rank,team,total");
        assert_eq!(lines.len(), 1 + 2 + 1);
        assert!(lines[1].contains(",success,public,1,PyLinux,0.8"), "{}", lines[1]);
        assert!(lines[2].contains(",success,private,1,Stack,0.9"), "{}", lines[2]);
        assert!(lines[3].ends_with(",success,,,,"), "{}", lines[3]);
        assert_eq!(text.matches("completed_at").count(), 1);
    }

    #[test]
    fn summary_lists_tables_and_unmatched() {
        let mut sink = SummarySink {
            out: Vec::new(),
            labels: config().labels,
        };
        sink.publish(&report()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();

        assert!(text.starts_with("Test Board: updated at "), "{text}");
        assert!(text.contains("Escolas Públicas\n   1  PyLinux  0.80000  0.00000  total 0.80000"), "{text}");
        assert!(text.contains("Escolas Privadas\n   1  Stack  0.90000  0.00000  total 0.90000"), "{text}");
        assert!(text.contains("not on roster: Ghost"), "{text}");
    }
}
