use std::path::PathBuf;

use podium_standings::config::{BoardConfig, ScoreReducer};
use podium_standings::roster::{parse_roster_csv, StaticRoster};
use podium_standings::source::parse_leaderboard_csv;
use podium_standings::{run_cycle, CycleReport, CycleStatus, RankError, RawScoreRow, ScoreSource};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Reads `<competition>.csv` from the fixtures directory.
struct FixtureSource {
    dir: PathBuf,
}

impl ScoreSource for FixtureSource {
    fn fetch(&mut self, competition: &str) -> Result<Vec<RawScoreRow>, RankError> {
        let path = self.dir.join(format!("{competition}.csv"));
        let data = std::fs::read_to_string(&path).map_err(|e| RankError::Fetch {
            competition: competition.to_string(),
            message: format!("{}: {e}", path.display()),
        })?;
        parse_leaderboard_csv(competition, &data)
    }
}

fn load_config() -> BoardConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("board.toml")).unwrap();
    BoardConfig::from_toml(&toml).unwrap()
}

fn load_roster(config: &BoardConfig) -> StaticRoster {
    let file = config.roster_file.as_deref().unwrap();
    let csv = std::fs::read_to_string(fixtures_dir().join(file)).unwrap();
    StaticRoster::new(parse_roster_csv(&csv).unwrap())
}

fn run_fixture(config: &BoardConfig) -> CycleReport {
    let roster = load_roster(config);
    let mut source = FixtureSource { dir: fixtures_dir() };
    run_cycle(config, &roster, &mut source)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn full_cycle_from_fixtures() {
    let config = load_config();
    let report = run_fixture(&config);

    assert_eq!(report.status, CycleStatus::Success);
    assert_eq!(report.meta.board_name, "Olimpíada de IA 2025");
    assert_eq!(report.meta.competitions, vec!["ml-phase-2", "vision-phase-2"]);

    let public: Vec<(&str, usize)> = report
        .rankings
        .public
        .iter()
        .map(|t| (t.name.as_str(), t.rank))
        .collect();
    assert_eq!(
        public,
        vec![("São Paulo Bots", 1), ("Cristal Neural", 2), ("PyLinux", 3)]
    );
    assert!(approx(report.rankings.public[0].total, 1.18));
    assert_eq!(report.rankings.public[1].scores["vision-phase-2"], 0.0);

    let private: Vec<(&str, usize)> = report
        .rankings
        .private
        .iter()
        .map(|t| (t.name.as_str(), t.rank))
        .collect();
    assert_eq!(private, vec![("Stack", 1), ("Cognitec", 2)]);
    // Best of two submissions on ml-phase-2
    assert_eq!(report.rankings.private[0].scores["ml-phase-2"], 0.87);
    assert!(approx(report.rankings.private[0].total, 1.38));

    // Ohmicros is on the roster but not approved
    assert_eq!(report.unmatched, vec!["Ohmicros", "Random Kaggler"]);
    assert_eq!(report.fetch[0].rows, 6);
    assert_eq!(report.fetch[1].rows, 4);
}

#[test]
fn sum_reducer_adds_duplicate_submissions() {
    let mut config = load_config();
    config.reducer = ScoreReducer::Sum;
    let report = run_fixture(&config);

    let stack = &report.rankings.private[0];
    assert_eq!(stack.name, "Stack");
    assert!(approx(stack.scores["ml-phase-2"], 1.71));
}

#[test]
fn missing_leaderboard_degrades_to_warning() {
    let mut config = load_config();
    config.competitions.push("nlp-phase-2".into());
    let report = run_fixture(&config);

    match &report.status {
        CycleStatus::Warning { reasons } => {
            assert_eq!(reasons.len(), 1);
            assert!(reasons[0].starts_with("nlp-phase-2: "));
        }
        other => panic!("expected warning, got {other}"),
    }
    // Data from the healthy competitions is still ranked
    assert_eq!(report.rankings.len(), 5);
    assert!(report
        .rankings
        .public
        .iter()
        .all(|t| t.scores["nlp-phase-2"] == 0.0));
}

#[test]
fn roster_collision_fails_cycle() {
    let config = load_config();
    let mut records = parse_roster_csv(
        &std::fs::read_to_string(fixtures_dir().join("roster.csv")).unwrap(),
    )
    .unwrap();
    records.push(podium_standings::RosterRecord::new("STACK ", "publica"));
    let mut source = FixtureSource { dir: fixtures_dir() };
    let report = run_cycle(&config, &StaticRoster::new(records), &mut source);

    assert!(matches!(report.status, CycleStatus::Failure { .. }));
    assert!(report.rankings.is_empty());
}

#[test]
fn report_json_shape() {
    let config = load_config();
    let report = run_fixture(&config);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"]["kind"], "success");
    assert_eq!(json["rankings"]["public"][0]["rank"], 1);
    assert_eq!(json["rankings"]["public"][0]["category"], "public");
    assert_eq!(json["rankings"]["private"][0]["name"], "Stack");
    assert!(json["fetch"][0].get("error").is_none());
    let completed_at = json["meta"]["completed_at"].as_str().unwrap();
    assert!(completed_at.ends_with("-03:00"), "{completed_at}");
}
