use std::collections::BTreeMap;

use crate::config::ScoreReducer;
use crate::model::{AggregatedTeamRecord, RawScoreRow};

/// Pivot raw leaderboard rows into one record per normalized team key.
///
/// Duplicate (team, competition) scores collapse through `reducer`.
/// Every configured competition is present on every record (0.0 when the
/// team has no score there); rows for unconfigured competitions and
/// non-finite scores are ignored. Output is ordered by key.
pub fn aggregate(
    rows: &[RawScoreRow],
    competitions: &[String],
    reducer: ScoreReducer,
) -> Vec<AggregatedTeamRecord> {
    // key -> (first display name, per-competition slot)
    let mut groups: BTreeMap<&str, (&str, Vec<Option<f64>>)> = BTreeMap::new();

    for row in rows {
        let Some(slot) = competitions.iter().position(|c| *c == row.competition) else {
            continue;
        };
        if !row.score.is_finite() {
            continue;
        }
        let entry = groups
            .entry(row.key.as_str())
            .or_insert_with(|| (row.team_name.as_str(), vec![None; competitions.len()]));
        let cell = &mut entry.1[slot];
        *cell = Some(match *cell {
            Some(current) => reducer.apply(current, row.score),
            None => row.score,
        });
    }

    groups
        .into_iter()
        .map(|(key, (display_name, cells))| {
            let scores: Vec<(String, f64)> = competitions
                .iter()
                .zip(cells)
                .map(|(c, v)| (c.clone(), v.unwrap_or(0.0)))
                .collect();
            let total = scores.iter().map(|(_, s)| s).sum();
            AggregatedTeamRecord {
                key: key.to_string(),
                display_name: display_name.trim().to_string(),
                scores,
                total,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn comps(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input() {
        assert!(aggregate(&[], &comps(&["comp1"]), ScoreReducer::Max).is_empty());
    }

    #[test]
    fn zero_fill_missing_competitions() {
        let rows = vec![RawScoreRow::new("Team A", "comp1", 10.0)];
        let records = aggregate(&rows, &comps(&["comp1", "comp2"]), ScoreReducer::Max);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.key, "team a");
        assert_eq!(r.display_name, "Team A");
        assert_eq!(r.scores, vec![("comp1".into(), 10.0), ("comp2".into(), 0.0)]);
        assert_eq!(r.total, 10.0);
    }

    #[test]
    fn duplicates_max() {
        let rows = vec![
            RawScoreRow::new("Stack", "comp1", 0.71),
            RawScoreRow::new("STACK", "comp1", 0.84),
            RawScoreRow::new("stack ", "comp1", 0.66),
        ];
        let records = aggregate(&rows, &comps(&["comp1"]), ScoreReducer::Max);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score("comp1"), Some(0.84));
        // First spelling wins
        assert_eq!(records[0].display_name, "Stack");
    }

    #[test]
    fn duplicates_sum() {
        let rows = vec![
            RawScoreRow::new("Stack", "comp1", 0.5),
            RawScoreRow::new("Stack", "comp1", 0.25),
            RawScoreRow::new("Stack", "comp2", 1.0),
        ];
        let records = aggregate(&rows, &comps(&["comp1", "comp2"]), ScoreReducer::Sum);
        assert_eq!(records[0].score("comp1"), Some(0.75));
        assert_eq!(records[0].total, 1.75);
    }

    #[test]
    fn max_keeps_negative_scores() {
        // Starting from 0.0 would hide an all-negative competition
        let rows = vec![
            RawScoreRow::new("Stack", "comp1", -3.0),
            RawScoreRow::new("Stack", "comp1", -2.0),
        ];
        let records = aggregate(&rows, &comps(&["comp1"]), ScoreReducer::Max);
        assert_eq!(records[0].total, -2.0);
    }

    #[test]
    fn unconfigured_competition_and_nan_ignored() {
        let rows = vec![
            RawScoreRow::new("Stack", "other", 99.0),
            RawScoreRow::new("Stack", "comp1", f64::NAN),
            RawScoreRow::new("Ghost", "other", 1.0),
        ];
        let records = aggregate(&rows, &comps(&["comp1"]), ScoreReducer::Max);
        assert!(records.is_empty());
    }

    #[test]
    fn ordered_by_key() {
        let rows = vec![
            RawScoreRow::new("Zeta", "comp1", 1.0),
            RawScoreRow::new("Álpha", "comp1", 2.0),
            RawScoreRow::new("beta", "comp1", 3.0),
        ];
        let keys: Vec<_> = aggregate(&rows, &comps(&["comp1"]), ScoreReducer::Max)
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["alpha", "beta", "zeta"]);
    }

    fn row_strategy() -> impl Strategy<Value = RawScoreRow> {
        (
            prop::sample::select(vec!["Stack", "stack", "PyLinux", "Ohmicros", "São Bots"]),
            prop::sample::select(vec!["c1", "c2", "c3", "c4"]),
            -100.0f64..100.0,
        )
            .prop_map(|(t, c, s)| RawScoreRow::new(t, c, s))
    }

    proptest! {
        #[test]
        fn every_competition_present_and_total_is_sum(
            rows in prop::collection::vec(row_strategy(), 0..40),
            sum in any::<bool>(),
        ) {
            let competitions = comps(&["c1", "c2", "c3"]);
            let reducer = if sum { ScoreReducer::Sum } else { ScoreReducer::Max };
            for record in aggregate(&rows, &competitions, reducer) {
                let ids: Vec<&str> = record.scores.iter().map(|(c, _)| c.as_str()).collect();
                prop_assert_eq!(ids, vec!["c1", "c2", "c3"]);
                let expected: f64 = record.scores.iter().map(|(_, s)| s).sum();
                prop_assert_eq!(record.total, expected);
            }
        }
    }
}
