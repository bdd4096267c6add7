use std::cmp::Ordering;

use crate::config::TieBreak;
use crate::model::{AggregatedTeamRecord, RankedTeamRecord, Rankings};
use crate::roster::{Category, RosterIndex};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub rankings: Rankings,
    /// Display names of scored teams with no approved roster entry.
    pub unmatched: Vec<String>,
}

/// Join aggregated records against the roster, split by category and rank.
///
/// Unmatched teams are dropped from the rankings and reported back.
/// Within a category, totals sort descending; equal totals follow `tie_break`.
/// Ranks are 1..N with no gaps or repeats.
pub fn reconcile(
    aggregated: &[AggregatedTeamRecord],
    roster: &RosterIndex,
    tie_break: TieBreak,
) -> Reconciliation {
    let mut public = Vec::new();
    let mut private = Vec::new();
    let mut unmatched = Vec::new();

    for record in aggregated {
        let Some(entry) = roster.lookup(&record.key) else {
            log::warn!(
                "team '{}' is not on the roster; excluded from rankings",
                record.display_name
            );
            unmatched.push(record.display_name.clone());
            continue;
        };

        let ranked = RankedTeamRecord {
            rank: 0,
            key: record.key.clone(),
            name: entry.canonical_name.clone(),
            category: entry.category,
            total: record.total,
            scores: record.scores.iter().cloned().collect(),
        };
        match entry.category {
            Category::Public => public.push(ranked),
            Category::Private => private.push(ranked),
        }
    }

    Reconciliation {
        rankings: Rankings {
            public: rank(public, tie_break),
            private: rank(private, tie_break),
        },
        unmatched,
    }
}

fn rank(mut teams: Vec<RankedTeamRecord>, tie_break: TieBreak) -> Vec<RankedTeamRecord> {
    // sort_by is stable, so InputOrder keeps the aggregator's key order
    teams.sort_by(|a, b| {
        let by_total = b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal);
        match tie_break {
            TieBreak::Name => by_total
                .then_with(|| a.key.cmp(&b.key))
                .then_with(|| a.name.cmp(&b.name)),
            TieBreak::InputOrder => by_total,
        }
    });
    for (i, team) in teams.iter_mut().enumerate() {
        team.rank = i + 1;
    }
    teams
}
