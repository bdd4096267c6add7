//! `podium-standings`: roster reconciliation and category ranking engine.
//!
//! Pure engine crate: receives a roster and raw leaderboard rows through the
//! `RosterSource` / `ScoreSource` traits, returns two ranked tables plus a
//! cycle status. No CLI or network dependencies.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod roster;
pub mod source;

pub use config::BoardConfig;
pub use engine::{publish, run_cycle, OutputSink};
pub use error::RankError;
pub use model::{CycleReport, CycleStatus, RankedTeamRecord, Rankings, RawScoreRow};
pub use normalize::normalize;
pub use roster::{Category, RosterIndex, RosterRecord, RosterSource};
pub use source::ScoreSource;
