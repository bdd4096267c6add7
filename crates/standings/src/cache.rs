//! Time-boxed reuse of leaderboard fetches.
//!
//! Owned by the collaborator layer: the cycle engine never sees the cache,
//! only a `ScoreSource` that may answer from it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::RankError;
use crate::model::RawScoreRow;
use crate::source::ScoreSource;

struct CacheEntry {
    fetched_at: Instant,
    rows: Vec<RawScoreRow>,
}

/// Per-competition fetch results, valid for `ttl` after the fetch.
pub struct FetchCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, competition: &str) -> Option<&[RawScoreRow]> {
        self.entries
            .get(competition)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.rows.as_slice())
    }

    pub fn insert(&mut self, competition: &str, rows: Vec<RawScoreRow>) {
        self.entries.insert(
            competition.to_string(),
            CacheEntry {
                fetched_at: Instant::now(),
                rows,
            },
        );
    }

    /// Drop every entry; the next fetch of each competition goes upstream.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn invalidate_competition(&mut self, competition: &str) {
        self.entries.remove(competition);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A `ScoreSource` that answers from a `FetchCache` while entries are fresh.
///
/// Failed fetches are never cached.
pub struct CachedScoreSource<S> {
    inner: S,
    cache: FetchCache,
}

impl<S: ScoreSource> CachedScoreSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: FetchCache::new(ttl),
        }
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ScoreSource> ScoreSource for CachedScoreSource<S> {
    fn fetch(&mut self, competition: &str) -> Result<Vec<RawScoreRow>, RankError> {
        if let Some(rows) = self.cache.get(competition) {
            log::debug!("competition '{competition}': served {} row(s) from cache", rows.len());
            return Ok(rows.to_vec());
        }
        let rows = self.inner.fetch(competition)?;
        self.cache.insert(competition, rows.clone());
        Ok(rows)
    }
}
