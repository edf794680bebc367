use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::query::Source;
use crate::site::SiteId;

/// Identity of one long-running request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchKey {
    SearchCollection(SiteId),
    AnalyticsCollection(SiteId),
    /// Keyed by page URL, not site: pages of different sites can be analyzed
    /// at the same time.
    DeepAnalysis(String),
}

impl FetchKey {
    pub fn collection(source: Source, site_id: &SiteId) -> Self {
        match source {
            Source::SearchPerformance => Self::SearchCollection(site_id.clone()),
            Source::AnalyticsSessions => Self::AnalyticsCollection(site_id.clone()),
        }
    }
}

/// Set of keys with a request outstanding.
///
/// This is a UI-level guard: it disables a second trigger for the same key but
/// never serializes different keys. Uses a `std` mutex because the flag is
/// cleared from [`FetchGuard`]'s `Drop`, which cannot await.
#[derive(Debug, Clone, Default)]
pub struct FetchTracker {
    in_flight: Arc<Mutex<HashSet<FetchKey>>>,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> MutexGuard<'_, HashSet<FetchKey>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `key` in flight. Returns `None` if it already is.
    ///
    /// The flag stays set exactly as long as the returned guard lives.
    pub fn try_begin(&self, key: FetchKey) -> Option<FetchGuard> {
        if !self.keys().insert(key.clone()) {
            return None;
        }
        Some(FetchGuard {
            tracker: self.clone(),
            key,
        })
    }

    pub fn is_fetching(&self, key: &FetchKey) -> bool {
        self.keys().contains(key)
    }

    pub fn in_flight(&self) -> Vec<FetchKey> {
        self.keys().iter().cloned().collect()
    }

    pub fn is_idle(&self) -> bool {
        self.keys().is_empty()
    }
}

/// Clears its key on drop, whichever way the request ended.
#[derive(Debug)]
pub struct FetchGuard {
    tracker: FetchTracker,
    key: FetchKey,
}

impl FetchGuard {
    pub fn key(&self) -> &FetchKey {
        &self.key
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.tracker.keys().remove(&self.key);
    }
}
