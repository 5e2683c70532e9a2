//! Time-bounded cache around a `RateSource`.
//!
//! Entries are keyed by (tenor, requested range); distinct ranges cache
//! independently rather than being derived from one another. A stale entry
//! is never silently dropped: when a refetch fails, the last-known series is
//! served back annotated with the failure, so dependent views degrade
//! instead of going blank. Concurrent callers for the same key serialize on
//! that key's slot and are served the in-flight result; unrelated keys never
//! contend.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Clock, RateObservation, RateRange, RateSource, SystemClock, Tenor};
use crate::error::RefiError;
use crate::RefiResult;

/// Default freshness window before an entry is eligible for refetch.
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 15;

/// One cached fetch result, as served to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCacheEntry {
    pub tenor: Tenor,
    pub range: RateRange,
    pub observations: Vec<RateObservation>,
    pub fetched_at: DateTime<Utc>,
    /// True when served past its freshness window.
    pub stale: bool,
    /// Failure reason when the entry survives a failed refetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Freshness state of one (tenor, range) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStatus {
    Fresh,
    Stale,
    Absent,
    /// The most recent fetch attempt for this key failed.
    Error,
}

#[derive(Debug, Default)]
struct Slot {
    observations: Option<Vec<RateObservation>>,
    fetched_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Process-lifetime cache over a rate source. Construct one per session and
/// inject it; there is deliberately no module-level singleton.
pub struct RateCache<S: RateSource> {
    source: S,
    clock: Arc<dyn Clock>,
    freshness: Duration,
    slots: DashMap<(Tenor, RateRange), Arc<Mutex<Slot>>>,
}

impl<S: RateSource> RateCache<S> {
    /// Cache with the documented 15-minute freshness window.
    pub fn new(source: S) -> Self {
        Self::with_freshness(source, Duration::minutes(DEFAULT_FRESHNESS_MINUTES))
    }

    pub fn with_freshness(source: S, freshness: Duration) -> Self {
        Self::with_clock(source, freshness, Arc::new(SystemClock))
    }

    /// Full injection, for deterministic freshness tests.
    pub fn with_clock(source: S, freshness: Duration, clock: Arc<dyn Clock>) -> Self {
        RateCache {
            source,
            clock,
            freshness,
            slots: DashMap::new(),
        }
    }

    /// Serve the series for a key, fetching when stale or absent.
    ///
    /// On fetch failure the last-known entry is returned flagged stale with
    /// the failure reason; `Err` only when nothing was ever fetched.
    pub fn get_rates(&self, tenor: Tenor, range: &RateRange) -> RefiResult<RateCacheEntry> {
        let slot = self.slot(tenor, range);
        let mut guard = lock(&slot);
        let now = self.clock.now();

        if let Some(entry) = self.view_if_fresh(tenor, range, &guard, now) {
            log::debug!("rate cache hit for {tenor} {range:?}");
            return Ok(entry);
        }

        log::debug!("rate cache miss for {tenor} {range:?}, fetching");
        match self.source.fetch_series(tenor, range) {
            Ok(observations) => {
                guard.observations = Some(observations);
                guard.fetched_at = Some(now);
                guard.last_error = None;
                Ok(self.view(tenor, range, &guard, false, None))
            }
            Err(e) => {
                let reason = e.to_string();
                log::warn!("rate fetch failed for {tenor} {range:?}: {reason}");
                guard.last_error = Some(reason.clone());
                if guard.observations.is_some() {
                    Ok(self.view(tenor, range, &guard, true, Some(reason)))
                } else {
                    Err(RefiError::DataSource(reason))
                }
            }
        }
    }

    /// Force a live fetch, bypassing the freshness check. The stored entry
    /// is replaced only on success.
    pub fn refresh(&self, tenor: Tenor, range: &RateRange) -> RefiResult<RateCacheEntry> {
        let slot = self.slot(tenor, range);
        let mut guard = lock(&slot);

        match self.source.fetch_series(tenor, range) {
            Ok(observations) => {
                guard.observations = Some(observations);
                guard.fetched_at = Some(self.clock.now());
                guard.last_error = None;
                Ok(self.view(tenor, range, &guard, false, None))
            }
            Err(e) => {
                let reason = e.to_string();
                log::warn!("rate refresh failed for {tenor} {range:?}: {reason}");
                guard.last_error = Some(reason.clone());
                Err(RefiError::DataSource(reason))
            }
        }
    }

    /// Freshness state of a key without triggering any fetch.
    pub fn status(&self, tenor: Tenor, range: &RateRange) -> CacheStatus {
        // Release the map ref before blocking on the slot mutex, which a
        // concurrent fetch may hold for the duration of the network call.
        let Some(slot) = self.slots.get(&(tenor, *range)).map(|s| Arc::clone(&s)) else {
            return CacheStatus::Absent;
        };
        let guard = lock(&slot);

        if guard.last_error.is_some() {
            return CacheStatus::Error;
        }
        match guard.fetched_at {
            Some(fetched_at) if self.clock.now() - fetched_at < self.freshness => {
                CacheStatus::Fresh
            }
            Some(_) => CacheStatus::Stale,
            None => CacheStatus::Absent,
        }
    }

    fn slot(&self, tenor: Tenor, range: &RateRange) -> Arc<Mutex<Slot>> {
        self.slots
            .entry((tenor, *range))
            .or_default()
            .clone()
    }

    fn view_if_fresh(
        &self,
        tenor: Tenor,
        range: &RateRange,
        slot: &Slot,
        now: DateTime<Utc>,
    ) -> Option<RateCacheEntry> {
        let fetched_at = slot.fetched_at?;
        slot.observations.as_ref()?;
        if now - fetched_at < self.freshness {
            Some(self.view(tenor, range, slot, false, None))
        } else {
            None
        }
    }

    fn view(
        &self,
        tenor: Tenor,
        range: &RateRange,
        slot: &Slot,
        stale: bool,
        error: Option<String>,
    ) -> RateCacheEntry {
        RateCacheEntry {
            tenor,
            range: *range,
            observations: slot.observations.clone().unwrap_or_default(),
            fetched_at: slot.fetched_at.unwrap_or_else(|| self.clock.now()),
            stale,
            error,
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    // A panic mid-fetch leaves the slot contents valid; recover the guard.
    slot.lock().unwrap_or_else(|e| e.into_inner())
}
