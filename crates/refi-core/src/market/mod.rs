//! Market-rate data: tenors, observation series, and the capability seams
//! the cache depends on.
//!
//! The core never talks to the network itself. A `RateSource` implementation
//! (live HTTP in the embedding layer, deterministic fakes in tests) fetches
//! a rate series for a (tenor, range) pair; a `Clock` supplies the notion of
//! "now" so freshness is testable without sleeping.

pub mod cache;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RefiError;
use crate::types::Rate;
use crate::RefiResult;

pub use cache::{CacheStatus, RateCache, RateCacheEntry, DEFAULT_FRESHNESS_MINUTES};

/// Loan term bucket for market-rate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tenor {
    ThirtyYear,
    FifteenYear,
}

impl Tenor {
    /// FRED series identifier for this tenor.
    pub fn series_id(&self) -> &'static str {
        match self {
            Tenor::ThirtyYear => "MORTGAGE30US",
            Tenor::FifteenYear => "MORTGAGE15US",
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tenor::ThirtyYear => write!(f, "30-Year"),
            Tenor::FifteenYear => write!(f, "15-Year"),
        }
    }
}

/// Inclusive date range of requested observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> RefiResult<Self> {
        if start > end {
            return Err(RefiError::Validation {
                field: "range".into(),
                reason: format!("Range start {start} is after end {end}"),
            });
        }
        Ok(RateRange { start, end })
    }
}

/// One observed market rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    /// Annual rate as a decimal fraction (0.065 = 6.5%).
    pub rate: Rate,
}

/// Fetches a rate series for a (tenor, range) pair.
///
/// Implementations own their transport concerns, including a bounded
/// timeout; a hung fetch must surface as `RefiError::DataSource`.
pub trait RateSource: Send + Sync {
    fn fetch_series(&self, tenor: Tenor, range: &RateRange) -> RefiResult<Vec<RateObservation>>;
}

impl<S: RateSource + ?Sized> RateSource for std::sync::Arc<S> {
    fn fetch_series(&self, tenor: Tenor, range: &RateRange) -> RefiResult<Vec<RateObservation>> {
        (**self).fetch_series(tenor, range)
    }
}

/// Supplies the current instant for freshness decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenor_series_ids() {
        assert_eq!(Tenor::ThirtyYear.series_id(), "MORTGAGE30US");
        assert_eq!(Tenor::FifteenYear.series_id(), "MORTGAGE15US");
    }

    #[test]
    fn test_range_rejects_inverted_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(RateRange::new(start, end).is_err());
    }
}
