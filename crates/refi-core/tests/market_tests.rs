use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use refi_core::market::{
    CacheStatus, Clock, RateCache, RateObservation, RateRange, RateSource, Tenor,
};
use refi_core::RefiError;
use refi_core::RefiResult;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Barrier, Mutex};

/// Deterministic source: counts fetches, fails on demand.
#[derive(Default)]
struct FakeSource {
    fetches: AtomicU32,
    fail: AtomicBool,
}

impl FakeSource {
    fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

impl RateSource for FakeSource {
    fn fetch_series(&self, _tenor: Tenor, range: &RateRange) -> RefiResult<Vec<RateObservation>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RefiError::DataSource("connection refused".into()));
        }
        Ok(vec![RateObservation {
            date: range.start,
            rate: dec!(0.0625),
        }])
    }
}

/// Manually advanced clock for freshness tests.
struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn new() -> Self {
        ManualClock {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()),
        }
    }

    fn advance(&self, delta: Duration) {
        *self.now.lock().unwrap() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

fn range(start_year: i32) -> RateRange {
    RateRange::new(
        NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(start_year, 12, 31).unwrap(),
    )
    .unwrap()
}

fn cache_with_clock() -> (RateCache<Arc<FakeSource>>, Arc<FakeSource>, Arc<ManualClock>) {
    let source = Arc::new(FakeSource::default());
    let clock = Arc::new(ManualClock::new());
    let cache = RateCache::with_clock(source.clone(), Duration::minutes(15), clock.clone());
    (cache, source, clock)
}

// ===========================================================================
// Freshness
// ===========================================================================

#[test]
fn test_second_call_within_window_hits_cache() {
    let (cache, source, _clock) = cache_with_clock();
    let r = range(2025);

    let first = cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    let second = cache.get_rates(Tenor::ThirtyYear, &r).unwrap();

    assert_eq!(source.fetch_count(), 1);
    assert!(!first.stale);
    assert_eq!(first.observations, second.observations);
    assert_eq!(cache.status(Tenor::ThirtyYear, &r), CacheStatus::Fresh);
}

#[test]
fn test_expiry_triggers_exactly_one_refetch() {
    let (cache, source, clock) = cache_with_clock();
    let r = range(2025);

    cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    clock.advance(Duration::minutes(16));
    assert_eq!(cache.status(Tenor::ThirtyYear, &r), CacheStatus::Stale);

    cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    assert_eq!(source.fetch_count(), 2);
}

#[test]
fn test_status_flips_exactly_at_window_boundary() {
    let (cache, _source, clock) = cache_with_clock();
    let r = range(2025);

    cache.get_rates(Tenor::FifteenYear, &r).unwrap();
    clock.advance(Duration::minutes(15) - Duration::seconds(1));
    assert_eq!(cache.status(Tenor::FifteenYear, &r), CacheStatus::Fresh);

    clock.advance(Duration::seconds(1));
    assert_eq!(cache.status(Tenor::FifteenYear, &r), CacheStatus::Stale);
}

#[test]
fn test_absent_before_any_fetch() {
    let (cache, _source, _clock) = cache_with_clock();
    assert_eq!(
        cache.status(Tenor::ThirtyYear, &range(2025)),
        CacheStatus::Absent
    );
}

// ===========================================================================
// Degradation on fetch failure
// ===========================================================================

#[test]
fn test_failed_refetch_serves_stale_with_error() {
    let (cache, source, clock) = cache_with_clock();
    let r = range(2025);

    cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    clock.advance(Duration::minutes(20));
    source.set_failing(true);

    let entry = cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    assert!(entry.stale);
    assert!(entry.error.as_deref().unwrap().contains("connection refused"));
    assert!(!entry.observations.is_empty());
    assert_eq!(cache.status(Tenor::ThirtyYear, &r), CacheStatus::Error);
}

#[test]
fn test_fetch_failure_with_no_prior_entry_errors() {
    let (cache, source, _clock) = cache_with_clock();
    source.set_failing(true);

    let err = cache.get_rates(Tenor::ThirtyYear, &range(2025)).unwrap_err();
    assert!(matches!(err, RefiError::DataSource(_)));
    assert_eq!(
        cache.status(Tenor::ThirtyYear, &range(2025)),
        CacheStatus::Error
    );
}

#[test]
fn test_failed_refresh_preserves_prior_entry() {
    let (cache, source, _clock) = cache_with_clock();
    let r = range(2025);

    cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    source.set_failing(true);
    assert!(cache.refresh(Tenor::ThirtyYear, &r).is_err());

    // The last-known series is still servable.
    source.set_failing(false);
    let entry = cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    assert!(!entry.observations.is_empty());
}

// ===========================================================================
// Refresh and key independence
// ===========================================================================

#[test]
fn test_refresh_bypasses_freshness() {
    let (cache, source, _clock) = cache_with_clock();
    let r = range(2025);

    cache.get_rates(Tenor::ThirtyYear, &r).unwrap();
    let refreshed = cache.refresh(Tenor::ThirtyYear, &r).unwrap();

    assert_eq!(source.fetch_count(), 2);
    assert!(!refreshed.stale);
    assert!(refreshed.error.is_none());
}

#[test]
fn test_distinct_keys_cache_independently() {
    let (cache, source, _clock) = cache_with_clock();

    cache.get_rates(Tenor::ThirtyYear, &range(2025)).unwrap();
    cache.get_rates(Tenor::FifteenYear, &range(2025)).unwrap();
    cache.get_rates(Tenor::ThirtyYear, &range(2024)).unwrap();
    assert_eq!(source.fetch_count(), 3);

    // Each key is now independently fresh.
    cache.get_rates(Tenor::ThirtyYear, &range(2025)).unwrap();
    cache.get_rates(Tenor::FifteenYear, &range(2025)).unwrap();
    cache.get_rates(Tenor::ThirtyYear, &range(2024)).unwrap();
    assert_eq!(source.fetch_count(), 3);
}

#[test]
fn test_concurrent_same_key_callers_share_one_fetch() {
    let source = Arc::new(FakeSource::default());
    let cache = Arc::new(RateCache::with_freshness(
        source.clone(),
        Duration::minutes(15),
    ));
    let r = range(2025);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            std::thread::spawn(move || cache.get_rates(Tenor::ThirtyYear, &r).unwrap())
        })
        .collect();

    for handle in handles {
        assert!(!handle.join().unwrap().observations.is_empty());
    }
    assert_eq!(source.fetch_count(), 1);
}

/// Source whose 30-year fetches park on a barrier until released.
struct SlowSource {
    in_flight: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl RateSource for SlowSource {
    fn fetch_series(&self, tenor: Tenor, range: &RateRange) -> RefiResult<Vec<RateObservation>> {
        if tenor == Tenor::ThirtyYear {
            self.in_flight.wait();
            self.release.wait();
        }
        Ok(vec![RateObservation {
            date: range.start,
            rate: dec!(0.0625),
        }])
    }
}

#[test]
fn test_slow_fetch_does_not_pin_the_map_for_other_keys() {
    let in_flight = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let source = SlowSource {
        in_flight: in_flight.clone(),
        release: release.clone(),
    };
    let cache = Arc::new(RateCache::with_freshness(source, Duration::minutes(15)));
    let slow = range(2025);

    let fetcher = {
        let cache = cache.clone();
        std::thread::spawn(move || cache.get_rates(Tenor::ThirtyYear, &slow).unwrap())
    };
    in_flight.wait();

    // Parks on the slot mutex until the fetch lands; must not hold a map
    // ref while it waits.
    let watcher = {
        let cache = cache.clone();
        std::thread::spawn(move || cache.status(Tenor::ThirtyYear, &slow))
    };
    std::thread::sleep(std::time::Duration::from_millis(50));

    // First-time inserts across the whole key space proceed while both the
    // fetch and the status call are outstanding.
    for month in 1..=12 {
        for day in 1..=28 {
            let start = NaiveDate::from_ymd_opt(2024, month, day).unwrap();
            let r = RateRange::new(start, start).unwrap();
            assert!(!cache
                .get_rates(Tenor::FifteenYear, &r)
                .unwrap()
                .observations
                .is_empty());
        }
    }

    release.wait();
    assert!(!fetcher.join().unwrap().observations.is_empty());
    assert_eq!(watcher.join().unwrap(), CacheStatus::Fresh);
}
