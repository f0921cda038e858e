//! Locally persisted elapsed-timer record.
//!
//! The record is a pair of stringified integers: `current-interval`
//! holds the elapsed seconds last observed, `last-check-timestamp` the
//! epoch milliseconds of that observation. Reads extrapolate forward
//! assuming the timer kept running, so the UI gets a ticking display
//! without polling the server every second.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

use super::store::TimerStore;

pub const CURRENT_INTERVAL_KEY: &str = "current-interval";
pub const LAST_CHECK_KEY: &str = "last-check-timestamp";

#[derive(Clone)]
pub struct IntervalCache {
  store: TimerStore,
}

impl IntervalCache {
  pub fn new(store: TimerStore) -> Self {
    Self { store }
  }

  pub fn set(&self, elapsed_seconds: u64) -> Result<()> {
    self.set_at(elapsed_seconds, Utc::now())
  }

  /// Persist `{elapsed_seconds, observed_at: now}`.
  pub fn set_at(&self, elapsed_seconds: u64, now: DateTime<Utc>) -> Result<()> {
    self
      .store
      .set(CURRENT_INTERVAL_KEY, &elapsed_seconds.to_string())?;
    self
      .store
      .set(LAST_CHECK_KEY, &now.timestamp_millis().to_string())
  }

  pub fn get(&self) -> Result<Option<u64>> {
    self.get_at(Utc::now())
  }

  /// Extrapolated elapsed seconds, or `None` when no timer is known
  /// running. Never goes backward: a clock that jumped behind the
  /// stored observation clamps the drift to zero.
  pub fn get_at(&self, now: DateTime<Utc>) -> Result<Option<u64>> {
    let Some(stored) = self.store.get(CURRENT_INTERVAL_KEY)? else {
      return Ok(None);
    };
    let elapsed: u64 = stored
      .parse()
      .map_err(|_| Error::Store(format!("corrupt {CURRENT_INTERVAL_KEY}: {stored}")))?;

    let observed_at = self.last_check()?.unwrap_or(now);
    let drift = (now - observed_at).num_seconds().max(0) as u64;
    Ok(Some(elapsed + drift))
  }

  /// Remove the record; the timer is no longer known running.
  pub fn clear(&self) -> Result<()> {
    self.store.remove(CURRENT_INTERVAL_KEY)?;
    self.store.remove(LAST_CHECK_KEY)
  }

  pub fn is_tracking(&self) -> Result<bool> {
    Ok(self.store.get(CURRENT_INTERVAL_KEY)?.is_some())
  }

  pub fn last_check(&self) -> Result<Option<DateTime<Utc>>> {
    let Some(stored) = self.store.get(LAST_CHECK_KEY)? else {
      return Ok(None);
    };
    let millis: i64 = stored
      .parse()
      .map_err(|_| Error::Store(format!("corrupt {LAST_CHECK_KEY}: {stored}")))?;
    Ok(DateTime::from_timestamp_millis(millis))
  }

  /// Record that a status check happened without touching the elapsed
  /// value; drives the idle-phase poll schedule.
  pub fn touch_last_check_at(&self, now: DateTime<Utc>) -> Result<()> {
    self
      .store
      .set(LAST_CHECK_KEY, &now.timestamp_millis().to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  fn cache() -> IntervalCache {
    IntervalCache::new(TimerStore::open_in_memory().unwrap())
  }

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
  }

  #[test]
  fn extrapolates_forward_from_observation() {
    let cache = cache();
    cache.set_at(100, t0()).unwrap();

    assert_eq!(cache.get_at(t0() + Duration::seconds(5)).unwrap(), Some(105));
    assert_eq!(cache.get_at(t0() + Duration::seconds(65)).unwrap(), Some(165));
  }

  #[test]
  fn clear_removes_the_record() {
    let cache = cache();
    cache.set_at(100, t0()).unwrap();
    cache.clear().unwrap();

    assert_eq!(cache.get_at(t0() + Duration::seconds(5)).unwrap(), None);
    assert!(!cache.is_tracking().unwrap());
  }

  #[test]
  fn extrapolation_never_goes_backward() {
    let cache = cache();
    cache.set_at(100, t0()).unwrap();

    // Wall clock jumped behind the observation (sleep, NTP step).
    assert_eq!(cache.get_at(t0() - Duration::seconds(30)).unwrap(), Some(100));

    // Monotone non-decreasing across consecutive reads.
    let mut previous = 0;
    for offset in [0, 1, 2, 10, 60, 600] {
      let value = cache.get_at(t0() + Duration::seconds(offset)).unwrap().unwrap();
      assert!(value >= previous);
      previous = value;
    }
  }

  #[test]
  fn subsecond_drift_floors() {
    let cache = cache();
    cache.set_at(100, t0()).unwrap();
    assert_eq!(
      cache.get_at(t0() + Duration::milliseconds(900)).unwrap(),
      Some(100)
    );
  }

  #[test]
  fn record_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timer.db");

    {
      let cache = IntervalCache::new(TimerStore::open_at(&path).unwrap());
      cache.set_at(100, t0()).unwrap();
    }

    // Relaunch: a fresh process reads the same record and keeps
    // extrapolating from the persisted observation.
    let cache = IntervalCache::new(TimerStore::open_at(&path).unwrap());
    assert_eq!(cache.get_at(t0() + Duration::seconds(65)).unwrap(), Some(165));
  }

  #[test]
  fn touch_only_moves_the_observation() {
    let cache = cache();
    cache.touch_last_check_at(t0()).unwrap();

    assert_eq!(cache.get_at(t0()).unwrap(), None);
    assert_eq!(cache.last_check().unwrap(), Some(t0()));
  }
}
