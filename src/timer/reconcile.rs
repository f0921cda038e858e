//! Reconciliation of the local timer record against server ground
//! truth.
//!
//! Two-state machine: **Tracking** while a local record exists, **Idle**
//! otherwise. The local extrapolation drifts (the app may have been
//! asleep), so a status poll reseeds it on a staleness schedule with
//! two tiers: short while tracking, long while idle. Both thresholds
//! come from the config file.

use chrono::{DateTime, Duration, Utc};

use crate::config::TimerConfig;
use crate::error::Result;
use crate::midday::types::TimerStatus;

use super::interval::IntervalCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
  /// A local record exists; a timer is assumed running.
  Tracking,
  /// No local record; no timer is known running.
  Idle,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcilePolicy {
  /// While tracking: refresh ground truth once the record is older
  /// than this.
  pub tracking_refresh: Duration,
  /// While idle: check whether a timer was started elsewhere once the
  /// last check is older than this.
  pub idle_check: Duration,
}

impl Default for ReconcilePolicy {
  fn default() -> Self {
    Self {
      tracking_refresh: Duration::seconds(60),
      idle_check: Duration::minutes(15),
    }
  }
}

impl From<TimerConfig> for ReconcilePolicy {
  fn from(config: TimerConfig) -> Self {
    Self {
      tracking_refresh: Duration::seconds(config.tracking_refresh_secs as i64),
      idle_check: Duration::seconds(config.idle_check_secs as i64),
    }
  }
}

impl ReconcilePolicy {
  /// Poll if and only if the time since the last observation strictly
  /// exceeds the phase's threshold. No observation at all means poll.
  pub fn should_poll(
    &self,
    phase: TimerPhase,
    last_check: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
  ) -> bool {
    let threshold = match phase {
      TimerPhase::Tracking => self.tracking_refresh,
      TimerPhase::Idle => self.idle_check,
    };
    match last_check {
      None => true,
      Some(last) => now - last > threshold,
    }
  }
}

/// Ties the interval cache to the policy and applies poll results.
#[derive(Clone)]
pub struct TimerReconciler {
  cache: IntervalCache,
  policy: ReconcilePolicy,
}

impl TimerReconciler {
  pub fn new(cache: IntervalCache, policy: ReconcilePolicy) -> Self {
    Self { cache, policy }
  }

  pub fn phase(&self) -> Result<TimerPhase> {
    Ok(if self.cache.is_tracking()? {
      TimerPhase::Tracking
    } else {
      TimerPhase::Idle
    })
  }

  pub fn needs_poll(&self) -> Result<bool> {
    self.needs_poll_at(Utc::now())
  }

  pub fn needs_poll_at(&self, now: DateTime<Utc>) -> Result<bool> {
    Ok(
      self
        .policy
        .should_poll(self.phase()?, self.cache.last_check()?, now),
    )
  }

  pub fn apply_status(&self, status: &TimerStatus) -> Result<TimerPhase> {
    self.apply_status_at(status, Utc::now())
  }

  /// Reseed or clear the local record from a server answer. Running
  /// means the record is seeded with the server's elapsed seconds;
  /// not-running clears it. Either way the check timestamp moves, so
  /// the next poll waits a full threshold.
  pub fn apply_status_at(&self, status: &TimerStatus, now: DateTime<Utc>) -> Result<TimerPhase> {
    if status.is_running {
      self.cache.set_at(status.elapsed_time, now)?;
      Ok(TimerPhase::Tracking)
    } else {
      self.cache.clear()?;
      self.cache.touch_last_check_at(now)?;
      Ok(TimerPhase::Idle)
    }
  }

  /// Record a failed poll so the next attempt waits a full threshold
  /// instead of retrying every tick.
  pub fn defer(&self) -> Result<()> {
    self.cache.touch_last_check_at(Utc::now())
  }

  /// Extrapolated elapsed seconds for display, `None` while idle.
  pub fn elapsed(&self) -> Result<Option<u64>> {
    self.cache.get()
  }

  pub fn elapsed_at(&self, now: DateTime<Utc>) -> Result<Option<u64>> {
    self.cache.get_at(now)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::timer::store::TimerStore;
  use chrono::TimeZone;

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
  }

  fn reconciler() -> TimerReconciler {
    TimerReconciler::new(
      IntervalCache::new(TimerStore::open_in_memory().unwrap()),
      ReconcilePolicy::default(),
    )
  }

  fn running(elapsed: u64, project: &str) -> TimerStatus {
    TimerStatus {
      is_running: true,
      elapsed_time: elapsed,
      current_entry: Some(crate::midday::types::CurrentEntry {
        project_id: project.to_string(),
        description: None,
      }),
    }
  }

  fn stopped() -> TimerStatus {
    TimerStatus {
      is_running: false,
      elapsed_time: 0,
      current_entry: None,
    }
  }

  #[test]
  fn tracking_threshold_is_a_strict_boundary() {
    let policy = ReconcilePolicy::default();
    let last = Some(t0());

    let at = |secs: i64| t0() + Duration::seconds(secs);
    assert!(!policy.should_poll(TimerPhase::Tracking, last, at(59)));
    assert!(!policy.should_poll(TimerPhase::Tracking, last, at(60)));
    assert!(policy.should_poll(TimerPhase::Tracking, last, at(61)));
  }

  #[test]
  fn idle_threshold_is_a_strict_boundary() {
    let policy = ReconcilePolicy::default();
    let last = Some(t0());

    let at = |secs: i64| t0() + Duration::seconds(secs);
    assert!(!policy.should_poll(TimerPhase::Idle, last, at(899)));
    assert!(!policy.should_poll(TimerPhase::Idle, last, at(900)));
    assert!(policy.should_poll(TimerPhase::Idle, last, at(901)));
  }

  #[test]
  fn no_observation_always_polls() {
    let policy = ReconcilePolicy::default();
    assert!(policy.should_poll(TimerPhase::Tracking, None, t0()));
    assert!(policy.should_poll(TimerPhase::Idle, None, t0()));
  }

  #[test]
  fn running_status_moves_idle_to_tracking() {
    let reconciler = reconciler();
    assert_eq!(reconciler.phase().unwrap(), TimerPhase::Idle);

    let phase = reconciler.apply_status_at(&running(120, "p1"), t0()).unwrap();
    assert_eq!(phase, TimerPhase::Tracking);
    assert_eq!(
      reconciler.elapsed_at(t0() + Duration::seconds(10)).unwrap(),
      Some(130)
    );
  }

  #[test]
  fn stopped_status_moves_tracking_to_idle() {
    let reconciler = reconciler();
    reconciler.apply_status_at(&running(120, "p1"), t0()).unwrap();

    let phase = reconciler.apply_status_at(&stopped(), t0()).unwrap();
    assert_eq!(phase, TimerPhase::Idle);
    assert_eq!(reconciler.elapsed_at(t0()).unwrap(), None);
    // The check timestamp survives the clear: idle polling backs off.
    assert!(!reconciler
      .needs_poll_at(t0() + Duration::seconds(900))
      .unwrap());
    assert!(reconciler
      .needs_poll_at(t0() + Duration::seconds(901))
      .unwrap());
  }

  #[test]
  fn tracking_refresh_corrects_drift() {
    let reconciler = reconciler();
    reconciler.apply_status_at(&running(100, "p1"), t0()).unwrap();

    // Just under the tracking threshold: no poll yet.
    assert!(!reconciler
      .needs_poll_at(t0() + Duration::seconds(60))
      .unwrap());
    assert!(reconciler
      .needs_poll_at(t0() + Duration::seconds(61))
      .unwrap());

    // The app slept; local extrapolation overshot the server truth.
    // Reseeding snaps back to ground truth.
    let later = t0() + Duration::seconds(300);
    assert_eq!(reconciler.elapsed_at(later).unwrap(), Some(400));
    reconciler.apply_status_at(&running(360, "p1"), later).unwrap();
    assert_eq!(reconciler.elapsed_at(later).unwrap(), Some(360));
  }
}
