//! Cache layer that orchestrates entry lifecycle with network fetching.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;

use crate::config::CacheConfig;
use crate::error::{Error, Result};

use super::traits::QueryKey;

/// Freshness, eviction and retry policy for cached queries.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
  /// Entries younger than this are served without a refetch
  pub fresh_for: Duration,
  /// Entries unused for this long are evicted
  pub gc_after: Duration,
  /// Total fetch attempts before the failure is stored and surfaced
  pub max_attempts: u32,
}

impl Default for CachePolicy {
  fn default() -> Self {
    Self {
      fresh_for: Duration::from_secs(30),
      gc_after: Duration::from_secs(300),
      max_attempts: 3,
    }
  }
}

impl From<CacheConfig> for CachePolicy {
  fn from(config: CacheConfig) -> Self {
    Self {
      fresh_for: Duration::from_secs(config.fresh_secs),
      gc_after: Duration::from_secs(config.gc_secs),
      max_attempts: config.max_attempts.max(1),
    }
  }
}

/// Settled or in-progress state of one cache entry. An absent entry is
/// the idle state.
#[derive(Debug, Clone)]
enum Slot {
  Loading,
  Success {
    value: serde_json::Value,
    /// None means explicitly invalidated: the value is still usable as
    /// a placeholder but the next read refetches.
    stale_at: Option<Instant>,
  },
  Error(Error),
}

#[derive(Debug)]
struct Entry {
  domain: &'static str,
  slot: Slot,
  last_used: Instant,
}

struct Inner {
  entries: Mutex<HashMap<String, Entry>>,
  /// One watch receiver per in-flight fetch; waiters subscribe instead
  /// of fetching themselves.
  in_flight: Mutex<HashMap<String, watch::Receiver<bool>>>,
  policy: CachePolicy,
}

/// In-memory read-through cache shared by all views.
///
/// Cloning hands out another handle to the same cache; the process must
/// hold exactly one underlying instance or invalidation fragments.
#[derive(Clone)]
pub struct CacheLayer {
  inner: Arc<Inner>,
}

impl CacheLayer {
  pub fn new(policy: CachePolicy) -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        in_flight: Mutex::new(HashMap::new()),
        policy,
      }),
    }
  }

  /// Fetch through the cache.
  ///
  /// 1. Fresh entry: returned immediately, no network.
  /// 2. Fetch for this key already in flight: await and share its
  ///    outcome.
  /// 3. Otherwise fetch, retrying up to `max_attempts` total, and
  ///    store the outcome (value or error) under the key.
  pub async fn fetch<K, T, F, Fut>(&self, key: &K, fetcher: F) -> Result<T>
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let hash = key.cache_hash();

    loop {
      self.evict_unused();

      if let Some(value) = self.read_fresh(&hash) {
        return Ok(serde_json::from_value(value)?);
      }

      // Join an in-flight fetch for the same key rather than duplicate it.
      let waiter = self.inner.in_flight.lock().expect("cache lock poisoned").get(&hash).cloned();
      if let Some(mut rx) = waiter {
        // Wakes on completion; a dropped sender settles it too.
        let _ = rx.changed().await;
        match self.read_settled(&hash) {
          Some(Ok(value)) => return Ok(serde_json::from_value(value)?),
          Some(Err(err)) => return Err(err),
          // Entry evicted between settle and read; start over.
          None => continue,
        }
      }

      // Become the fetcher for this key.
      let (tx, rx) = watch::channel(false);
      {
        let mut in_flight = self.inner.in_flight.lock().expect("cache lock poisoned");
        if in_flight.contains_key(&hash) {
          // Another task won the race; loop back and join it.
          continue;
        }
        in_flight.insert(hash.clone(), rx);
      }
      self.store_slot(&hash, key.domain(), Slot::Loading);

      let result = self.fetch_with_retry(key, &fetcher).await;

      match &result {
        Ok(data) => {
          let value = serde_json::to_value(data)?;
          self.store_slot(
            &hash,
            key.domain(),
            Slot::Success {
              value,
              stale_at: Some(Instant::now() + self.inner.policy.fresh_for),
            },
          );
        }
        Err(err) => {
          self.store_slot(&hash, key.domain(), Slot::Error(err.clone()));
        }
      }

      self.inner.in_flight.lock().expect("cache lock poisoned").remove(&hash);
      let _ = tx.send(true);

      return result;
    }
  }

  async fn fetch_with_retry<K, T, F, Fut>(&self, key: &K, fetcher: &F) -> Result<T>
  where
    K: QueryKey,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let max_attempts = self.inner.policy.max_attempts;
    let mut attempt = 0;

    loop {
      attempt += 1;
      match fetcher().await {
        Ok(data) => return Ok(data),
        Err(err) if attempt < max_attempts => {
          tracing::warn!(
            query = %key.description(),
            attempt,
            error = %err,
            "fetch failed, retrying"
          );
        }
        Err(err) => return Err(err),
      }
    }
  }

  /// Mark one key stale. The entry survives as a placeholder; the next
  /// read for it refetches.
  pub fn invalidate<K: QueryKey>(&self, key: &K) {
    let hash = key.cache_hash();
    let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
    if let Some(entry) = entries.get_mut(&hash) {
      if let Slot::Success { stale_at, .. } = &mut entry.slot {
        *stale_at = None;
      }
    }
  }

  /// Mark every entry in a domain stale. Used by mutations that cannot
  /// enumerate each cached argument combination (e.g. every search
  /// term that might list the mutated entity).
  pub fn invalidate_domain(&self, domain: &str) {
    let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
    for entry in entries.values_mut() {
      if entry.domain == domain {
        if let Slot::Success { stale_at, .. } = &mut entry.slot {
          *stale_at = None;
        }
      }
    }
  }

  /// Drop entries that have not been read within the gc window.
  pub fn evict_unused(&self) {
    let gc_after = self.inner.policy.gc_after;
    let now = Instant::now();
    let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
    entries.retain(|_, entry| {
      matches!(entry.slot, Slot::Loading) || now.duration_since(entry.last_used) < gc_after
    });
  }

  /// Whether a key currently holds a fresh value (test and status-line
  /// helper; does not bump `last_used`).
  pub fn is_fresh<K: QueryKey>(&self, key: &K) -> bool {
    let entries = self.inner.entries.lock().expect("cache lock poisoned");
    match entries.get(&key.cache_hash()) {
      Some(Entry {
        slot: Slot::Success { stale_at: Some(t), .. },
        ..
      }) => Instant::now() < *t,
      _ => false,
    }
  }

  pub fn len(&self) -> usize {
    self.inner.entries.lock().expect("cache lock poisoned").len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&self) {
    self.inner.entries.lock().expect("cache lock poisoned").clear();
  }

  fn read_fresh(&self, hash: &str) -> Option<serde_json::Value> {
    let now = Instant::now();
    let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
    let entry = entries.get_mut(hash)?;
    let fresh = match &entry.slot {
      Slot::Success {
        value,
        stale_at: Some(stale_at),
      } if now < *stale_at => Some(value.clone()),
      _ => None,
    };
    if fresh.is_some() {
      entry.last_used = now;
    }
    fresh
  }

  /// Read the outcome of a fetch that just settled, fresh or not.
  fn read_settled(&self, hash: &str) -> Option<Result<serde_json::Value>> {
    let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
    let entry = entries.get_mut(hash)?;
    entry.last_used = Instant::now();
    match &entry.slot {
      Slot::Success { value, .. } => Some(Ok(value.clone())),
      Slot::Error(err) => Some(Err(err.clone())),
      Slot::Loading => None,
    }
  }

  fn store_slot(&self, hash: &str, domain: &'static str, slot: Slot) {
    let mut entries = self.inner.entries.lock().expect("cache lock poisoned");
    entries.insert(
      hash.to_string(),
      Entry {
        domain,
        slot,
        last_used: Instant::now(),
      },
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  struct Key {
    domain: &'static str,
    arg: String,
  }

  impl Key {
    fn new(domain: &'static str, arg: &str) -> Self {
      Self {
        domain,
        arg: arg.to_string(),
      }
    }
  }

  impl QueryKey for Key {
    fn domain(&self) -> &'static str {
      self.domain
    }
    fn cache_input(&self) -> String {
      self.arg.clone()
    }
    fn description(&self) -> String {
      format!("{}:{}", self.domain, self.arg)
    }
  }

  fn layer(policy: CachePolicy) -> CacheLayer {
    CacheLayer::new(policy)
  }

  #[tokio::test]
  async fn fresh_entry_skips_network() {
    let cache = layer(CachePolicy::default());
    let calls = AtomicU32::new(0);
    let key = Key::new("transactions", "q=");

    for _ in 0..3 {
      let got: Vec<u32> = cache
        .fetch(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![1, 2, 3])
        })
        .await
        .unwrap();
      assert_eq!(got, vec![1, 2, 3]);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn stale_entry_refetches() {
    let cache = layer(CachePolicy {
      fresh_for: Duration::ZERO,
      ..CachePolicy::default()
    });
    let calls = AtomicU32::new(0);
    let key = Key::new("transactions", "q=");

    for _ in 0..2 {
      let _: u32 = cache
        .fetch(&key, || async { Ok(calls.fetch_add(1, Ordering::SeqCst)) })
        .await
        .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn retry_is_bounded() {
    let cache = layer(CachePolicy::default());
    let calls = AtomicU32::new(0);
    let key = Key::new("invoices", "");

    let result: Result<u32> = cache
      .fetch(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Request("connection refused".into()))
      })
      .await;

    assert_eq!(result, Err(Error::Request("connection refused".into())));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn transient_failure_recovers_within_retry_limit() {
    let cache = layer(CachePolicy::default());
    let calls = AtomicU32::new(0);
    let key = Key::new("invoices", "");

    let got: u32 = cache
      .fetch(&key, || async {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
          Err(Error::Request("flaky".into()))
        } else {
          Ok(7)
        }
      })
      .await
      .unwrap();

    assert_eq!(got, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn concurrent_fetches_share_one_request() {
    let cache = layer(CachePolicy::default());
    let calls = Arc::new(AtomicU32::new(0));
    let key = || Key::new("customers", "");

    let fetch = |cache: CacheLayer, calls: Arc<AtomicU32>| async move {
      cache
        .fetch(&key(), || {
          let calls = calls.clone();
          async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<_, Error>(42u32)
          }
        })
        .await
        .unwrap()
    };

    let (a, b) = tokio::join!(
      fetch(cache.clone(), calls.clone()),
      fetch(cache.clone(), calls.clone())
    );

    assert_eq!((a, b), (42, 42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn invalidation_targets_key_and_domain_only() {
    let cache = layer(CachePolicy::default());
    let customer = Key::new("customers", "id=X");
    let search_a = Key::new("global-search", "q=acme");
    let search_b = Key::new("global-search", "q=x");
    let invoices = Key::new("invoices", "");

    for key in [&customer, &search_a, &search_b, &invoices] {
      let _: u32 = cache.fetch(key, || async { Ok(1) }).await.unwrap();
    }

    // What an "update customer X" mutation performs.
    cache.invalidate(&customer);
    cache.invalidate_domain("global-search");
    cache.invalidate_domain("customers");

    assert!(!cache.is_fresh(&customer));
    assert!(!cache.is_fresh(&search_a));
    assert!(!cache.is_fresh(&search_b));
    assert!(cache.is_fresh(&invoices));

    // Next read of a stale key triggers a refetch.
    let calls = AtomicU32::new(0);
    let _: u32 = cache
      .fetch(&customer, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(2)
      })
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn unused_entries_are_evicted() {
    let cache = layer(CachePolicy {
      gc_after: Duration::ZERO,
      ..CachePolicy::default()
    });
    let key = Key::new("documents", "");

    let _: u32 = cache.fetch(&key, || async { Ok(1) }).await.unwrap();
    assert_eq!(cache.len(), 1);

    cache.evict_unused();
    assert!(cache.is_empty());
  }
}
