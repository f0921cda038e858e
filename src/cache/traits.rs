//! Cache key derivation.

use sha2::{Digest, Sha256};

/// A deterministic cache identifier for one remote read.
///
/// Two keys built from structurally equal arguments must hash
/// identically; that equality is what makes a cache hit. Beyond
/// equality the hash is opaque.
pub trait QueryKey {
  /// Key-prefix grouping related reads (e.g. "customers"). Mutations
  /// invalidate whole domains when they cannot enumerate every
  /// argument combination a view may have cached.
  fn domain(&self) -> &'static str;

  /// Canonical serialization of the key's arguments. Must be stable
  /// for structurally equal arguments.
  fn cache_input(&self) -> String;

  /// Human-readable form for logs.
  fn description(&self) -> String;

  /// Stable, fixed-length key: SHA-256 over domain and arguments.
  fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.domain().as_bytes());
    hasher.update(b":");
    hasher.update(self.cache_input().as_bytes());
    hex::encode(hasher.finalize())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Key(&'static str, String);

  impl QueryKey for Key {
    fn domain(&self) -> &'static str {
      self.0
    }
    fn cache_input(&self) -> String {
      self.1.clone()
    }
    fn description(&self) -> String {
      format!("{} {}", self.0, self.1)
    }
  }

  #[test]
  fn equal_args_hash_equal() {
    let a = Key("transactions", "q=coffee".into());
    let b = Key("transactions", "q=coffee".into());
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn different_args_or_domains_hash_differently() {
    let a = Key("transactions", "q=coffee".into());
    let b = Key("transactions", "q=tea".into());
    let c = Key("invoices", "q=coffee".into());
    assert_ne!(a.cache_hash(), b.cache_hash());
    assert_ne!(a.cache_hash(), c.cache_hash());
  }
}
