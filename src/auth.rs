//! Process-wide bearer token shared by every API call.
//!
//! The OAuth dance itself happens outside this program; m9s consumes a
//! token that is already issued (environment variable, or pushed in by
//! whatever refreshes it). `TokenStore` is the single seam: clients
//! read the token per request, so a refreshed token is picked up
//! without rebuilding anything.

use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Environment variables checked for the bearer token, in order.
const TOKEN_ENV_VARS: &[&str] = &["M9S_MIDDAY_TOKEN", "MIDDAY_API_TOKEN"];

#[derive(Clone, Default)]
pub struct TokenStore {
  token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a store seeded from the environment. The store is created
  /// even when no variable is set; calls will fail with
  /// `NotAuthenticated` until a token arrives.
  pub fn from_env() -> Self {
    let store = Self::new();
    for var in TOKEN_ENV_VARS {
      if let Ok(token) = std::env::var(var) {
        if !token.trim().is_empty() {
          store.set(token.trim());
          break;
        }
      }
    }
    store
  }

  /// Install or replace the token. Subsequent requests use the new
  /// value; nothing else needs reconstructing.
  pub fn set(&self, token: impl Into<String>) {
    let mut guard = self.token.write().expect("token lock poisoned");
    *guard = Some(token.into());
  }

  /// Drop the credential, e.g. after the server rejects it.
  pub fn clear(&self) {
    let mut guard = self.token.write().expect("token lock poisoned");
    *guard = None;
  }

  pub fn is_connected(&self) -> bool {
    self.token.read().expect("token lock poisoned").is_some()
  }

  /// Current token, or `NotAuthenticated` when none has been set.
  pub fn bearer(&self) -> Result<String> {
    self
      .token
      .read()
      .expect("token lock poisoned")
      .clone()
      .ok_or(Error::NotAuthenticated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bearer_fails_fast_without_token() {
    let store = TokenStore::new();
    assert_eq!(store.bearer(), Err(Error::NotAuthenticated));
    assert!(!store.is_connected());
  }

  #[test]
  fn set_then_bearer_returns_token() {
    let store = TokenStore::new();
    store.set("mid_abc");
    assert_eq!(store.bearer().unwrap(), "mid_abc");
    assert!(store.is_connected());
  }

  #[test]
  fn refreshed_token_is_picked_up_by_clones() {
    let store = TokenStore::new();
    store.set("old");

    // A clone taken earlier (e.g. held by a client) sees the refresh.
    let handle = store.clone();
    store.set("new");
    assert_eq!(handle.bearer().unwrap(), "new");
  }

  #[test]
  fn clear_disconnects() {
    let store = TokenStore::new();
    store.set("tok");
    store.clear();
    assert_eq!(store.bearer(), Err(Error::NotAuthenticated));
  }
}
