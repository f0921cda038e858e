//! Error taxonomy shared across the crate.
//!
//! Variants are string-backed (rather than wrapping source errors) so
//! they stay `Clone`: the cache layer hands a stored failure to every
//! waiter that piled up behind a single in-flight fetch.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
  /// No bearer token has been established. Calls fail fast instead of
  /// attempting a request.
  #[error("not connected to Midday. Set M9S_MIDDAY_TOKEN and try again")]
  NotAuthenticated,

  /// Network-level failure (connect, timeout, body read).
  #[error("request failed: {0}")]
  Request(String),

  /// The API answered with a non-2xx status.
  #[error("Midday API error ({status}): {message}")]
  Api { status: u16, message: String },

  /// Response body did not match the expected shape.
  #[error("unexpected response: {0}")]
  Json(String),

  /// Client-side form validation. Never reaches the network.
  #[error("validation failed: {0}")]
  Validation(String),

  /// Local timer store failure.
  #[error("timer store error: {0}")]
  Store(String),
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    Error::Request(err.to_string())
  }
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Error::Json(err.to_string())
  }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    Error::Store(err.to_string())
  }
}

pub type Result<T> = std::result::Result<T, Error>;
