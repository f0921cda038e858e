//! Domain types for the Midday API.
//!
//! Everything derives both serde directions: responses are parsed from
//! the wire and re-serialized into the query cache as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
  pub id: String,
  pub name: String,
  pub amount: f64,
  pub currency: String,
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub method: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub category: Option<Category>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub attachments: Vec<Attachment>,
}

/// Receipt or invoice file attached to a transaction. The blob itself
/// is only reachable through a pre-signed URL fetched on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
  pub id: String,
  #[serde(default)]
  pub filename: Option<String>,
  /// Storage path segments; the last one doubles as a display name
  /// when no filename was recorded.
  #[serde(default)]
  pub path: Vec<String>,
  #[serde(default)]
  pub size: Option<u64>,
}

impl Attachment {
  /// Display name: filename, else the last path segment, else the id.
  pub fn label(&self) -> &str {
    self
      .filename
      .as_deref()
      .or_else(|| self.path.last().map(String::as_str))
      .unwrap_or(&self.id)
  }
}

/// Pre-signed, time-limited link to an attachment blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUrl {
  pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub name: String,
  #[serde(default)]
  pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub website: Option<String>,
  #[serde(default)]
  pub country: Option<String>,
  #[serde(default)]
  pub city: Option<String>,
}

/// Payload for customer create; the id is assigned server-side, so
/// invalidation after a create must use the *returned* customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub website: Option<String>,
  /// ISO 3166-1 alpha-2 country code
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  pub id: String,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub summary: Option<String>,
  #[serde(default)]
  pub mime_type: Option<String>,
  #[serde(default)]
  pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
  pub id: String,
  #[serde(default)]
  pub invoice_number: Option<String>,
  pub status: String,
  pub amount: f64,
  pub currency: String,
  #[serde(default)]
  pub due_date: Option<String>,
  #[serde(default)]
  pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerProject {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  /// Estimated hours
  #[serde(default)]
  pub estimate: Option<i64>,
  /// Total tracked seconds
  #[serde(default)]
  pub total_duration: Option<i64>,
  #[serde(default)]
  pub currency: Option<String>,
}

/// A tracker project joined client-side with the current timer: the
/// timer payload is attached iff its running entry points at this
/// project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerProjectWithTimer {
  #[serde(flatten)]
  pub project: TrackerProject,
  pub timer: Option<TimerStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStatus {
  pub is_running: bool,
  /// Seconds tracked so far, server ground truth
  #[serde(default)]
  pub elapsed_time: u64,
  #[serde(default)]
  pub current_entry: Option<CurrentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentEntry {
  pub project_id: String,
  #[serde(default)]
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerEntry {
  pub id: String,
  #[serde(default)]
  pub description: Option<String>,
  /// Seconds
  pub duration: i64,
  #[serde(default)]
  pub date: Option<String>,
}

/// Caller-facing arguments for creating a tracker entry. The wire
/// format wants `{dates, duration}`; the conversion from this pair
/// lives in the client.
#[derive(Debug, Clone)]
pub struct NewTrackerEntry {
  pub project_id: String,
  pub description: Option<String>,
  pub start: DateTime<Utc>,
  pub stop: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spending {
  pub name: String,
  #[serde(default)]
  pub slug: Option<String>,
  pub amount: f64,
  pub currency: String,
  #[serde(default)]
  pub percentage: Option<f64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn attachment_label_falls_back_to_path_then_id() {
    let named = Attachment {
      id: "a1".into(),
      filename: Some("receipt.pdf".into()),
      path: vec!["vault".into(), "blob-7f".into()],
      size: None,
    };
    assert_eq!(named.label(), "receipt.pdf");

    let pathed = Attachment {
      id: "a2".into(),
      filename: None,
      path: vec!["vault".into(), "blob-7f".into()],
      size: None,
    };
    assert_eq!(pathed.label(), "blob-7f");

    let bare = Attachment {
      id: "a3".into(),
      filename: None,
      path: vec![],
      size: None,
    };
    assert_eq!(bare.label(), "a3");
  }

  #[test]
  fn transaction_without_attachments_parses() {
    // Older responses omit the field entirely.
    let tx: Transaction = serde_json::from_value(serde_json::json!({
      "id": "t1",
      "name": "Coffee",
      "amount": -4.5,
      "currency": "EUR"
    }))
    .unwrap();
    assert!(tx.attachments.is_empty());

    let tx: Transaction = serde_json::from_value(serde_json::json!({
      "id": "t2",
      "name": "Hosting",
      "amount": -20.0,
      "currency": "EUR",
      "attachments": [{ "id": "a1", "filename": "invoice.pdf" }]
    }))
    .unwrap();
    assert_eq!(tx.attachments.len(), 1);
    assert_eq!(tx.attachments[0].label(), "invoice.pdf");
  }
}
