//! Wire-level shapes: transport envelopes and the global-search
//! discriminated union.

use serde::{Deserialize, Serialize};

/// Envelope returned by list endpoints; callers get the `data` payload
/// unwrapped.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
  pub data: Vec<T>,
  #[serde(default)]
  pub meta: Option<ListMeta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
  #[serde(default)]
  pub cursor: Option<String>,
  #[serde(default)]
  pub has_next_page: Option<bool>,
}

/// One hit from the global search endpoint. The payload shape is keyed
/// by the `type` tag; an unknown tag is a deserialization error, not a
/// silently dropped item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchResult {
  Vault { data: VaultHit },
  Transaction { data: TransactionHit },
  Inbox { data: InboxHit },
  Customer { data: CustomerHit },
  Invoice { data: InvoiceHit },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultHit {
  #[serde(default)]
  pub tag: Option<String>,
  pub name: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub summary: String,
  #[serde(default)]
  pub metadata: Option<VaultMetadata>,
  #[serde(default)]
  pub object_id: Option<String>,
  #[serde(default)]
  pub path_tokens: Vec<String>,
  #[serde(default)]
  pub doc_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultMetadata {
  #[serde(rename = "eTag", default)]
  pub e_tag: Option<String>,
  #[serde(default)]
  pub size: Option<u64>,
  #[serde(rename = "mimeType", default)]
  pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHit {
  #[serde(default)]
  pub date: Option<String>,
  pub name: String,
  pub amount: f64,
  #[serde(default)]
  pub method: Option<String>,
  #[serde(default)]
  pub category: Option<String>,
  pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxHit {
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerHit {
  pub name: String,
  #[serde(default)]
  pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceHit {
  pub amount: f64,
  pub status: String,
  pub currency: String,
  #[serde(default)]
  pub due_date: Option<String>,
  #[serde(default)]
  pub customer_name: Option<String>,
  #[serde(default)]
  pub invoice_number: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn search_union_parses_known_tags() {
    let body = r#"[
      {"type": "transaction", "data": {"name": "Coffee", "amount": -4.5, "currency": "EUR", "method": "card", "date": "2024-03-01"}},
      {"type": "customer", "data": {"name": "Acme Inc", "email": "billing@acme.test"}},
      {"type": "invoice", "data": {"amount": 1200.0, "status": "unpaid", "currency": "USD", "invoice_number": "INV-0001"}},
      {"type": "inbox", "data": {"file_name": "receipt.pdf"}},
      {"type": "vault", "data": {"name": "contract.pdf", "path_tokens": ["2024", "contracts"]}}
    ]"#;

    let results: Vec<SearchResult> = serde_json::from_str(body).unwrap();
    assert_eq!(results.len(), 5);

    match &results[0] {
      SearchResult::Transaction { data } => {
        assert_eq!(data.name, "Coffee");
        assert_eq!(data.currency, "EUR");
      }
      other => panic!("expected transaction hit, got {other:?}"),
    }
    match &results[1] {
      SearchResult::Customer { data } => assert_eq!(data.email.as_deref(), Some("billing@acme.test")),
      other => panic!("expected customer hit, got {other:?}"),
    }
  }

  #[test]
  fn search_union_rejects_unknown_tags() {
    let body = r#"[{"type": "widget", "data": {"name": "?"}}]"#;
    let result: Result<Vec<SearchResult>, _> = serde_json::from_str(body);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("widget"), "error should name the unknown tag: {err}");
  }

  #[test]
  fn list_envelope_unwraps_data() {
    let body = r#"{"data": [{"id": "c1", "name": "Acme"}], "meta": {"hasNextPage": false}}"#;
    let envelope: ListEnvelope<crate::midday::types::Customer> = serde_json::from_str(body).unwrap();
    assert_eq!(envelope.data.len(), 1);
    assert_eq!(envelope.data[0].name, "Acme");
    assert_eq!(envelope.meta.unwrap().has_next_page, Some(false));
  }
}
