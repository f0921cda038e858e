//! Midday API client.
//!
//! One method per remote capability. Every call funnels through
//! [`MiddayClient::tried`], which logs the failure, hands it to the
//! observability sink and re-throws the original error unchanged.
//! Recovery is entirely the caller's business, but nothing is ever
//! swallowed.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::TokenStore;
use crate::config::Config;
use crate::error::{Error, Result};

use super::api_types::{ListEnvelope, SearchResult};
use super::types::{
  AttachmentUrl, Customer, CustomerPayload, Document, Invoice, NewTrackerEntry, Spending,
  TimerStatus, TrackerEntry, TrackerProject, TrackerProjectWithTimer, Transaction,
};

/// Observability sink for façade failures. The default forwards to
/// `tracing`; tests plug in a recording sink.
pub trait ErrorSink: Send + Sync {
  fn capture(&self, op: &'static str, err: &Error);
}

pub struct TracingSink;

impl ErrorSink for TracingSink {
  fn capture(&self, op: &'static str, err: &Error) {
    tracing::error!(target: "m9s::telemetry", op, error = %err, "captured api failure");
  }
}

/// Midday API client wrapper.
///
/// Cheap to clone: all clones share one HTTP connection pool and one
/// token store, so a refreshed token is visible everywhere. The token
/// is read per request, never baked into the client.
#[derive(Clone)]
pub struct MiddayClient {
  http: reqwest::Client,
  api_url: Url,
  search_url: Url,
  page_size: u32,
  token: TokenStore,
  sink: Arc<dyn ErrorSink>,
}

impl MiddayClient {
  pub fn new(config: &Config, token: TokenStore) -> Result<Self> {
    Self::with_sink(config, token, Arc::new(TracingSink))
  }

  pub fn with_sink(config: &Config, token: TokenStore, sink: Arc<dyn ErrorSink>) -> Result<Self> {
    let api_url = Url::parse(&config.midday.api_url)
      .map_err(|e| Error::Request(format!("invalid api_url {}: {}", config.midday.api_url, e)))?;
    let search_url = Url::parse(&config.midday.search_url).map_err(|e| {
      Error::Request(format!(
        "invalid search_url {}: {}",
        config.midday.search_url, e
      ))
    })?;

    Ok(Self {
      http: reqwest::Client::new(),
      api_url,
      search_url,
      page_size: config.midday.page_size,
      token,
      sink,
    })
  }

  // -------------------------------------------------------------------
  // Transactions
  // -------------------------------------------------------------------

  pub async fn transactions(&self, query: Option<&str>) -> Result<Vec<Transaction>> {
    self
      .tried("transactions.list", async {
        let mut params = vec![("pageSize", self.page_size.to_string())];
        if let Some(q) = query.filter(|q| !q.trim().is_empty()) {
          params.push(("q", q.trim().to_string()));
        }
        let envelope: ListEnvelope<Transaction> =
          self.get_json("/transactions", &params).await?;
        Ok(envelope.data)
      })
      .await
  }

  pub async fn transaction(&self, id: &str) -> Result<Transaction> {
    self
      .tried("transactions.get", async {
        self.get_json(&format!("/transactions/{id}"), &[]).await
      })
      .await
  }

  /// Pre-signed URL for one attachment blob, minted per request and
  /// time-limited server-side.
  pub async fn transaction_attachment_url(
    &self,
    transaction_id: &str,
    attachment_id: &str,
  ) -> Result<AttachmentUrl> {
    self
      .tried("transactions.attachmentUrl", async {
        let params = [("download", "false".to_string())];
        let path =
          format!("/transactions/{transaction_id}/attachments/{attachment_id}/presigned-url");
        self.get_json(&path, &params).await
      })
      .await
  }

  // -------------------------------------------------------------------
  // Customers
  // -------------------------------------------------------------------

  pub async fn customers(&self) -> Result<Vec<Customer>> {
    self
      .tried("customers.list", async {
        let params = [("pageSize", self.page_size.to_string())];
        let envelope: ListEnvelope<Customer> = self.get_json("/customers", &params).await?;
        Ok(envelope.data)
      })
      .await
  }

  pub async fn customer(&self, id: &str) -> Result<Customer> {
    self
      .tried("customers.get", async {
        self.get_json(&format!("/customers/{id}"), &[]).await
      })
      .await
  }

  pub async fn create_customer(&self, payload: &CustomerPayload) -> Result<Customer> {
    self
      .tried("customers.create", async {
        self.post_json("/customers", payload).await
      })
      .await
  }

  pub async fn update_customer(&self, id: &str, payload: &CustomerPayload) -> Result<Customer> {
    self
      .tried("customers.update", async {
        self
          .send_json(reqwest::Method::PATCH, &format!("/customers/{id}"), payload)
          .await
      })
      .await
  }

  pub async fn delete_customer(&self, id: &str) -> Result<Customer> {
    self
      .tried("customers.delete", async {
        let url = self.endpoint(&format!("/customers/{id}"))?;
        let token = self.token.bearer()?;
        let res = self.http.delete(url).bearer_auth(token).send().await?;
        Self::parse(res).await
      })
      .await
  }

  // -------------------------------------------------------------------
  // Documents (vault)
  // -------------------------------------------------------------------

  pub async fn documents(&self, query: Option<&str>) -> Result<Vec<Document>> {
    self
      .tried("documents.list", async {
        let mut params = vec![("pageSize", self.page_size.to_string())];
        if let Some(q) = query.filter(|q| !q.trim().is_empty()) {
          params.push(("q", q.trim().to_string()));
        }
        let envelope: ListEnvelope<Document> = self.get_json("/documents", &params).await?;
        Ok(envelope.data)
      })
      .await
  }

  pub async fn document(&self, id: &str) -> Result<Document> {
    self
      .tried("documents.get", async {
        self.get_json(&format!("/documents/{id}"), &[]).await
      })
      .await
  }

  // -------------------------------------------------------------------
  // Invoices
  // -------------------------------------------------------------------

  pub async fn invoices(&self) -> Result<Vec<Invoice>> {
    self
      .tried("invoices.list", async {
        let params = [("pageSize", self.page_size.to_string())];
        let envelope: ListEnvelope<Invoice> = self.get_json("/invoices", &params).await?;
        Ok(envelope.data)
      })
      .await
  }

  pub async fn invoice(&self, id: &str) -> Result<Invoice> {
    self
      .tried("invoices.get", async {
        self.get_json(&format!("/invoices/{id}"), &[]).await
      })
      .await
  }

  // -------------------------------------------------------------------
  // Tracker
  // -------------------------------------------------------------------

  /// List tracker projects joined with the current timer: one status
  /// fetch, attached to the single project whose id matches the
  /// running entry.
  pub async fn tracker_projects(&self) -> Result<Vec<TrackerProjectWithTimer>> {
    self
      .tried("trackerProjects.list", async {
        let envelope: ListEnvelope<TrackerProject> =
          self.get_json("/tracker-projects", &[]).await?;
        let timer = self.fetch_timer_status().await?;

        let projects = envelope
          .data
          .into_iter()
          .map(|project| {
            let running_here = timer
              .current_entry
              .as_ref()
              .is_some_and(|entry| entry.project_id == project.id);
            TrackerProjectWithTimer {
              timer: running_here.then(|| timer.clone()),
              project,
            }
          })
          .collect();

        Ok(projects)
      })
      .await
  }

  pub async fn tracker_entries(
    &self,
    from: NaiveDate,
    to: NaiveDate,
    project_id: &str,
  ) -> Result<Vec<TrackerEntry>> {
    self
      .tried("trackerEntries.list", async {
        let params = [
          ("from", from.to_string()),
          ("to", to.to_string()),
          ("projectId", project_id.to_string()),
        ];
        let envelope: ListEnvelope<TrackerEntry> =
          self.get_json("/tracker-entries", &params).await?;
        Ok(envelope.data)
      })
      .await
  }

  pub async fn create_tracker_entry(&self, args: &NewTrackerEntry) -> Result<TrackerEntry> {
    self
      .tried("trackerEntries.create", async {
        let duration = entry_duration(args.start, args.stop);
        if duration <= 0 {
          return Err(Error::Validation("stop must be after start".into()));
        }
        let body = serde_json::json!({
          "projectId": args.project_id,
          "description": args.description,
          "dates": entry_dates(args.start, args.stop),
          "duration": duration,
        });
        self.post_json("/tracker-entries", &body).await
      })
      .await
  }

  pub async fn timer_status(&self) -> Result<TimerStatus> {
    self
      .tried("trackerTimer.status", self.fetch_timer_status())
      .await
  }

  pub async fn start_timer(&self, project_id: &str) -> Result<TimerStatus> {
    self
      .tried("trackerTimer.start", async {
        let body = serde_json::json!({ "projectId": project_id });
        self.post_json("/tracker-timer/start", &body).await
      })
      .await
  }

  pub async fn stop_timer(&self) -> Result<TimerStatus> {
    self
      .tried("trackerTimer.stop", async {
        self.post_json("/tracker-timer/stop", &serde_json::json!({})).await
      })
      .await
  }

  // -------------------------------------------------------------------
  // Reports
  // -------------------------------------------------------------------

  pub async fn spendings(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Spending>> {
    self
      .tried("reports.spending", async {
        let params = [("from", from.to_string()), ("to", to.to_string())];
        let envelope: ListEnvelope<Spending> =
          self.get_json("/reports/spending", &params).await?;
        Ok(envelope.data)
      })
      .await
  }

  // -------------------------------------------------------------------
  // Global search
  // -------------------------------------------------------------------

  /// Global search goes at the fixed endpoint directly with the bearer
  /// header attached by hand; the SDK-equivalent route has been
  /// unreliable. The query-string argument must be named `searchTerm`.
  pub async fn global_search(&self, term: Option<&str>) -> Result<Vec<SearchResult>> {
    self
      .tried("search.global", async {
        let token = self.token.bearer()?;
        let url = build_search_url(&self.search_url, term);
        let res = self
          .http
          .get(url)
          .header(AUTHORIZATION, format!("Bearer {token}"))
          .send()
          .await?;
        Self::parse(res).await
      })
      .await
  }

  // -------------------------------------------------------------------
  // Shared plumbing
  // -------------------------------------------------------------------

  /// Uniform failure funnel: log, report to the sink, re-throw
  /// unchanged.
  async fn tried<T>(&self, op: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match fut.await {
      Ok(value) => Ok(value),
      Err(err) => {
        tracing::error!(op, error = %err, "midday api call failed");
        self.sink.capture(op, &err);
        Err(err)
      }
    }
  }

  async fn fetch_timer_status(&self) -> Result<TimerStatus> {
    self.get_json("/tracker-timer/status", &[]).await
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .api_url
      .join(path)
      .map_err(|e| Error::Request(format!("invalid endpoint {path}: {e}")))
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
    let url = self.endpoint(path)?;
    let token = self.token.bearer()?;
    let res = self
      .http
      .get(url)
      .bearer_auth(token)
      .query(params)
      .send()
      .await?;
    Self::parse(res).await
  }

  async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T> {
    self.send_json(reqwest::Method::POST, path, body).await
  }

  async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    method: reqwest::Method,
    path: &str,
    body: &B,
  ) -> Result<T> {
    let url = self.endpoint(path)?;
    let token = self.token.bearer()?;
    let res = self
      .http
      .request(method, url)
      .bearer_auth(token)
      .json(body)
      .send()
      .await?;
    Self::parse(res).await
  }

  async fn parse<T: DeserializeOwned>(res: reqwest::Response) -> Result<T> {
    let status = res.status();
    if !status.is_success() {
      let message = res.text().await.unwrap_or_default();
      return Err(Error::Api {
        status: status.as_u16(),
        message: truncate_message(&message),
      });
    }
    let bytes = res.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Json(e.to_string()))
  }
}

fn build_search_url(base: &Url, term: Option<&str>) -> Url {
  let mut url = base.clone();
  url
    .query_pairs_mut()
    .append_pair("searchTerm", term.unwrap_or("").trim());
  url
}

/// Error bodies can be whole HTML pages; keep the useful prefix.
fn truncate_message(message: &str) -> String {
  let trimmed = message.trim();
  if trimmed.chars().count() > 200 {
    let mut out: String = trimmed.chars().take(200).collect();
    out.push('…');
    out
  } else {
    trimmed.to_string()
  }
}

/// `{start, stop}` → wire `dates`: one ISO date when both fall on the
/// same calendar day, else the two days in order.
pub fn entry_dates(start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<String> {
  let start_day = start.date_naive();
  let stop_day = stop.date_naive();
  if start_day == stop_day {
    vec![start_day.to_string()]
  } else {
    vec![start_day.to_string(), stop_day.to_string()]
  }
}

/// `{start, stop}` → wire `duration` in whole seconds.
pub fn entry_duration(start: DateTime<Utc>, stop: DateTime<Utc>) -> i64 {
  (stop - start).num_seconds()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use std::sync::Mutex;

  fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
  }

  #[test]
  fn same_day_entry_gets_one_date() {
    let start = at(2024, 1, 1, 9, 0);
    let stop = at(2024, 1, 1, 17, 0);
    assert_eq!(entry_dates(start, stop), vec!["2024-01-01"]);
    assert_eq!(entry_duration(start, stop), 28_800);
  }

  #[test]
  fn midnight_crossing_entry_gets_both_dates() {
    let start = at(2024, 1, 1, 22, 0);
    let stop = at(2024, 1, 2, 2, 0);
    assert_eq!(entry_dates(start, stop), vec!["2024-01-01", "2024-01-02"]);
    assert_eq!(entry_duration(start, stop), 14_400);
  }

  #[test]
  fn search_url_uses_search_term_argument() {
    let base = Url::parse("https://api.midday.ai/search").unwrap();
    let url = build_search_url(&base, Some("acme inc"));
    assert_eq!(url.as_str(), "https://api.midday.ai/search?searchTerm=acme+inc");

    let empty = build_search_url(&base, None);
    assert_eq!(empty.as_str(), "https://api.midday.ai/search?searchTerm=");
  }

  #[derive(Default)]
  struct RecordingSink {
    captured: Mutex<Vec<(&'static str, String)>>,
  }

  impl ErrorSink for RecordingSink {
    fn capture(&self, op: &'static str, err: &Error) {
      self.captured.lock().unwrap().push((op, err.to_string()));
    }
  }

  fn offline_client(sink: Arc<RecordingSink>) -> MiddayClient {
    let config = Config::default();
    MiddayClient::with_sink(&config, TokenStore::new(), sink).unwrap()
  }

  #[tokio::test]
  async fn tried_reports_once_and_rethrows_unchanged() {
    let sink = Arc::new(RecordingSink::default());
    let client = offline_client(sink.clone());

    let err = client
      .tried("test.op", async {
        Err::<(), _>(Error::Api {
          status: 500,
          message: "boom".into(),
        })
      })
      .await
      .unwrap_err();

    assert_eq!(
      err,
      Error::Api {
        status: 500,
        message: "boom".into()
      }
    );
    let captured = sink.captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].0, "test.op");
    assert!(captured[0].1.contains("boom"));
  }

  #[tokio::test]
  async fn calls_without_token_fail_fast() {
    let sink = Arc::new(RecordingSink::default());
    let client = offline_client(sink.clone());

    // No network involved: the bearer check precedes the request.
    let err = client.transactions(None).await.unwrap_err();
    assert_eq!(err, Error::NotAuthenticated);

    let err = client.global_search(Some("acme")).await.unwrap_err();
    assert_eq!(err, Error::NotAuthenticated);

    let err = client.transaction_attachment_url("t1", "a1").await.unwrap_err();
    assert_eq!(err, Error::NotAuthenticated);

    assert_eq!(sink.captured.lock().unwrap().len(), 3);
  }

  #[tokio::test]
  async fn negative_duration_is_rejected_client_side() {
    let sink = Arc::new(RecordingSink::default());
    let client = offline_client(sink.clone());

    let args = NewTrackerEntry {
      project_id: "p1".into(),
      description: None,
      start: at(2024, 1, 2, 9, 0),
      stop: at(2024, 1, 1, 9, 0),
    };

    let err = client.create_tracker_entry(&args).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }
}
