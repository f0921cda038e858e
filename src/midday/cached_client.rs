//! Cached Midday client: reads go through the cache layer under their
//! registry key, mutations invalidate every view whose correctness
//! depends on the mutated entity.

use chrono::NaiveDate;

use crate::cache::CacheLayer;
use crate::error::Result;

use super::api_types::SearchResult;
use super::cache::{domains, MiddayQueryKey};
use super::client::MiddayClient;
use super::types::{
  AttachmentUrl, Customer, CustomerPayload, Document, Invoice, NewTrackerEntry, Spending,
  TimerStatus, TrackerEntry, TrackerProjectWithTimer, Transaction,
};

/// Midday client with transparent caching.
///
/// Same API surface as the underlying [`MiddayClient`]; reads are
/// deduplicated and served from cache while fresh, mutations run the
/// remote call first and only invalidate after it succeeded, so a
/// failed mutation leaves every cached view untouched.
#[derive(Clone)]
pub struct CachedMiddayClient {
  inner: MiddayClient,
  cache: CacheLayer,
}

impl CachedMiddayClient {
  pub fn new(inner: MiddayClient, cache: CacheLayer) -> Self {
    Self { inner, cache }
  }

  pub fn cache(&self) -> &CacheLayer {
    &self.cache
  }

  // ------------------------------------------------------------------
  // Cached reads
  // ------------------------------------------------------------------

  pub async fn global_search(&self, term: Option<String>) -> Result<Vec<SearchResult>> {
    let key = MiddayQueryKey::GlobalSearch { term: term.clone() };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let term = term.clone();
        async move { inner.global_search(term.as_deref()).await }
      })
      .await
  }

  pub async fn transactions(&self, query: Option<String>) -> Result<Vec<Transaction>> {
    let key = MiddayQueryKey::Transactions {
      query: query.clone(),
    };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let query = query.clone();
        async move { inner.transactions(query.as_deref()).await }
      })
      .await
  }

  pub async fn transaction(&self, id: String) -> Result<Transaction> {
    let key = MiddayQueryKey::Transaction { id: id.clone() };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let id = id.clone();
        async move { inner.transaction(&id).await }
      })
      .await
  }

  pub async fn customers(&self) -> Result<Vec<Customer>> {
    self
      .cache
      .fetch(&MiddayQueryKey::Customers, || {
        let inner = self.inner.clone();
        async move { inner.customers().await }
      })
      .await
  }

  pub async fn customer(&self, id: String) -> Result<Customer> {
    let key = MiddayQueryKey::Customer { id: id.clone() };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let id = id.clone();
        async move { inner.customer(&id).await }
      })
      .await
  }

  pub async fn documents(&self, query: Option<String>) -> Result<Vec<Document>> {
    let key = MiddayQueryKey::Documents {
      query: query.clone(),
    };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let query = query.clone();
        async move { inner.documents(query.as_deref()).await }
      })
      .await
  }

  pub async fn document(&self, id: String) -> Result<Document> {
    let key = MiddayQueryKey::Document { id: id.clone() };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let id = id.clone();
        async move { inner.document(&id).await }
      })
      .await
  }

  pub async fn invoices(&self) -> Result<Vec<Invoice>> {
    self
      .cache
      .fetch(&MiddayQueryKey::Invoices, || {
        let inner = self.inner.clone();
        async move { inner.invoices().await }
      })
      .await
  }

  pub async fn invoice(&self, id: String) -> Result<Invoice> {
    let key = MiddayQueryKey::Invoice { id: id.clone() };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let id = id.clone();
        async move { inner.invoice(&id).await }
      })
      .await
  }

  pub async fn tracker_projects(&self) -> Result<Vec<TrackerProjectWithTimer>> {
    self
      .cache
      .fetch(&MiddayQueryKey::TrackerProjects, || {
        let inner = self.inner.clone();
        async move { inner.tracker_projects().await }
      })
      .await
  }

  pub async fn tracker_entries(
    &self,
    from: NaiveDate,
    to: NaiveDate,
    project_id: String,
  ) -> Result<Vec<TrackerEntry>> {
    let key = MiddayQueryKey::TrackerEntries {
      from,
      to,
      project_id: project_id.clone(),
    };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let project_id = project_id.clone();
        async move { inner.tracker_entries(from, to, &project_id).await }
      })
      .await
  }

  pub async fn spendings(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Spending>> {
    let key = MiddayQueryKey::Spendings { from, to };
    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        async move { inner.spendings(from, to).await }
      })
      .await
  }

  /// Timer status is never cached: reconciliation exists to fetch
  /// ground truth, a stale answer here would defeat it.
  pub async fn timer_status(&self) -> Result<TimerStatus> {
    self.inner.timer_status().await
  }

  /// Also uncached: attachment links are pre-signed and expire, so a
  /// cached one would be a dead link by the time it is reused.
  pub async fn transaction_attachment_url(
    &self,
    transaction_id: &str,
    attachment_id: &str,
  ) -> Result<AttachmentUrl> {
    self
      .inner
      .transaction_attachment_url(transaction_id, attachment_id)
      .await
  }

  // ------------------------------------------------------------------
  // Mutations
  // ------------------------------------------------------------------

  pub async fn create_customer(&self, payload: &CustomerPayload) -> Result<Customer> {
    let customer = self.inner.create_customer(payload).await?;
    // Invalidation keyed off the returned id: a create does not know
    // the id before the server answers.
    self.invalidate_customer_views(&customer.id);
    Ok(customer)
  }

  pub async fn update_customer(&self, id: &str, payload: &CustomerPayload) -> Result<Customer> {
    let customer = self.inner.update_customer(id, payload).await?;
    self.invalidate_customer_views(&customer.id);
    Ok(customer)
  }

  pub async fn delete_customer(&self, id: &str) -> Result<Customer> {
    let customer = self.inner.delete_customer(id).await?;
    self.invalidate_customer_views(&customer.id);
    Ok(customer)
  }

  pub async fn create_tracker_entry(&self, args: &NewTrackerEntry) -> Result<TrackerEntry> {
    let entry = self.inner.create_tracker_entry(args).await?;
    self.cache.invalidate_domain(domains::TRACKER_ENTRIES);
    self.cache.invalidate_domain(domains::TRACKER_PROJECTS);
    Ok(entry)
  }

  pub async fn start_timer(&self, project_id: &str) -> Result<TimerStatus> {
    let status = self.inner.start_timer(project_id).await?;
    self.cache.invalidate_domain(domains::TRACKER_PROJECTS);
    Ok(status)
  }

  pub async fn stop_timer(&self) -> Result<TimerStatus> {
    let status = self.inner.stop_timer().await?;
    self.cache.invalidate_domain(domains::TRACKER_PROJECTS);
    Ok(status)
  }

  /// Views listing customers, plus every cached search (any term may
  /// have matched the mutated customer), plus the entity itself.
  fn invalidate_customer_views(&self, id: &str) {
    self.cache.invalidate_domain(domains::CUSTOMERS);
    self.cache.invalidate_domain(domains::GLOBAL_SEARCH);
    self.cache.invalidate(&MiddayQueryKey::Customer { id: id.to_string() });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::TokenStore;
  use crate::cache::{CachePolicy, QueryKey};
  use crate::config::Config;
  use crate::error::Error;

  fn unauthenticated_client() -> CachedMiddayClient {
    let config = Config::default();
    let inner = MiddayClient::new(&config, TokenStore::new()).unwrap();
    CachedMiddayClient::new(inner, CacheLayer::new(CachePolicy::default()))
  }

  #[tokio::test]
  async fn failed_mutation_does_not_invalidate() {
    let client = unauthenticated_client();

    // Seed cached views directly; no network involved.
    let customer_key = MiddayQueryKey::Customer { id: "X".into() };
    let search_key = MiddayQueryKey::GlobalSearch { term: None };
    let _: u32 = client.cache.fetch(&customer_key, || async { Ok(1) }).await.unwrap();
    let _: u32 = client.cache.fetch(&search_key, || async { Ok(1) }).await.unwrap();

    let payload = CustomerPayload {
      name: "Acme".into(),
      email: None,
      website: None,
      country: None,
      city: None,
    };

    // The remote call fails fast (no token); invalidation must not run.
    let err = client.update_customer("X", &payload).await.unwrap_err();
    assert_eq!(err, Error::NotAuthenticated);
    assert!(client.cache.is_fresh(&customer_key));
    assert!(client.cache.is_fresh(&search_key));
  }

  #[tokio::test]
  async fn customer_invalidation_set_is_precise() {
    let client = unauthenticated_client();

    let customer_key = MiddayQueryKey::Customer { id: "X".into() };
    let other_customer = MiddayQueryKey::Customer { id: "Y".into() };
    let search_key = MiddayQueryKey::GlobalSearch {
      term: Some("acme".into()),
    };
    let invoices_key = MiddayQueryKey::Invoices;

    for key in [&customer_key, &other_customer, &search_key, &invoices_key] {
      let _: u32 = client.cache.fetch(key, || async { Ok(1) }).await.unwrap();
    }

    client.invalidate_customer_views("X");

    assert!(!client.cache.is_fresh(&customer_key));
    // Whole customers domain is stale: list views include Y's row too.
    assert!(!client.cache.is_fresh(&other_customer));
    assert!(!client.cache.is_fresh(&search_key));
    // Unrelated domains stay fresh.
    assert!(client.cache.is_fresh(&invoices_key));
  }

  #[test]
  fn read_and_registry_keys_agree() {
    // The key built inside `transactions` must match one built from
    // equal arguments anywhere else.
    let a = MiddayQueryKey::Transactions { query: None };
    let b = MiddayQueryKey::Transactions { query: None };
    assert_eq!(a.cache_hash(), b.cache_hash());
  }
}
