//! Query keys for Midday API reads.

use chrono::NaiveDate;

use crate::cache::QueryKey;

/// Key-prefix domains. Mutations invalidate whole domains when a view
/// could have cached any argument combination (every search term,
/// every list filter).
pub mod domains {
  pub const GLOBAL_SEARCH: &str = "global-search";
  pub const TRANSACTIONS: &str = "transactions";
  pub const CUSTOMERS: &str = "customers";
  pub const DOCUMENTS: &str = "documents";
  pub const INVOICES: &str = "invoices";
  pub const TRACKER_PROJECTS: &str = "tracker-projects";
  pub const TRACKER_ENTRIES: &str = "tracker-entries";
  pub const SPENDINGS: &str = "spendings";
}

/// One variant per cached read, carrying the operation's arguments.
/// Structurally equal arguments must produce equal keys; that equality
/// is the whole cache-hit contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddayQueryKey {
  GlobalSearch { term: Option<String> },
  Transactions { query: Option<String> },
  Transaction { id: String },
  Customers,
  Customer { id: String },
  Documents { query: Option<String> },
  Document { id: String },
  Invoices,
  Invoice { id: String },
  TrackerProjects,
  TrackerEntries {
    from: NaiveDate,
    to: NaiveDate,
    project_id: String,
  },
  Spendings { from: NaiveDate, to: NaiveDate },
}

impl QueryKey for MiddayQueryKey {
  fn domain(&self) -> &'static str {
    match self {
      Self::GlobalSearch { .. } => domains::GLOBAL_SEARCH,
      Self::Transactions { .. } | Self::Transaction { .. } => domains::TRANSACTIONS,
      Self::Customers | Self::Customer { .. } => domains::CUSTOMERS,
      Self::Documents { .. } | Self::Document { .. } => domains::DOCUMENTS,
      Self::Invoices | Self::Invoice { .. } => domains::INVOICES,
      Self::TrackerProjects => domains::TRACKER_PROJECTS,
      Self::TrackerEntries { .. } => domains::TRACKER_ENTRIES,
      Self::Spendings { .. } => domains::SPENDINGS,
    }
  }

  fn cache_input(&self) -> String {
    match self {
      Self::GlobalSearch { term } => format!("search:{}", normalize(term.as_deref())),
      Self::Transactions { query } => format!("list:{}", normalize(query.as_deref())),
      Self::Transaction { id } => format!("get:{id}"),
      Self::Customers => "list".to_string(),
      Self::Customer { id } => format!("get:{id}"),
      Self::Documents { query } => format!("list:{}", normalize(query.as_deref())),
      Self::Document { id } => format!("get:{id}"),
      Self::Invoices => "list".to_string(),
      Self::Invoice { id } => format!("get:{id}"),
      Self::TrackerProjects => "list".to_string(),
      Self::TrackerEntries {
        from,
        to,
        project_id,
      } => format!("list:{from}:{to}:{project_id}"),
      Self::Spendings { from, to } => format!("report:{from}:{to}"),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::GlobalSearch { term } => format!("search '{}'", term.as_deref().unwrap_or("")),
      Self::Transactions { query } => match query {
        Some(q) => format!("transactions matching '{q}'"),
        None => "transactions".to_string(),
      },
      Self::Transaction { id } => format!("transaction {id}"),
      Self::Customers => "customers".to_string(),
      Self::Customer { id } => format!("customer {id}"),
      Self::Documents { query } => match query {
        Some(q) => format!("documents matching '{q}'"),
        None => "documents".to_string(),
      },
      Self::Document { id } => format!("document {id}"),
      Self::Invoices => "invoices".to_string(),
      Self::Invoice { id } => format!("invoice {id}"),
      Self::TrackerProjects => "tracker projects".to_string(),
      Self::TrackerEntries {
        from,
        to,
        project_id,
      } => format!("entries for {project_id} {from}..{to}"),
      Self::Spendings { from, to } => format!("spendings {from}..{to}"),
    }
  }
}

/// Normalize free-text queries for consistent hashing: trim and
/// lowercase, and fold an absent query into the empty one (they issue
/// the same request).
fn normalize(query: Option<&str>) -> String {
  query.unwrap_or("").trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn structurally_equal_args_give_equal_keys() {
    let a = MiddayQueryKey::Transactions {
      query: Some("coffee".into()),
    };
    let b = MiddayQueryKey::Transactions {
      query: Some("coffee".into()),
    };
    assert_eq!(a.cache_hash(), b.cache_hash());

    let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let c = MiddayQueryKey::Spendings { from, to };
    let d = MiddayQueryKey::Spendings { from, to };
    assert_eq!(c.cache_hash(), d.cache_hash());
  }

  #[test]
  fn different_args_give_different_keys() {
    let a = MiddayQueryKey::Transactions {
      query: Some("coffee".into()),
    };
    let b = MiddayQueryKey::Transactions {
      query: Some("tea".into()),
    };
    assert_ne!(a.cache_hash(), b.cache_hash());

    let x = MiddayQueryKey::Customer { id: "c1".into() };
    let y = MiddayQueryKey::Customer { id: "c2".into() };
    assert_ne!(x.cache_hash(), y.cache_hash());
  }

  #[test]
  fn same_id_in_different_domains_does_not_collide() {
    let a = MiddayQueryKey::Customer { id: "42".into() };
    let b = MiddayQueryKey::Invoice { id: "42".into() };
    assert_ne!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn absent_and_empty_query_issue_the_same_request() {
    let a = MiddayQueryKey::GlobalSearch { term: None };
    let b = MiddayQueryKey::GlobalSearch {
      term: Some("  ".into()),
    };
    assert_eq!(a.cache_hash(), b.cache_hash());
  }
}
