mod customer_form;
mod customer_list;
mod document_detail;
mod document_list;
mod global_search;
mod invoice_detail;
mod invoice_list;
mod spendings;
mod tracker_entries;
mod tracker_entry_form;
mod tracker_projects;
mod transaction_detail;
mod transaction_list;

pub use customer_form::CustomerFormView;
pub use customer_list::CustomerListView;
pub use document_detail::DocumentDetailView;
pub use document_list::DocumentListView;
pub use global_search::GlobalSearchView;
pub use invoice_detail::InvoiceDetailView;
pub use invoice_list::InvoiceListView;
pub use spendings::SpendingsView;
pub use tracker_entries::TrackerEntriesView;
pub use tracker_entry_form::TrackerEntryFormView;
pub use tracker_projects::TrackerProjectsView;
pub use transaction_detail::TransactionDetailView;
pub use transaction_list::TransactionListView;
