//! Midday API integration: typed client, query keys and the cached
//! client the views talk to.

pub mod api_types;
pub mod cache;
pub mod cached_client;
pub mod client;
pub mod types;
