//! Configuration types for catalog client construction.

use std::collections::BTreeMap;

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL of the shop API, e.g. `http://127.0.0.1:8000/api/v1`.
    pub catalog_url: String,
    /// Optional bearer token sent with every request.
    pub access_token: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Overrides the default `reqwest` user agent.
    pub user_agent: Option<String>,
}
