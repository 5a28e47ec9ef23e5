//! HTTP client infrastructure for the storefront shop API.
//!
//! This crate provides:
//! - HTTP client construction with optional bearer token authentication
//! - Typed payloads for the read-only catalog endpoints, validated on ingestion
//! - [`QueryString`], the ordered `key=value` form used for listing filters
//! - A [`MockClient`] that replays canned responses for tests and offline use
//!
//! ## Usage
//!
//! ```ignore
//! use storefront_catalog::{CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let config = CatalogClientConfig {
//!     catalog_url: "http://127.0.0.1:8000/api/v1".to_string(),
//!     access_token: None,
//!     extra_headers: BTreeMap::new(),
//!     user_agent: None,
//! };
//!
//! let client = CatalogClient::new(config)?;
//! let brands = client.brands(&CategoryRef::new("TV")).await?;
//! ```

mod client;
mod config;
mod error;
mod query;
pub mod types;

pub use client::{
    CatalogClient,
    Client,
    ClientTrait,
    MockClient,
    MockResponse,
    STOREFRONT_CATALOG_MOCK_DATA_VAR,
};
pub use config::CatalogClientConfig;
pub use error::CatalogClientError;
pub use query::QueryString;
