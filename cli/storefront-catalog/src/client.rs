//! Catalog client and its mock counterpart.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::num::NonZeroU32;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, parse_error_response};
use crate::query::QueryString;
use crate::types::*;

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The read-only catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the shop API via [`CatalogClient`]
/// - **Mock**: canned responses without HTTP via [`MockClient`]
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Every observed attribute value of the products in a category.
    async fn attribute_values(
        &self,
        category: &CategoryRef,
    ) -> Result<Vec<AttributeValue>, CatalogClientError>;

    /// Brands with at least one product in a category.
    async fn brands(&self, category: &CategoryRef) -> Result<Vec<Brand>, CatalogClientError>;

    /// Category groups with their non-empty categories.
    async fn category_groups(&self) -> Result<Vec<CategoryGroup>, CatalogClientError>;

    /// Fetch one page of a product listing filtered by `query`.
    async fn list_goods(
        &self,
        endpoint: ListingEndpoint,
        query: &QueryString,
        page: NonZeroU32,
        limit: NonZeroU32,
    ) -> Result<ProductPage, CatalogClientError>;
}

/// Either a client for the actual shop API,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// A client for the shop API.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = parse_base_url(&config.catalog_url)?;
        let client = build_http_client(&config)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// Update the client configuration and recreate the client.
    pub fn update_config(
        &mut self,
        update: impl FnOnce(&mut CatalogClientConfig),
    ) -> Result<(), CatalogClientError> {
        let mut modified_config = self.config.clone();
        update(&mut modified_config);
        *self = Self::new(modified_config)?;
        Ok(())
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, CatalogClientError> {
        self.base_url
            .join(path)
            .map_err(|source| CatalogClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value, CatalogClientError> {
        debug!(%url, "sending catalog request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CatalogClientError::Request)?;

        if !response.status().is_success() {
            return Err(parse_error_response(response).await);
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(CatalogClientError::Request)
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip_all, fields(category = %category))]
    async fn attribute_values(
        &self,
        category: &CategoryRef,
    ) -> Result<Vec<AttributeValue>, CatalogClientError> {
        let mut url = self.endpoint_url("attribute-values/")?;
        url.query_pairs_mut().append_pair("category", category.name());

        let values: Vec<AttributeValue> =
            parse_sequence("attribute values", self.get_json(url).await?)?;
        debug!(n_values = values.len(), "received attribute values");
        Ok(values)
    }

    #[instrument(skip_all, fields(category = %category))]
    async fn brands(&self, category: &CategoryRef) -> Result<Vec<Brand>, CatalogClientError> {
        let mut url = self.endpoint_url("brand/")?;
        url.query_pairs_mut().append_pair("category", category.name());

        parse_sequence("brands", self.get_json(url).await?)
    }

    #[instrument(skip_all)]
    async fn category_groups(&self) -> Result<Vec<CategoryGroup>, CatalogClientError> {
        let url = self.endpoint_url("group/")?;
        parse_sequence("category groups", self.get_json(url).await?)
    }

    #[instrument(skip_all, fields(endpoint = ?endpoint, query = %query, page = %page, limit = %limit))]
    async fn list_goods(
        &self,
        endpoint: ListingEndpoint,
        query: &QueryString,
        page: NonZeroU32,
        limit: NonZeroU32,
    ) -> Result<ProductPage, CatalogClientError> {
        let mut url = self.endpoint_url(endpoint.path())?;
        url.query_pairs_mut()
            .extend_pairs(query.pairs())
            .append_pair("limit", &limit.to_string())
            .append_pair("page", &page.to_string());

        let page: ProductPage = parse_record("product page", self.get_json(url).await?)?;
        debug!(
            count = page.count,
            n_results = page.results.len(),
            "received product page"
        );
        Ok(page)
    }
}

// ---------------------------------------------------------------------------
// Mock client
// ---------------------------------------------------------------------------

/// Path to a JSON file of [MockResponse]s.
///
/// When set, the command line serves catalog responses from this file
/// instead of calling the shop API.
pub const STOREFRONT_CATALOG_MOCK_DATA_VAR: &str = "_STOREFRONT_USE_CATALOG_MOCK";

/// A canned response served by [MockClient].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockResponse {
    AttributeValues(Vec<AttributeValue>),
    Brands(Vec<Brand>),
    CategoryGroups(Vec<CategoryGroup>),
    Goods(ProductPage),
    Error { status: u16, detail: String },
}

/// A catalog client that can be seeded with mock responses.
///
/// Responses are served in the order they were pushed,
/// regardless of which endpoint is called.
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_responses: Arc<Mutex<VecDeque<MockResponse>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client from a JSON file containing a list of [MockResponse]s.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogClientError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CatalogClientError::Other(format!(
                "failed to read mock responses from '{}': {e}",
                path.display()
            ))
        })?;
        let responses: VecDeque<MockResponse> = serde_json::from_str(&contents)
            .map_err(|source| CatalogClientError::MalformedPayload {
                what: "mock responses",
                source,
            })?;
        debug!(path = %path.display(), n_responses = responses.len(), "loaded mock responses");
        Ok(Self {
            mock_responses: Arc::new(Mutex::new(responses)),
        })
    }

    /// Push a new response into the list of mock responses
    pub fn push_response(&self, response: MockResponse) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(response);
    }

    /// Push a product page into the list of mock responses
    pub fn push_goods_response(&self, page: ProductPage) {
        self.push_response(MockResponse::Goods(page));
    }

    /// Push an API error into the list of mock responses
    pub fn push_error_response(&self, status: u16, detail: impl Into<String>) {
        self.push_response(MockResponse::Error {
            status,
            detail: detail.into(),
        });
    }

    /// Number of responses not yet served.
    pub fn remaining(&self) -> usize {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }

    fn next_response(&self, expected: &str) -> Result<MockResponse, CatalogClientError> {
        let response = self
            .mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();
        match response {
            Some(MockResponse::Error { status, detail }) => {
                let status = reqwest::StatusCode::from_u16(status).map_err(|_| {
                    CatalogClientError::Other(format!("invalid mock status code {status}"))
                })?;
                Err(CatalogClientError::ErrorResponse { status, detail })
            },
            Some(response) => Ok(response),
            None => Err(CatalogClientError::Other(format!(
                "expected {expected} mock response, none left"
            ))),
        }
    }
}

fn unexpected_mock(expected: &str, found: MockResponse) -> CatalogClientError {
    CatalogClientError::Other(format!(
        "expected {expected} mock response, found {found:?}"
    ))
}

impl ClientTrait for MockClient {
    async fn attribute_values(
        &self,
        _category: &CategoryRef,
    ) -> Result<Vec<AttributeValue>, CatalogClientError> {
        match self.next_response("attribute values")? {
            MockResponse::AttributeValues(values) => Ok(values),
            other => Err(unexpected_mock("attribute values", other)),
        }
    }

    async fn brands(&self, _category: &CategoryRef) -> Result<Vec<Brand>, CatalogClientError> {
        match self.next_response("brands")? {
            MockResponse::Brands(brands) => Ok(brands),
            other => Err(unexpected_mock("brands", other)),
        }
    }

    async fn category_groups(&self) -> Result<Vec<CategoryGroup>, CatalogClientError> {
        match self.next_response("category groups")? {
            MockResponse::CategoryGroups(groups) => Ok(groups),
            other => Err(unexpected_mock("category groups", other)),
        }
    }

    async fn list_goods(
        &self,
        _endpoint: ListingEndpoint,
        _query: &QueryString,
        _page: NonZeroU32,
        _limit: NonZeroU32,
    ) -> Result<ProductPage, CatalogClientError> {
        match self.next_response("goods")? {
            MockResponse::Goods(page) => Ok(page),
            other => Err(unexpected_mock("goods", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Parse the configured base URL, making sure relative joins
/// extend its path rather than replace the last segment.
fn parse_base_url(catalog_url: &str) -> Result<Url, CatalogClientError> {
    let normalized = if catalog_url.ends_with('/') {
        catalog_url.to_string()
    } else {
        format!("{catalog_url}/")
    };
    Url::parse(&normalized).map_err(|source| CatalogClientError::InvalidUrl {
        url: catalog_url.to_string(),
        source,
    })
}

/// Build HTTP client with optional bearer token auth.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    if let Some(token) = &config.access_token {
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| CatalogClientError::Other(e.to_string()))?,
        );
    }

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        has_token = config.access_token.is_some(),
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
