//! Fetching listing pages.
//!
//! Fetches may overlap, e.g. when a filter is applied while the previous
//! page is still loading. Every fetch is tagged with a sequence number and
//! only the response of the most recently issued fetch is applied.
//! Older responses are dropped when they arrive.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use storefront_catalog::types::{ListingEndpoint, Product, ProductPage};
use storefront_catalog::{CatalogClientError, ClientTrait, QueryString};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::utils::errors::display_chain;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to load products")]
    Catalog(#[source] CatalogClientError),
}

/// Number of pages needed to show `count` items, `limit` per page.
pub fn total_pages(count: u64, limit: NonZeroU32) -> u32 {
    let pages = count.div_ceil(u64::from(limit.get()));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// A page of products together with the size of the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub items: Vec<Product>,
    pub count: u64,
    pub total_pages: u32,
}

impl ListingPage {
    pub fn new(page: ProductPage, limit: NonZeroU32) -> Self {
        Self {
            total_pages: total_pages(page.count, limit),
            count: page.count,
            items: page.results,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The latest fetch failed, the message is meant for display.
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    pub status: FetchStatus,
    /// The most recently applied page.
    ///
    /// Kept when a later fetch fails.
    pub page: Option<ListingPage>,
    /// Sequence number of the latest issued fetch.
    pub sequence: u64,
}

/// What became of a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied(ListingPage),
    Failed(String),
    /// A newer fetch was issued before this one completed.
    Superseded { sequence: u64 },
}

#[derive(Debug)]
pub struct FetchCoordinator<C> {
    client: C,
    endpoint: ListingEndpoint,
    limit: NonZeroU32,
    issued: AtomicU64,
    state: Mutex<FetchState>,
}

impl<C: ClientTrait> FetchCoordinator<C> {
    pub fn new(client: C, endpoint: ListingEndpoint, limit: NonZeroU32) -> Self {
        Self {
            client,
            endpoint,
            limit,
            issued: AtomicU64::new(0),
            state: Mutex::new(FetchState::default()),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn endpoint(&self) -> ListingEndpoint {
        self.endpoint
    }

    pub fn limit(&self) -> NonZeroU32 {
        self.limit
    }

    pub fn state(&self) -> FetchState {
        self.lock_state().clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.lock_state().status.clone()
    }

    /// Fetch one page of the listing described by `query`.
    ///
    /// Errors are captured in the state, the previous page is kept.
    #[instrument(skip_all, fields(query = %query, page = %page))]
    pub async fn fetch(&self, query: &QueryString, page: NonZeroU32) -> FetchOutcome {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock_state();
            state.status = FetchStatus::Loading;
            state.sequence = sequence;
        }
        debug!(sequence, "issued fetch");

        let result = self
            .client
            .list_goods(self.endpoint, query, page, self.limit)
            .await;

        let mut state = self.lock_state();
        let latest = self.issued.load(Ordering::SeqCst);
        if sequence != latest {
            debug!(sequence, latest, "discarding stale response");
            return FetchOutcome::Superseded { sequence };
        }

        match result {
            Ok(product_page) => {
                let listing = ListingPage::new(product_page, self.limit);
                debug!(
                    sequence,
                    count = listing.count,
                    total_pages = listing.total_pages,
                    "applied response"
                );
                state.status = FetchStatus::Ready;
                state.page = Some(listing.clone());
                FetchOutcome::Applied(listing)
            },
            Err(e) => {
                let message = display_chain(&FetchError::Catalog(e));
                debug!(sequence, %message, "fetch failed");
                state.status = FetchStatus::Error(message.clone());
                FetchOutcome::Failed(message)
            },
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use futures::channel::oneshot;
    use pretty_assertions::assert_eq;
    use storefront_catalog::MockClient;
    use storefront_catalog::types::{AttributeValue, Brand, CategoryGroup, CategoryRef};

    use super::*;

    pub(crate) fn limit(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    pub(crate) fn product(id: u64) -> Product {
        Product {
            id,
            name: format!("product {id}"),
            slug: format!("product-{id}"),
            price: "100.00".to_string(),
            final_price: None,
            sale_percent: 0,
            quantity: Some(1),
            image: None,
            final_rating: 0.0,
            reviews_count: 0,
            category_name: Some("TV".to_string()),
            brand_name: None,
        }
    }

    pub(crate) fn product_page(count: u64, ids: &[u64]) -> ProductPage {
        ProductPage {
            count,
            results: ids.iter().copied().map(product).collect(),
        }
    }

    /// A client whose listing responses are released by the test.
    ///
    /// Each `list_goods` call takes the next gate in call order.
    struct GatedClient {
        gates: Mutex<VecDeque<oneshot::Receiver<ProductPage>>>,
    }

    impl GatedClient {
        fn new(gates: impl IntoIterator<Item = oneshot::Receiver<ProductPage>>) -> Self {
            Self {
                gates: Mutex::new(gates.into_iter().collect()),
            }
        }
    }

    impl ClientTrait for GatedClient {
        async fn attribute_values(
            &self,
            _category: &CategoryRef,
        ) -> Result<Vec<AttributeValue>, CatalogClientError> {
            unimplemented!()
        }

        async fn brands(&self, _category: &CategoryRef) -> Result<Vec<Brand>, CatalogClientError> {
            unimplemented!()
        }

        async fn category_groups(&self) -> Result<Vec<CategoryGroup>, CatalogClientError> {
            unimplemented!()
        }

        async fn list_goods(
            &self,
            _endpoint: ListingEndpoint,
            _query: &QueryString,
            _page: NonZeroU32,
            _limit: NonZeroU32,
        ) -> Result<ProductPage, CatalogClientError> {
            let gate = self.gates.lock().unwrap().pop_front().expect("no gate left");
            gate.await
                .map_err(|_| CatalogClientError::Other("gate dropped".to_string()))
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, limit(25)), 0);
        assert_eq!(total_pages(25, limit(25)), 1);
        assert_eq!(total_pages(26, limit(25)), 2);
        assert_eq!(total_pages(1, limit(100)), 1);
    }

    #[tokio::test]
    async fn applied_response_updates_state() {
        let client = MockClient::new();
        client.push_goods_response(product_page(26, &[1, 2]));
        let coordinator = FetchCoordinator::new(client, ListingEndpoint::Scoped, limit(25));
        assert_eq!(coordinator.status(), FetchStatus::Idle);

        let outcome = coordinator
            .fetch(&QueryString::new().with("category", "TV"), NonZeroU32::MIN)
            .await;

        let expected = ListingPage::new(product_page(26, &[1, 2]), limit(25));
        assert_eq!(expected.total_pages, 2);
        assert_eq!(outcome, FetchOutcome::Applied(expected.clone()));
        assert_eq!(coordinator.state(), FetchState {
            status: FetchStatus::Ready,
            page: Some(expected),
            sequence: 1,
        });
    }

    #[tokio::test]
    async fn error_keeps_previous_page() {
        let client = MockClient::new();
        client.push_goods_response(product_page(3, &[1, 2, 3]));
        client.push_error_response(500, "boom");
        let coordinator = FetchCoordinator::new(client, ListingEndpoint::Scoped, limit(25));

        coordinator.fetch(&QueryString::new(), NonZeroU32::MIN).await;
        let outcome = coordinator.fetch(&QueryString::new(), NonZeroU32::MIN).await;

        let message = "failed to load products: 500 Internal Server Error: boom".to_string();
        assert_eq!(outcome, FetchOutcome::Failed(message.clone()));
        let state = coordinator.state();
        assert_eq!(state.status, FetchStatus::Error(message));
        assert_eq!(state.page.map(|page| page.count), Some(3));
    }

    /// The earlier fetch resolves after the later one and must not win.
    #[tokio::test]
    async fn late_response_of_earlier_fetch_is_discarded() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let coordinator = FetchCoordinator::new(
            GatedClient::new([rx_a, rx_b]),
            ListingEndpoint::Scoped,
            limit(25),
        );
        let query_a = QueryString::new().with("brand", "lg");
        let query_b = QueryString::new().with("brand", "sony");

        // polled first, so it takes the first gate and stays pending
        let first = coordinator.fetch(&query_a, NonZeroU32::MIN);
        let second = async {
            tx_b.send(product_page(30, &[7])).unwrap();
            let outcome = coordinator.fetch(&query_b, NonZeroU32::MIN).await;
            tx_a.send(product_page(1, &[1])).unwrap();
            outcome
        };
        let (first, second) = futures::join!(first, second);

        let expected = ListingPage::new(product_page(30, &[7]), limit(25));
        assert_eq!(first, FetchOutcome::Superseded { sequence: 1 });
        assert_eq!(second, FetchOutcome::Applied(expected.clone()));
        assert_eq!(coordinator.state(), FetchState {
            status: FetchStatus::Ready,
            page: Some(expected),
            sequence: 2,
        });
    }

    #[tokio::test]
    async fn failure_of_superseded_fetch_is_ignored() {
        let (tx_a, rx_a) = oneshot::channel::<ProductPage>();
        let (tx_b, rx_b) = oneshot::channel();
        let coordinator = FetchCoordinator::new(
            GatedClient::new([rx_a, rx_b]),
            ListingEndpoint::All,
            limit(10),
        );

        let query = QueryString::new();

        let first = coordinator.fetch(&query, NonZeroU32::MIN);
        let second = async {
            tx_b.send(product_page(0, &[])).unwrap();
            let outcome = coordinator.fetch(&query, NonZeroU32::MIN).await;
            drop(tx_a);
            outcome
        };
        let (first, _) = futures::join!(first, second);

        assert_eq!(first, FetchOutcome::Superseded { sequence: 1 });
        assert_eq!(coordinator.status(), FetchStatus::Ready);
        assert_eq!(coordinator.state().page.map(|page| page.total_pages), Some(0));
    }
}
