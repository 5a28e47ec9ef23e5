//! A mounted category listing.
//!
//! Mounting loads the facets of the category,
//! derives the selection from the address
//! and fetches the first page exactly once.
//! From then on committed changes and page moves go through the session.
//! Unmounting hands the address back to the caller.

use std::num::NonZeroU32;

use storefront_catalog::ClientTrait;
use storefront_catalog::types::{AttributeDefinition, AttributeId, Brand, CategoryRef, ListingEndpoint};
use tracing::{debug, instrument};

use super::address::AddressStore;
use super::fetch::{FetchCoordinator, FetchOutcome, FetchStatus, ListingPage};
use super::filter_store::FilterStore;
use super::pagination::{PageState, PaginationController};
use crate::models::query::normalize_attribute_name;
use crate::models::selection::{FilterSelection, Seed, SelectionError, SortOption};
use crate::models::taxonomy::{AttributeTaxonomy, TaxonomyLoadError};
use crate::utils::errors::display_chain;

/// The facets offered by a listing.
///
/// Failing to load them leaves the listing usable without facets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetsState {
    Loaded {
        taxonomy: AttributeTaxonomy,
        brands: Vec<Brand>,
    },
    Failed(String),
}

impl FacetsState {
    fn known_attributes(&self) -> Vec<AttributeDefinition> {
        match self {
            FacetsState::Loaded { taxonomy, .. } => taxonomy.known_attributes(),
            FacetsState::Failed(_) => Vec::new(),
        }
    }
}

/// Load the attribute taxonomy and brands of a category.
pub async fn load_facets(
    client: &impl ClientTrait,
    category: &CategoryRef,
) -> Result<(AttributeTaxonomy, Vec<Brand>), TaxonomyLoadError> {
    let values = client
        .attribute_values(category)
        .await
        .map_err(TaxonomyLoadError::AttributeValues)?;
    let taxonomy = AttributeTaxonomy::index(&values);
    let brands = client
        .brands(category)
        .await
        .map_err(TaxonomyLoadError::Brands)?;
    Ok((taxonomy, brands))
}

#[derive(Debug)]
pub struct CatalogSession<C, A> {
    store: FilterStore<A>,
    pagination: PaginationController<C>,
    facets: FacetsState,
}

impl<C: ClientTrait, A: AddressStore> CatalogSession<C, A> {
    #[instrument(skip_all, fields(category = %seed.category))]
    pub async fn mount(
        client: C,
        address: A,
        seed: Seed,
        endpoint: ListingEndpoint,
        limit: NonZeroU32,
    ) -> Self {
        let facets = match load_facets(&client, &seed.category).await {
            Ok((taxonomy, brands)) => FacetsState::Loaded { taxonomy, brands },
            Err(e) => {
                let message = display_chain(&e);
                debug!(%message, "continuing without facets");
                FacetsState::Failed(message)
            },
        };

        let inbound = address.read();
        let mut store = FilterStore::new(seed, facets.known_attributes(), address);
        store.hydrate(&inbound);

        let pagination = PaginationController::new(FetchCoordinator::new(client, endpoint, limit));
        pagination.load(store.request()).await;

        Self {
            store,
            pagination,
            facets,
        }
    }

    /// End the session and hand back the address.
    pub fn unmount(self) -> A {
        self.store.into_address()
    }

    pub fn facets(&self) -> &FacetsState {
        &self.facets
    }

    pub fn selection(&self) -> &FilterSelection {
        self.store.selection()
    }

    pub fn address(&self) -> &A {
        self.store.address()
    }

    pub fn pagination(&self) -> &PaginationController<C> {
        &self.pagination
    }

    pub fn page_state(&self) -> PageState {
        self.pagination.page_state()
    }

    pub fn status(&self) -> FetchStatus {
        self.pagination.status()
    }

    pub fn listing(&self) -> Option<ListingPage> {
        self.pagination.listing()
    }

    /// Look up an attribute of the category by its display or query name.
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        let key = normalize_attribute_name(name);
        self.store
            .known_attributes()
            .iter()
            .find(|attribute| normalize_attribute_name(&attribute.name) == key)
    }

    pub fn toggle_attribute_value(&mut self, attribute: AttributeId, value: &str) {
        self.store.toggle_attribute_value(attribute, value);
    }

    pub fn toggle_brand(&mut self, name: &str) {
        self.store.toggle_brand(name);
    }

    pub fn set_price_range(&mut self, min: &str, max: &str) -> Result<(), SelectionError> {
        self.store.set_price_range(min, max)
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.store.set_sort(sort);
    }

    pub fn set_search(&mut self, term: &str) {
        self.store.set_search(term);
    }

    /// Commit the selection and load its first page.
    pub async fn apply(&mut self) -> FetchOutcome {
        let request = self.store.apply();
        self.pagination.load(request).await
    }

    /// Restore the seeded selection and load its first page.
    pub async fn reset(&mut self) -> FetchOutcome {
        let request = self.store.reset();
        self.pagination.load(request).await
    }

    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        self.pagination.set_page(page).await
    }

    pub async fn next_page(&self) -> FetchOutcome {
        self.pagination.next_page().await
    }

    pub async fn previous_page(&self) -> FetchOutcome {
        self.pagination.previous_page().await
    }
}
