//! Mutations of a listing's [FilterSelection].
//!
//! Mutations only change the in-memory selection.
//! [FilterStore::apply] and [FilterStore::reset] commit it:
//! the encoded selection replaces the address
//! and a request for the first page is returned to the caller.

use std::num::NonZeroU32;

use storefront_catalog::QueryString;
use storefront_catalog::types::{AttributeDefinition, AttributeId};
use tracing::{debug, instrument};

use super::address::{AddressStore, HistoryMode};
use crate::models::query::{CATEGORY_KEY, EncodeOptions, decode, encode};
use crate::models::selection::{
    FilterSelection,
    SelectionError,
    Seed,
    SortOption,
    validate_price,
};

/// A listing query and the page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub query: QueryString,
    pub page: NonZeroU32,
}

impl FetchRequest {
    pub fn first_page(query: QueryString) -> Self {
        Self {
            query,
            page: NonZeroU32::MIN,
        }
    }
}

#[derive(Debug)]
pub struct FilterStore<A> {
    seed: Seed,
    known_attributes: Vec<AttributeDefinition>,
    selection: FilterSelection,
    address: A,
}

impl<A: AddressStore> FilterStore<A> {
    /// Create a store holding the seeded selection.
    ///
    /// `known_attributes` are the attributes of the seed category
    /// in taxonomy order.
    pub fn new(seed: Seed, known_attributes: Vec<AttributeDefinition>, address: A) -> Self {
        let selection = FilterSelection::seeded(&seed);
        Self {
            seed,
            known_attributes,
            selection,
            address,
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn known_attributes(&self) -> &[AttributeDefinition] {
        &self.known_attributes
    }

    pub fn address(&self) -> &A {
        &self.address
    }

    pub fn into_address(self) -> A {
        self.address
    }

    pub fn toggle_attribute_value(&mut self, attribute: AttributeId, value: &str) {
        self.selection.toggle_attribute_value(attribute, value);
    }

    pub fn toggle_brand(&mut self, name: &str) {
        self.selection.toggle_brand(name);
    }

    /// Replace both price bounds.
    ///
    /// Either bound may be empty.
    /// If one of them is not a number the selection is left untouched.
    pub fn set_price_range(&mut self, min: &str, max: &str) -> Result<(), SelectionError> {
        let min = validate_price(min)?;
        let max = validate_price(max)?;
        self.selection.min_price = min;
        self.selection.max_price = max;
        Ok(())
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.selection.sort = sort;
    }

    pub fn set_search(&mut self, term: &str) {
        self.selection.search = term.trim().to_string();
    }

    /// The current selection as sent to the listing endpoints.
    pub fn query(&self) -> QueryString {
        encode(
            &self.selection,
            &self.known_attributes,
            EncodeOptions::with_category(),
        )
    }

    /// Request the first page of the current selection
    /// without touching the address.
    pub fn request(&self) -> FetchRequest {
        FetchRequest::first_page(self.query())
    }

    /// Commit the current selection.
    #[instrument(skip_all, fields(category = %self.seed.category))]
    pub fn apply(&mut self) -> FetchRequest {
        self.commit()
    }

    /// Restore the seeded selection and commit it.
    #[instrument(skip_all, fields(category = %self.seed.category))]
    pub fn reset(&mut self) -> FetchRequest {
        self.selection = FilterSelection::seeded(&self.seed);
        self.commit()
    }

    /// Derive the selection from an inbound address.
    ///
    /// The category always stays the seed category.
    /// An address this store never wrote, i.e. one without a `category`
    /// key and without filters, keeps the seeded selection.
    /// Addresses written by [FilterStore::apply] decode as they are,
    /// so a deselected seed brand stays deselected.
    /// Nothing is fetched.
    #[instrument(skip_all, fields(category = %self.seed.category, address = %address))]
    pub fn hydrate(&mut self, address: &QueryString) {
        let mut decoded = decode(address, &self.known_attributes, &self.seed);
        if !address.contains_key(CATEGORY_KEY) && !decoded.has_filters() {
            debug!("address carries no selection, keeping seeded selection");
            self.selection = FilterSelection::seeded(&self.seed);
            return;
        }
        if decoded.category != self.seed.category {
            debug!(found = %decoded.category, "ignoring category of the address");
            decoded.category = self.seed.category.clone();
        }
        self.selection = decoded;
    }

    fn commit(&mut self) -> FetchRequest {
        let query = self.query();
        debug!(query = %query, "committing selection");
        self.address.write(&query, HistoryMode::Replace);
        FetchRequest::first_page(query)
    }
}
