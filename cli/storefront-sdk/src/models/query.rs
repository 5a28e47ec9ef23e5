//! Mapping between a [FilterSelection] and the query string
//! sent to listing endpoints and kept in the shareable address.
//!
//! Reserved keys map to fields of the selection directly.
//! Every other key names an attribute by its normalized name,
//! see [normalize_attribute_name].
//! Multi-valued selections are joined with commas in selection order.

use std::sync::LazyLock;

use indexmap::IndexSet;
use itertools::Itertools;
use regex::Regex;
use storefront_catalog::QueryString;
use storefront_catalog::types::{AttributeDefinition, CategoryRef};
use tracing::debug;

use super::selection::{FilterSelection, Seed, SortOption, validate_price};

pub const CATEGORY_KEY: &str = "category";
pub const SEARCH_KEY: &str = "search";
pub const MIN_PRICE_KEY: &str = "min_price";
pub const MAX_PRICE_KEY: &str = "max_price";
pub const BRAND_KEY: &str = "brand";
pub const SORT_KEY: &str = "sort";

pub const RESERVED_KEYS: [&str; 6] = [
    CATEGORY_KEY,
    SEARCH_KEY,
    MIN_PRICE_KEY,
    MAX_PRICE_KEY,
    BRAND_KEY,
    SORT_KEY,
];

const VALUE_SEPARATOR: &str = ",";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// The query key of an attribute:
/// lowercased, with every run of whitespace replaced by a single underscore.
///
/// ```
/// # use storefront_sdk::models::query::normalize_attribute_name;
/// assert_eq!(normalize_attribute_name("Screen  Size"), "screen_size");
/// ```
pub fn normalize_attribute_name(name: &str) -> String {
    WHITESPACE.replace_all(&name.to_lowercase(), "_").into_owned()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit the `category` key.
    ///
    /// The category is implied by the route of a listing
    /// but required by the scoped listing endpoint.
    pub include_category: bool,
}

impl EncodeOptions {
    pub fn with_category() -> Self {
        Self {
            include_category: true,
        }
    }
}

/// Encode a selection in canonical key order:
/// `category`, `search`, `min_price`, `max_price`, `brand`, `sort`,
/// then attributes in the order of `known_attributes`.
///
/// Empty fields are omitted.
/// Selections of attributes missing from `known_attributes` are not emitted,
/// neither are attributes whose normalized name is a reserved key.
pub fn encode(
    selection: &FilterSelection,
    known_attributes: &[AttributeDefinition],
    options: EncodeOptions,
) -> QueryString {
    let mut query = QueryString::new();

    if options.include_category {
        query.push(CATEGORY_KEY, selection.category.name());
    }
    if !selection.search.is_empty() {
        query.push(SEARCH_KEY, &selection.search);
    }
    if !selection.min_price.is_empty() {
        query.push(MIN_PRICE_KEY, &selection.min_price);
    }
    if !selection.max_price.is_empty() {
        query.push(MAX_PRICE_KEY, &selection.max_price);
    }
    if !selection.selected_brands.is_empty() {
        query.push(BRAND_KEY, join_values(&selection.selected_brands));
    }
    if let Some(sort) = selection.sort.wire_name() {
        query.push(SORT_KEY, sort);
    }

    for attribute in known_attributes {
        let Some(values) = selection.selected_attributes.get(&attribute.id) else {
            continue;
        };
        if values.is_empty() {
            continue;
        }
        let key = normalize_attribute_name(&attribute.name);
        if RESERVED_KEYS.contains(&key.as_str()) {
            debug!(
                %key,
                attribute = attribute.id,
                "not emitting attribute shadowed by a reserved key"
            );
            continue;
        }
        query.push(key, join_values(values));
    }

    query
}

/// Decode a query string into a selection for the listing described by `seed`.
///
/// Decoding is lenient:
/// keys that match neither a reserved key nor a known attribute,
/// unknown sort options and non-numeric prices are dropped.
/// Repeated `brand` keys accumulate, a repeated attribute key
/// replaces the values of the earlier one.
pub fn decode(
    query: &QueryString,
    known_attributes: &[AttributeDefinition],
    seed: &Seed,
) -> FilterSelection {
    let mut selection = FilterSelection::unselected(seed);

    for (key, value) in query.pairs() {
        match key {
            CATEGORY_KEY => match value.parse::<CategoryRef>() {
                Ok(category) => selection.category = category,
                Err(_) => debug!(key, "dropping empty category"),
            },
            SEARCH_KEY => selection.search = value.to_string(),
            MIN_PRICE_KEY => match validate_price(value) {
                Ok(price) => selection.min_price = price,
                Err(e) => debug!(key, value, error = %e, "dropping price"),
            },
            MAX_PRICE_KEY => match validate_price(value) {
                Ok(price) => selection.max_price = price,
                Err(e) => debug!(key, value, error = %e, "dropping price"),
            },
            BRAND_KEY => selection.selected_brands.extend(split_values(value)),
            SORT_KEY => match value.parse::<SortOption>() {
                Ok(sort) => selection.sort = sort,
                Err(e) => debug!(key, value, error = %e, "dropping sort option"),
            },
            _ => {
                let Some(attribute) = known_attributes
                    .iter()
                    .find(|attribute| normalize_attribute_name(&attribute.name) == key)
                else {
                    debug!(key, "dropping unknown filter key");
                    continue;
                };
                let values: IndexSet<String> = split_values(value).collect();
                if values.is_empty() {
                    selection.selected_attributes.shift_remove(&attribute.id);
                } else {
                    selection.selected_attributes.insert(attribute.id, values);
                }
            },
        }
    }

    selection
}

fn join_values<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values.into_iter().join(VALUE_SEPARATOR)
}

fn split_values(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(VALUE_SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(String::from)
}
