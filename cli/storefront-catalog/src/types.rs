//! Catalog payload types.
//!
//! These are the schemas of the read-only endpoints this client consumes.
//! Payloads are validated when they are ingested so that the rest of the
//! program can rely on their shape.

use std::str::FromStr;

use derive_more::{AsRef, Deref, Display};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CatalogClientError;

pub type AttributeId = u64;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A category as addressed by the listing endpoints.
///
/// Resolved once where a route is entered and passed explicitly from there.
/// The backend matches categories by name, case-insensitively.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Deref,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct CategoryRef(String);

impl CategoryRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A category name that is empty or only whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("category name must not be empty")]
pub struct EmptyCategoryName;

impl FromStr for CategoryRef {
    type Err = EmptyCategoryName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(EmptyCategoryName);
        }
        Ok(Self::new(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: u64,
    pub name: String,
}

/// A top level group of categories as listed on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<CategorySummary>,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Identifies a facet kind, e.g. "Screen size".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: AttributeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeGroupRef {
    pub name: String,
}

/// One observed value of an attribute on some product of a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub attribute: AttributeDefinition,
    #[serde(default)]
    pub group: Option<AttributeGroupRef>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: u64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// A product as returned by the listing endpoints.
///
/// Prices are decimals serialized as strings by the backend
/// and are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub price: String,
    #[serde(default)]
    pub final_price: Option<String>,
    #[serde(default)]
    pub sale_percent: u32,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub final_rating: f64,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub count: u64,
    pub results: Vec<Product>,
}

/// Which listing endpoint to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingEndpoint {
    /// `/good/`, limited to products in stock.
    #[default]
    Scoped,
    /// `/good/all/`, bypasses the default scoping,
    /// used for listings spanning categories like sales and search.
    All,
}

impl ListingEndpoint {
    pub(crate) fn path(&self) -> &'static str {
        match self {
            ListingEndpoint::Scoped => "good/",
            ListingEndpoint::All => "good/all/",
        }
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Validate that `value` is a JSON array and deserialize each of its records.
///
/// A payload of any other shape is rejected instead of being treated as empty.
pub fn parse_sequence<T: DeserializeOwned>(
    what: &'static str,
    value: serde_json::Value,
) -> Result<Vec<T>, CatalogClientError> {
    let found = match &value {
        serde_json::Value::Array(_) => None,
        serde_json::Value::Null => Some("null"),
        serde_json::Value::Bool(_) => Some("a boolean"),
        serde_json::Value::Number(_) => Some("a number"),
        serde_json::Value::String(_) => Some("a string"),
        serde_json::Value::Object(_) => Some("an object"),
    };
    if let Some(found) = found {
        return Err(CatalogClientError::NotASequence { what, found });
    }

    serde_json::from_value(value)
        .map_err(|source| CatalogClientError::MalformedPayload { what, source })
}

/// Deserialize a single JSON record.
pub fn parse_record<T: DeserializeOwned>(
    what: &'static str,
    value: serde_json::Value,
) -> Result<T, CatalogClientError> {
    serde_json::from_value(value)
        .map_err(|source| CatalogClientError::MalformedPayload { what, source })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn attribute_values_accept_extra_fields_and_missing_group() {
        let payload = json!([
            {
                "id": 7,
                "attribute": {"id": 1, "name": "Screen size", "slug": "screen-size", "order": 0},
                "value": "55",
                "group": {"id": 3, "name": "Display", "slug": "display"}
            },
            {
                "id": 8,
                "attribute": {"id": 2, "name": "Color", "slug": null, "order": 1},
                "value": "black",
                "group": null
            }
        ]);

        let values: Vec<AttributeValue> = parse_sequence("attribute values", payload).unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(
            values[0].group,
            Some(AttributeGroupRef {
                name: "Display".to_string()
            })
        );
        assert_eq!(values[1].group, None);
        assert_eq!(values[1].attribute.name, "Color");
    }

    #[test]
    fn non_sequence_payload_is_rejected() {
        let err = parse_sequence::<Brand>("brands", json!({"detail": "nope"})).unwrap_err();
        assert!(
            matches!(err, CatalogClientError::NotASequence {
                what: "brands",
                found: "an object"
            }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn malformed_record_is_rejected() {
        let err = parse_sequence::<Brand>("brands", json!([{"id": "x"}])).unwrap_err();
        assert!(
            matches!(err, CatalogClientError::MalformedPayload { what: "brands", .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn product_defaults_optional_fields() {
        let product: Product = parse_record(
            "product",
            json!({"id": 1, "name": "TV", "slug": "tv", "price": "100.00"}),
        )
        .unwrap();

        assert_eq!(product.final_price, None);
        assert_eq!(product.reviews_count, 0);
        assert_eq!(product.sale_percent, 0);
    }

    #[test]
    fn category_ref_rejects_blank_names() {
        assert_eq!("  ".parse::<CategoryRef>(), Err(EmptyCategoryName));
        assert_eq!(
            EmptyCategoryName.to_string(),
            "category name must not be empty"
        );
        assert_eq!("TV ".parse::<CategoryRef>().unwrap().name(), "TV");
    }
}
