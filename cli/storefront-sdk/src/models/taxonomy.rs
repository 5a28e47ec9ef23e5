//! Grouping of raw attribute values into a renderable facet tree.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use storefront_catalog::CatalogClientError;
use storefront_catalog::types::{AttributeDefinition, AttributeId, AttributeValue, parse_sequence};
use thiserror::Error;

/// Group name used for attributes that don't belong to a group.
pub const FALLBACK_GROUP: &str = "Other";

#[derive(Debug, Error)]
pub enum TaxonomyLoadError {
    #[error("failed to load attribute values")]
    AttributeValues(#[source] CatalogClientError),
    #[error("failed to load brands")]
    Brands(#[source] CatalogClientError),
}

/// A filterable attribute with every value observed in the category.
///
/// `values` is deduplicated and sorted lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub id: AttributeId,
    pub name: String,
    pub values: Vec<String>,
}

/// Facets of a category grouped by attribute group.
///
/// Groups and the facets within a group keep the order
/// in which they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeTaxonomy {
    groups: IndexMap<String, Vec<Facet>>,
}

impl AttributeTaxonomy {
    /// Group a flat list of attribute values.
    pub fn index(values: &[AttributeValue]) -> Self {
        let mut grouped: IndexMap<&str, IndexMap<AttributeId, (&str, BTreeSet<&str>)>> =
            IndexMap::new();

        for record in values {
            let group_name = record
                .group
                .as_ref()
                .map(|group| group.name.as_str())
                .unwrap_or(FALLBACK_GROUP);

            let (_, observed) = grouped
                .entry(group_name)
                .or_default()
                .entry(record.attribute.id)
                .or_insert_with(|| (record.attribute.name.as_str(), BTreeSet::new()));
            observed.insert(record.value.as_str());
        }

        let groups = grouped
            .into_iter()
            .map(|(group_name, attributes)| {
                let facets = attributes
                    .into_iter()
                    .map(|(id, (name, observed))| Facet {
                        id,
                        name: name.to_string(),
                        values: observed.into_iter().map(String::from).collect(),
                    })
                    .collect();
                (group_name.to_string(), facets)
            })
            .collect();

        Self { groups }
    }

    /// Validate and group an attribute values payload.
    ///
    /// Fails if the payload is not a sequence of attribute value records.
    pub fn from_json(payload: serde_json::Value) -> Result<Self, TaxonomyLoadError> {
        let values: Vec<AttributeValue> = parse_sequence("attribute values", payload)
            .map_err(TaxonomyLoadError::AttributeValues)?;
        Ok(Self::index(&values))
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Facet])> {
        self.groups
            .iter()
            .map(|(name, facets)| (name.as_str(), facets.as_slice()))
    }

    pub fn group(&self, name: &str) -> Option<&[Facet]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn facets(&self) -> impl Iterator<Item = &Facet> {
        self.groups.values().flatten()
    }

    pub fn facet(&self, id: AttributeId) -> Option<&Facet> {
        self.facets().find(|facet| facet.id == id)
    }

    /// Attribute definitions in taxonomy order: groups first, then facets.
    pub fn known_attributes(&self) -> Vec<AttributeDefinition> {
        self.facets()
            .map(|facet| AttributeDefinition {
                id: facet.id,
                name: facet.name.clone(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
