//! The user's current choice of filters and sort order.

use std::fmt::Display;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use storefront_catalog::types::{AttributeId, CategoryRef};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid price '{0}': expected a non-negative number")]
    InvalidPrice(String),
    #[error("unknown sort option '{0}'")]
    UnknownSort(String),
}

/// Values supplied by the route that hosts a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub category: CategoryRef,
    /// Brand preselected by a brand page.
    pub brand: Option<String>,
}

impl Seed {
    pub fn new(category: CategoryRef) -> Self {
        Self {
            category,
            brand: None,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOption {
    #[default]
    None,
    PriceAsc,
    PriceDesc,
    Popularity,
}

impl SortOption {
    /// The value sent as `sort=`, [None] for the default order.
    pub fn wire_name(&self) -> Option<&'static str> {
        match self {
            SortOption::None => None,
            SortOption::PriceAsc => Some("price_asc"),
            SortOption::PriceDesc => Some("price_desc"),
            SortOption::Popularity => Some("popularity"),
        }
    }
}

impl Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name().unwrap_or("none"))
    }
}

impl FromStr for SortOption {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "" => Ok(SortOption::None),
            "price_asc" => Ok(SortOption::PriceAsc),
            "price_desc" => Ok(SortOption::PriceDesc),
            "popularity" => Ok(SortOption::Popularity),
            other => Err(SelectionError::UnknownSort(other.to_string())),
        }
    }
}

/// Check that a price bound is empty or a non-negative number.
///
/// Returns the trimmed input, which is what gets stored and encoded.
pub fn validate_price(input: &str) -> Result<String, SelectionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(trimmed.to_string()),
        _ => Err(SelectionError::InvalidPrice(input.to_string())),
    }
}

/// What the user has chosen on a listing.
///
/// `selected_attributes` never holds an empty set:
/// removing the last value of an attribute removes the attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub category: CategoryRef,
    /// Seed brand of the hosting route, kept for [FilterSelection::seeded].
    pub brand: Option<String>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub selected_attributes: IndexMap<AttributeId, IndexSet<String>>,
    pub selected_brands: IndexSet<String>,
    pub sort: SortOption,
}

impl FilterSelection {
    /// The selection of a freshly mounted listing.
    ///
    /// The seed brand, if any, starts out selected.
    pub fn seeded(seed: &Seed) -> Self {
        let mut selection = Self::unselected(seed);
        selection.selected_brands.extend(seed.brand.iter().cloned());
        selection
    }

    /// Seed fields only, nothing selected.
    pub fn unselected(seed: &Seed) -> Self {
        Self {
            category: seed.category.clone(),
            brand: seed.brand.clone(),
            search: String::new(),
            min_price: String::new(),
            max_price: String::new(),
            selected_attributes: IndexMap::new(),
            selected_brands: IndexSet::new(),
            sort: SortOption::None,
        }
    }

    /// Select `value` for `attribute` or deselect it if it was selected.
    pub fn toggle_attribute_value(&mut self, attribute: AttributeId, value: &str) {
        let values = self.selected_attributes.entry(attribute).or_default();
        if !values.shift_remove(value) {
            values.insert(value.to_string());
        }
        if values.is_empty() {
            self.selected_attributes.shift_remove(&attribute);
        }
    }

    pub fn toggle_brand(&mut self, name: &str) {
        if !self.selected_brands.shift_remove(name) {
            self.selected_brands.insert(name.to_string());
        }
    }

    pub fn is_selected(&self, attribute: AttributeId, value: &str) -> bool {
        self.selected_attributes
            .get(&attribute)
            .is_some_and(|values| values.contains(value))
    }

    /// Whether anything beyond the seed category is chosen.
    pub fn has_filters(&self) -> bool {
        !self.search.is_empty()
            || !self.min_price.is_empty()
            || !self.max_price.is_empty()
            || !self.selected_attributes.is_empty()
            || !self.selected_brands.is_empty()
            || self.sort != SortOption::None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn seed() -> Seed {
        Seed::new(CategoryRef::new("TV"))
    }

    #[test]
    fn toggle_attribute_value_twice_restores_selection() {
        let mut selection = FilterSelection::seeded(&seed());
        selection.toggle_attribute_value(1, "42");
        let before = selection.clone();

        selection.toggle_attribute_value(1, "55");
        selection.toggle_attribute_value(1, "55");

        assert_eq!(selection, before);
    }

    #[test]
    fn deselecting_last_value_prunes_attribute() {
        let mut selection = FilterSelection::seeded(&seed());
        selection.toggle_attribute_value(1, "55");
        assert!(selection.is_selected(1, "55"));

        selection.toggle_attribute_value(1, "55");
        assert!(!selection.selected_attributes.contains_key(&1));
        assert!(!selection.has_filters());
    }

    #[test]
    fn seed_brand_starts_selected() {
        let seed = seed().with_brand("lg");
        assert_eq!(
            FilterSelection::seeded(&seed).selected_brands,
            IndexSet::from(["lg".to_string()])
        );
        assert!(FilterSelection::unselected(&seed).selected_brands.is_empty());
    }

    #[test]
    fn prices_must_be_numeric_or_empty() {
        assert_eq!(validate_price(" 100 "), Ok("100".to_string()));
        assert_eq!(validate_price("99.5"), Ok("99.5".to_string()));
        assert_eq!(validate_price(""), Ok(String::new()));
        assert_eq!(
            validate_price("cheap"),
            Err(SelectionError::InvalidPrice("cheap".to_string()))
        );
        assert!(validate_price("-1").is_err());
        assert!(validate_price("NaN").is_err());
    }

    #[test]
    fn sort_option_wire_names() {
        for option in [
            SortOption::None,
            SortOption::PriceAsc,
            SortOption::PriceDesc,
            SortOption::Popularity,
        ] {
            assert_eq!(option.to_string().parse::<SortOption>(), Ok(option));
        }
        assert_eq!(
            "rating".parse::<SortOption>(),
            Err(SelectionError::UnknownSort("rating".to_string()))
        );
    }
}
