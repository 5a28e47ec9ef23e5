use std::num::NonZeroU32;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use bpaf::Bpaf;
use serde_json::json;
use storefront_catalog::types::{CategoryRef, ListingEndpoint};
use storefront_catalog::{Client, QueryString};
use storefront_sdk::models::selection::{Seed, SortOption};
use storefront_sdk::providers::address::MemoryAddress;
use storefront_sdk::providers::fetch::{FetchStatus, ListingPage};
use storefront_sdk::providers::pagination::PageState;
use storefront_sdk::providers::session::{CatalogSession, FacetsState};
use tracing::{debug, instrument};

use crate::utils::listing::DisplayListing;
use crate::utils::message;

/// An attribute value given as `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub name: String,
    pub value: String,
}

impl FromStr for AttributeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, value)) = s.split_once('=') else {
            return Err(format!("expected NAME=VALUE, found '{s}'"));
        };
        if name.trim().is_empty() || value.is_empty() {
            return Err(format!("expected NAME=VALUE, found '{s}'"));
        }
        Ok(Self {
            name: name.trim().to_string(),
            value: value.to_string(),
        })
    }
}

// Filter, sort and page through the products of a category
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// Display the listing as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Include products that are out of stock
    #[bpaf(long)]
    pub all: bool,

    /// Brand of the brand page the listing is opened from
    #[bpaf(long, argument("BRAND"))]
    pub brand: Option<String>,

    /// Open a shared address, e.g. '?brand=lg&screen_size=55'
    #[bpaf(long, argument("QUERY"))]
    pub address: Option<String>,

    /// Restore the default filters before applying changes
    #[bpaf(long)]
    pub reset: bool,

    /// Toggle an attribute value, may be repeated
    #[bpaf(long("attr"), argument("NAME=VALUE"))]
    pub attributes: Vec<AttributeFilter>,

    /// Toggle a brand, may be repeated
    #[bpaf(long("pick-brand"), argument("BRAND"))]
    pub pick_brands: Vec<String>,

    /// Lowest price to show
    #[bpaf(long("min-price"), argument("PRICE"))]
    pub min_price: Option<String>,

    /// Highest price to show
    #[bpaf(long("max-price"), argument("PRICE"))]
    pub max_price: Option<String>,

    /// Sort order: none, price_asc, price_desc or popularity
    #[bpaf(long, argument("SORT"))]
    pub sort: Option<SortOption>,

    /// Only show products matching a text
    #[bpaf(long, argument("TEXT"))]
    pub search: Option<String>,

    /// Page to show, out of range pages show the first or last page
    #[bpaf(long, argument("N"))]
    pub page: Option<u32>,

    /// The category to browse
    #[bpaf(positional("category"))]
    pub category: CategoryRef,
}

/// What a `browse` run ends up showing.
#[derive(Debug)]
pub(crate) struct BrowseResult {
    pub listing: Option<ListingPage>,
    pub status: FetchStatus,
    pub page: PageState,
    pub address: String,
}

impl Browse {
    #[instrument(name = "browse", fields(category = %self.category), skip_all)]
    pub async fn handle(self, client: Client, limit: NonZeroU32) -> Result<()> {
        let json = self.json;
        let result = self.run(client, limit).await?;

        let Some(listing) = &result.listing else {
            match result.status {
                FetchStatus::Error(message) => bail!(message),
                status => bail!("no listing available ({status:?})"),
            }
        };
        if let FetchStatus::Error(message) = &result.status {
            message::warning(format!("Showing the previous results: {message}"));
        }

        if json {
            let output = json!({
                "address": result.address,
                "page": result.page.page.get(),
                "total_pages": result.page.total_pages,
                "listing": listing,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", DisplayListing {
                listing,
                page: result.page,
            });
            message::plain(format!("Address: {}", result.address));
        }
        Ok(())
    }

    /// Mount a session, apply the requested changes and move to the requested page.
    pub(crate) async fn run(self, client: Client, limit: NonZeroU32) -> Result<BrowseResult> {
        let endpoint = if self.all {
            ListingEndpoint::All
        } else {
            ListingEndpoint::Scoped
        };
        let seed = Seed {
            category: self.category.clone(),
            brand: self.brand.clone(),
        };
        let address = MemoryAddress::new(
            self.address
                .as_deref()
                .map(QueryString::parse)
                .unwrap_or_default(),
        );

        let mut session = CatalogSession::mount(client, address, seed, endpoint, limit).await;
        if let FacetsState::Failed(message) = session.facets() {
            message::warning(format!("Filters are unavailable: {message}"));
        }

        if self.reset {
            session.reset().await;
        }
        if self.change_selection(&mut session)? {
            session.apply().await;
        } else {
            debug!("no filter changes requested");
        }
        if let Some(page) = self.page.filter(|page| *page != 1) {
            session.set_page(page).await;
        }

        Ok(BrowseResult {
            listing: session.listing(),
            status: session.status(),
            page: session.page_state(),
            address: session.address().shareable(),
        })
    }

    /// Returns whether anything was changed.
    fn change_selection(&self, session: &mut CatalogSession<Client, MemoryAddress>) -> Result<bool> {
        let mut changed = false;

        for filter in &self.attributes {
            let attribute = session.find_attribute(&filter.name).ok_or_else(|| {
                anyhow!(
                    "Unknown filter '{name}' for category '{category}'.\n\
                     Run 'storefront facets {category}' to list the filters.",
                    name = filter.name,
                    category = self.category
                )
            })?;
            let id = attribute.id;
            session.toggle_attribute_value(id, &filter.value);
            changed = true;
        }

        for brand in &self.pick_brands {
            session.toggle_brand(brand);
            changed = true;
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            let selection = session.selection();
            let min = self
                .min_price
                .clone()
                .unwrap_or_else(|| selection.min_price.clone());
            let max = self
                .max_price
                .clone()
                .unwrap_or_else(|| selection.max_price.clone());
            session.set_price_range(&min, &max)?;
            changed = true;
        }

        if let Some(sort) = self.sort {
            session.set_sort(sort);
            changed = true;
        }

        if let Some(search) = &self.search {
            session.set_search(search);
            changed = true;
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use bpaf::Parser;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use storefront_catalog::{MockClient, MockResponse};

    use super::*;

    fn browse_args(args: &[&str]) -> Browse {
        browse().to_options().run_inner(args).unwrap()
    }

    fn mock_client() -> MockClient {
        let responses: Vec<MockResponse> = serde_json::from_value(json!([
            {"attribute_values": [
                {"attribute": {"id": 1, "name": "Screen size"}, "group": {"name": "Display"}, "value": "55"},
                {"attribute": {"id": 1, "name": "Screen size"}, "group": {"name": "Display"}, "value": "42"}
            ]},
            {"brands": [{"id": 1, "name": "lg"}, {"id": 2, "name": "sony"}]}
        ]))
        .unwrap();
        let client = MockClient::new();
        for response in responses {
            client.push_response(response);
        }
        client
    }

    fn goods(count: u64) -> MockResponse {
        serde_json::from_value(json!({"goods": {"count": count, "results": [
            {"id": 1, "name": "TV", "slug": "tv", "price": "100.00"}
        ]}}))
        .unwrap()
    }

    #[test]
    fn attribute_filter_parses_name_and_value() {
        assert_eq!(
            "Screen size=55".parse::<AttributeFilter>(),
            Ok(AttributeFilter {
                name: "Screen size".to_string(),
                value: "55".to_string(),
            })
        );
        assert!("55".parse::<AttributeFilter>().is_err());
        assert!("=55".parse::<AttributeFilter>().is_err());
        assert!("size=".parse::<AttributeFilter>().is_err());
    }

    #[test]
    fn parses_repeated_filters() {
        let args = browse_args(&[
            "--attr",
            "screen_size=55",
            "--attr",
            "screen_size=42",
            "--pick-brand",
            "lg",
            "--sort",
            "price_asc",
            "TV",
        ]);
        assert_eq!(args.attributes.len(), 2);
        assert_eq!(args.pick_brands, vec!["lg".to_string()]);
        assert_eq!(args.sort, Some(SortOption::PriceAsc));
        assert_eq!(args.category, CategoryRef::new("TV"));
    }

    #[test]
    fn rejects_unknown_sort() {
        let args: &[&str] = &["--sort", "rating", "TV"];
        assert!(browse().to_options().run_inner(args).is_err());
    }

    #[tokio::test]
    async fn applies_filters_and_moves_to_page() {
        let client = mock_client();
        client.push_response(goods(10));
        client.push_response(goods(60));
        client.push_response(goods(60));

        let args = browse_args(&[
            "--address",
            "?screen_size=42&foo=bar",
            "--attr",
            "Screen size=55",
            "--pick-brand",
            "lg",
            "--min-price",
            "100",
            "--page",
            "9",
            "TV",
        ]);
        let result = args
            .run(client.clone().into(), NonZeroU32::new(25).unwrap())
            .await
            .unwrap();

        assert_eq!(client.remaining(), 0);
        assert_eq!(
            result.address,
            "?category=TV&min_price=100&brand=lg&screen_size=42%2C55"
        );
        assert_eq!(result.page.page.get(), 3);
        assert_eq!(result.page.total_pages, 3);
        assert_eq!(result.status, FetchStatus::Ready);
    }

    #[tokio::test]
    async fn unknown_attribute_is_an_error() {
        let client = mock_client();
        client.push_response(goods(1));

        let args = browse_args(&["--attr", "weight=5kg", "TV"]);
        let err = args
            .run(client.into(), NonZeroU32::new(25).unwrap())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Unknown filter 'weight'"));
    }

    #[tokio::test]
    async fn without_changes_only_the_mount_fetch_is_made() {
        let client = mock_client();
        client.push_response(goods(1));

        let args = browse_args(&["--brand", "lg", "TV"]);
        let result = args
            .run(client.clone().into(), NonZeroU32::new(25).unwrap())
            .await
            .unwrap();

        assert_eq!(client.remaining(), 0);
        // the address is only written when filters are applied
        assert_eq!(result.address, "");
        assert_eq!(result.listing.map(|listing| listing.count), Some(1));
    }
}
