use std::num::NonZeroU32;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use storefront_catalog::{Client, QueryString};
use storefront_sdk::models::query::SEARCH_KEY;
use tracing::instrument;

use super::show_cross_category_listing;

// Search products across all categories
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Display the listing as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Page to show, out of range pages show the first or last page
    #[bpaf(long, argument("N"))]
    pub page: Option<u32>,

    /// Text to search for in product names
    #[bpaf(positional("search-term"))]
    pub search_term: String,
}

impl Search {
    #[instrument(name = "search", fields(search_term = %self.search_term, page = self.page), skip_all)]
    pub async fn handle(self, client: Client, limit: NonZeroU32) -> Result<()> {
        let term = self.search_term.trim();
        if term.is_empty() {
            bail!("Search term must not be empty");
        }
        // ranking is left to the backend
        let query = QueryString::new().with(SEARCH_KEY, term);
        show_cross_category_listing(client, limit, query, self.page, self.json).await
    }
}
