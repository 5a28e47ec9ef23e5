use std::num::NonZeroU32;

use anyhow::Result;
use bpaf::Bpaf;
use storefront_catalog::{Client, QueryString};
use tracing::instrument;

use super::show_cross_category_listing;

const SALE_KEY: &str = "sale_percent";

// List products on sale across all categories
#[derive(Debug, Bpaf, Clone)]
pub struct Sales {
    /// Display the listing as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Page to show, out of range pages show the first or last page
    #[bpaf(long, argument("N"))]
    pub page: Option<u32>,
}

impl Sales {
    #[instrument(name = "sales", fields(page = self.page), skip_all)]
    pub async fn handle(self, client: Client, limit: NonZeroU32) -> Result<()> {
        let query = QueryString::new().with(SALE_KEY, "true");
        show_cross_category_listing(client, limit, query, self.page, self.json).await
    }
}
