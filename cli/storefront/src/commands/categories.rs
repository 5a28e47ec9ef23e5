use anyhow::{Context, Result};
use bpaf::Bpaf;
use storefront_catalog::{Client, ClientTrait};
use tracing::instrument;

use crate::utils::message;

// List category groups and their categories
#[derive(Debug, Bpaf, Clone)]
pub struct Categories {
    /// Display categories as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Categories {
    #[instrument(name = "categories", skip_all)]
    pub async fn handle(self, client: Client) -> Result<()> {
        let groups = client
            .category_groups()
            .await
            .context("Could not load categories")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&groups)?);
            return Ok(());
        }

        if groups.is_empty() {
            message::plain("No categories found.");
            return Ok(());
        }

        for group in groups {
            println!("{}", group.name);
            for category in group.categories {
                println!("  {}", category.name);
            }
        }
        Ok(())
    }
}
