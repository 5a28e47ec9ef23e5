use anyhow::{Context, Result};
use bpaf::Bpaf;
use storefront_catalog::Client;
use storefront_catalog::types::CategoryRef;
use storefront_sdk::models::query::normalize_attribute_name;
use storefront_sdk::providers::session::load_facets;
use tracing::instrument;

// Show the filters available in a category
#[derive(Debug, Bpaf, Clone)]
pub struct Facets {
    /// The category to show filters for
    #[bpaf(positional("category"))]
    pub category: CategoryRef,
}

impl Facets {
    #[instrument(name = "facets", fields(category = %self.category), skip_all)]
    pub async fn handle(self, client: Client) -> Result<()> {
        let (taxonomy, brands) = load_facets(&client, &self.category)
            .await
            .with_context(|| format!("Could not load filters of '{}'", self.category))?;

        for (group, facets) in taxonomy.groups() {
            println!("{group}");
            for facet in facets {
                println!(
                    "  {} ({}): {}",
                    facet.name,
                    normalize_attribute_name(&facet.name),
                    facet.values.join(", ")
                );
            }
        }

        if !brands.is_empty() {
            println!("Brands");
            for brand in brands {
                println!("  {}", brand.name);
            }
        }
        Ok(())
    }
}
