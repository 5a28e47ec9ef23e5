use std::fmt::Display;

use itertools::Itertools;
use storefront_catalog::types::Product;
use storefront_sdk::providers::fetch::ListingPage;
use storefront_sdk::providers::pagination::PageState;

/// Human readable rendering of a listing page and its position.
pub(crate) struct DisplayListing<'a> {
    pub listing: &'a ListingPage,
    pub page: PageState,
}

impl Display for DisplayListing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.listing.items.is_empty() {
            return write!(f, "No products found.");
        }

        for product in &self.listing.items {
            writeln!(f, "{}", DisplayProduct(product))?;
        }
        writeln!(f)?;
        write!(
            f,
            "Page {} of {} ({} products)",
            self.page.page,
            self.page.total_pages.max(1),
            self.listing.count
        )?;

        if self.page.total_pages > 1 {
            let pages = (1..=self.page.total_pages)
                .map(|n| {
                    if n == self.page.page.get() {
                        format!("[{n}]")
                    } else {
                        n.to_string()
                    }
                })
                .join(" ");
            write!(f, "\n{pages}")?;
        }
        Ok(())
    }
}

struct DisplayProduct<'a>(&'a Product);

impl Display for DisplayProduct<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let product = self.0;
        write!(f, "{}  {}  ", product.slug, product.name)?;

        match &product.final_price {
            Some(final_price) if product.sale_percent > 0 => write!(
                f,
                "{final_price} (was {}, -{}%)",
                product.price, product.sale_percent
            )?,
            _ => write!(f, "{}", product.price)?,
        }

        if product.reviews_count > 0 {
            write!(
                f,
                "  ★ {:.1} ({} reviews)",
                product.final_rating, product.reviews_count
            )?;
        }
        if product.quantity == Some(0) {
            write!(f, "  out of stock")?;
        }
        Ok(())
    }
}
