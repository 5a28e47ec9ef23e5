mod browse;
mod categories;
mod facets;
mod sales;
mod search;

use std::fmt;
use std::num::NonZeroU32;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use indoc::indoc;
use storefront_catalog::types::ListingEndpoint;
use storefront_catalog::{Client, QueryString};
use storefront_sdk::providers::fetch::{FetchCoordinator, FetchStatus};
use storefront_sdk::providers::filter_store::FetchRequest;
use storefront_sdk::providers::pagination::PaginationController;
use tracing::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;
use crate::utils::listing::DisplayListing;
use crate::utils::message;

static STOREFRONT_DESCRIPTION: &'_ str = indoc! {"
    Browse the storefront catalog from the command line.

    Filter, sort and page through product listings
    and get a shareable address for every filtered view."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(STOREFRONT_DESCRIPTION))]
pub struct StorefrontCli(#[bpaf(external(storefront_args))] pub StorefrontArgs);

/// Main storefront args parser
///
/// To parse the storefront CLI, use [`StorefrontCli`] instead using [`storefront_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct StorefrontArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl StorefrontArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config)?;
        let limit = config.page_limit()?;
        debug!(catalog_url = %config.catalog_url, %limit, "running command");

        match self.command {
            Commands::Categories(args) => args.handle(client).await,
            Commands::Facets(args) => args.handle(client).await,
            Commands::Browse(args) => args.handle(client, limit).await,
            Commands::Sales(args) => args.handle(client, limit).await,
            Commands::Search(args) => args.handle(client, limit).await,
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// List category groups and their categories
    #[bpaf(command)]
    Categories(#[bpaf(external(categories::categories))] categories::Categories),

    /// Show the filters available in a category
    #[bpaf(command)]
    Facets(#[bpaf(external(facets::facets))] facets::Facets),

    /// Filter, sort and page through the products of a category
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),

    /// List products on sale across all categories
    #[bpaf(command)]
    Sales(#[bpaf(external(sales::sales))] sales::Sales),

    /// Search products across all categories
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

/// Print one page of a listing that spans all categories.
///
/// Shared by `sales` and `search`,
/// neither of which has facets or an address to keep.
async fn show_cross_category_listing(
    client: Client,
    limit: NonZeroU32,
    query: QueryString,
    page: Option<u32>,
    json: bool,
) -> Result<()> {
    let pagination =
        PaginationController::new(FetchCoordinator::new(client, ListingEndpoint::All, limit));
    pagination.load(FetchRequest::first_page(query)).await;
    if let Some(page) = page.filter(|page| *page != 1) {
        pagination.set_page(page).await;
    }

    let Some(listing) = pagination.listing() else {
        match pagination.status() {
            FetchStatus::Error(message) => bail!(message),
            status => bail!("no listing available ({status:?})"),
        }
    };
    if let FetchStatus::Error(message) = pagination.status() {
        message::warning(format!("Showing the previous page: {message}"));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        println!("{}", DisplayListing {
            listing: &listing,
            page: pagination.page_state(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbosity_before_command() {
        let args: &[&str] = &["-v", "-v", "categories"];
        let StorefrontCli(args) = storefront_cli().run_inner(args).unwrap();
        assert!(matches!(args.verbosity, Verbosity::Verbose(2)));
        assert!(matches!(args.command, Commands::Categories(_)));
    }

    #[test]
    fn quiet_flag() {
        let args: &[&str] = &["-q", "sales"];
        let StorefrontCli(args) = storefront_cli().run_inner(args).unwrap();
        assert!(matches!(args.verbosity, Verbosity::Quiet));
    }

    #[test]
    fn missing_command_is_rejected() {
        assert!(storefront_cli().run_inner(&[] as &[&str]).is_err());
    }
}
