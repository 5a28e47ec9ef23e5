//! Page navigation over a [FetchCoordinator].

use std::num::NonZeroU32;
use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};

use storefront_catalog::{ClientTrait, QueryString};
use tracing::debug;

use super::fetch::{FetchCoordinator, FetchOutcome, FetchStatus, ListingPage};
use super::filter_store::FetchRequest;

/// The page shown and the size of the listing.
///
/// `page` is always within `1..=max(total_pages, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page: NonZeroU32,
    pub total_pages: u32,
    pub limit: NonZeroU32,
}

impl PageState {
    fn new(limit: NonZeroU32) -> Self {
        Self {
            page: NonZeroU32::MIN,
            total_pages: 0,
            limit,
        }
    }

    /// Clamp `page` to the pages of the listing.
    pub fn clamp(&self, page: u32) -> NonZeroU32 {
        let last = self.total_pages.max(1);
        NonZeroU32::new(page.clamp(1, last)).unwrap_or(NonZeroU32::MIN)
    }
}

#[derive(Debug)]
struct Position {
    query: QueryString,
    page: PageState,
}

#[derive(Debug)]
pub struct PaginationController<C> {
    coordinator: FetchCoordinator<C>,
    position: Mutex<Position>,
}

impl<C: ClientTrait> PaginationController<C> {
    pub fn new(coordinator: FetchCoordinator<C>) -> Self {
        let page = PageState::new(coordinator.limit());
        Self {
            coordinator,
            position: Mutex::new(Position {
                query: QueryString::new(),
                page,
            }),
        }
    }

    pub fn coordinator(&self) -> &FetchCoordinator<C> {
        &self.coordinator
    }

    pub fn page_state(&self) -> PageState {
        self.lock_position().page
    }

    pub fn query(&self) -> QueryString {
        self.lock_position().query.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.coordinator.status()
    }

    /// The most recently applied page of the listing.
    pub fn listing(&self) -> Option<ListingPage> {
        self.coordinator.state().page
    }

    /// Switch to a new query.
    ///
    /// Requests committed by a filter store always ask for the first page.
    pub async fn load(&self, request: FetchRequest) -> FetchOutcome {
        let page = {
            let mut position = self.lock_position();
            position.query = request.query;
            position.page.page = request.page;
            position.page.page
        };
        self.fetch(page).await
    }

    /// Go to page `page` of the current query.
    ///
    /// Out of range pages are clamped to the first or last page.
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let page = {
            let mut position = self.lock_position();
            let clamped = position.page.clamp(page);
            if clamped.get() != page {
                debug!(requested = page, clamped = clamped.get(), "clamped page");
            }
            position.page.page = clamped;
            clamped
        };
        self.fetch(page).await
    }

    pub async fn next_page(&self) -> FetchOutcome {
        let current = self.page_state().page;
        self.set_page(current.get().saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> FetchOutcome {
        let current = self.page_state().page;
        self.set_page(current.get() - 1).await
    }

    /// Page controls are only shown for listings spanning several pages.
    pub fn is_visible(&self) -> bool {
        self.page_state().total_pages > 1
    }

    /// Every page of the listing, empty if there are no results.
    pub fn page_numbers(&self) -> RangeInclusive<u32> {
        1..=self.page_state().total_pages
    }

    /// Fetch `page` of the current query.
    ///
    /// If the listing turns out to end before `page`,
    /// the last page is fetched instead,
    /// so the shown items always belong to the page in [PageState].
    async fn fetch(&self, mut page: NonZeroU32) -> FetchOutcome {
        let query = self.query();
        loop {
            let outcome = self.coordinator.fetch(&query, page).await;
            let total_pages = match &outcome {
                FetchOutcome::Applied(listing) => listing.total_pages,
                _ => return outcome,
            };

            let clamped = {
                let mut position = self.lock_position();
                // a newer query was loaded meanwhile
                if position.query != query {
                    return outcome;
                }
                position.page.total_pages = total_pages;
                let clamped = position.page.clamp(page.get());
                position.page.page = clamped;
                clamped
            };
            if clamped == page {
                return outcome;
            }
            debug!(
                requested = page.get(),
                clamped = clamped.get(),
                "listing shrank, fetching its last page"
            );
            page = clamped;
        }
    }

    fn lock_position(&self) -> MutexGuard<'_, Position> {
        self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
