//! The shareable address of a listing.
//!
//! A listing reads its initial filters from the address when it is mounted
//! and writes every committed change back to it.
//! The store is owned by the listing for as long as it is mounted
//! and handed back on unmount.

use storefront_catalog::QueryString;
use tracing::debug;

/// How a write affects the navigation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Overwrite the current entry.
    Replace,
    /// Add a new entry.
    Push,
}

/// Read and write access to the query part of an address.
pub trait AddressStore {
    fn read(&self) -> QueryString;

    fn write(&mut self, query: &QueryString, mode: HistoryMode);
}

/// An in-memory address with a navigation history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAddress {
    current: QueryString,
    history: Vec<QueryString>,
}

impl MemoryAddress {
    pub fn new(initial: QueryString) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    /// Earlier entries, oldest first.
    pub fn history(&self) -> &[QueryString] {
        &self.history
    }

    /// The address as it would be shared, e.g. `?category=TV&brand=lg`.
    pub fn shareable(&self) -> String {
        if self.current.is_empty() {
            String::new()
        } else {
            format!("?{}", self.current)
        }
    }
}

impl AddressStore for MemoryAddress {
    fn read(&self) -> QueryString {
        self.current.clone()
    }

    fn write(&mut self, query: &QueryString, mode: HistoryMode) {
        debug!(query = %query, ?mode, "writing address");
        if mode == HistoryMode::Push {
            let previous = std::mem::replace(&mut self.current, query.clone());
            self.history.push(previous);
        } else {
            self.current = query.clone();
        }
    }
}
