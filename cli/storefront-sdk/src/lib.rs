//! The faceted filter engine of the storefront.
//!
//! [models] holds the pure data: the attribute taxonomy of a category,
//! the user's filter selection and its query string codec.
//! [providers] holds the stateful parts that drive a listing:
//! the filter store, the fetch coordinator, pagination
//! and the session that wires them to a catalog client and an address.

pub mod models;
pub mod providers;
pub mod utils;
