pub mod address;
pub mod fetch;
pub mod filter_store;
pub mod pagination;
pub mod session;
