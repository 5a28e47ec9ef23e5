pub mod query;
pub mod selection;
pub mod taxonomy;
