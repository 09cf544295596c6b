//! Global resource catalog.

pub mod error;
pub mod service;

pub use error::CatalogError;
pub use service::{CatalogEntry, CatalogManager};
