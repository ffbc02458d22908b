//! GrowHub Kit Catalog
//!
//! Product catalog collaborator for the enrollment flow. The network core
//! reads kit products (price/PV/BV) through the [`ProductCatalog`] trait and
//! snapshots them onto order items at purchase time; it never writes back.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod store;
pub mod types;

pub use error::CatalogError;
pub use store::{CatalogStore, ProductCatalog};
pub use types::{Currency, KitSnapshot, KitTier, Product, ProductStatus};
