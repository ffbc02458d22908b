//! Error types for the catalog

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// SKU already registered
    #[error("Duplicate SKU: {0}")]
    DuplicateSku(String),

    /// Invalid product definition
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
}
