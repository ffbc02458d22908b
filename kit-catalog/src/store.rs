//! In-memory catalog store
//!
//! Concurrent map of products keyed by ID. The network core only needs the
//! kit-tier lookup, expressed as the [`ProductCatalog`] trait so callers can
//! substitute a remote catalog without touching the engines.

use crate::error::{CatalogError, Result};
use crate::types::{KitTier, Product};
use dashmap::DashMap;
use uuid::Uuid;

/// Read seam the enrollment engine consumes.
///
/// `kit_by_tier` must return only active, kit-flagged products; `None` maps
/// to the engine's kit-not-found failure.
pub trait ProductCatalog: Send + Sync {
    /// Resolve the active kit product for a tier
    fn kit_by_tier(&self, tier: KitTier) -> Option<Product>;

    /// Fetch a product by ID
    fn product(&self, id: Uuid) -> Option<Product>;
}

/// In-memory concurrent product store
#[derive(Debug, Default)]
pub struct CatalogStore {
    products: DashMap<Uuid, Product>,
}

impl CatalogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product
    pub fn upsert(&self, product: Product) -> Result<()> {
        if product.sku.trim().is_empty() {
            return Err(CatalogError::InvalidProduct("SKU must not be empty".to_string()));
        }

        // SKU uniqueness across other products
        let duplicate = self
            .products
            .iter()
            .any(|p| p.sku == product.sku && p.id != product.id);
        if duplicate {
            return Err(CatalogError::DuplicateSku(product.sku));
        }

        tracing::debug!(product_id = %product.id, sku = %product.sku, "Product upserted");
        self.products.insert(product.id, product);
        Ok(())
    }

    /// Number of registered products
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductCatalog for CatalogStore {
    fn kit_by_tier(&self, tier: KitTier) -> Option<Product> {
        self.products
            .iter()
            .find(|p| p.is_active_kit(tier))
            .map(|p| p.clone())
    }

    fn product(&self, id: Uuid) -> Option<Product> {
        self.products.get(&id).map(|p| p.clone())
    }
}
