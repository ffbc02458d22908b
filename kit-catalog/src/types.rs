//! Catalog types
//!
//! Products carry exact-decimal pricing and volume figures. Kit products are
//! the tiered enrollment bundles; the tier is what enrollment requests name.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Enrollment kit tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KitTier {
    /// Entry kit
    Esp1,
    /// Mid kit
    Esp2,
    /// Top kit
    Esp3,
}

impl KitTier {
    /// Canonical tier code
    pub fn code(&self) -> &'static str {
        match self {
            KitTier::Esp1 => "ESP1",
            KitTier::Esp2 => "ESP2",
            KitTier::Esp3 => "ESP3",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ESP1" => Some(KitTier::Esp1),
            "ESP2" => Some(KitTier::Esp2),
            "ESP3" => Some(KitTier::Esp3),
            _ => None,
        }
    }
}

impl fmt::Display for KitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Product lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProductStatus {
    /// Sellable
    Active = 1,
    /// Temporarily unavailable
    Inactive = 2,
    /// Permanently removed from sale
    Discontinued = 3,
}

/// Settlement currency for catalog pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// US Dollar
    USD,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
        }
    }
}

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID
    pub id: Uuid,

    /// Stock keeping unit (unique)
    pub sku: String,

    /// Display name
    pub name: String,

    /// Description
    pub description: Option<String>,

    /// Category
    pub category: String,

    /// Retail price
    pub price_public: Decimal,

    /// Distributor price (what order items snapshot)
    pub price_distributor: Decimal,

    /// Pricing currency
    pub currency: Currency,

    /// Personal volume credited to the purchaser
    pub pv: Decimal,

    /// Business volume credited up the placement tree
    pub bv: Decimal,

    /// Whether this is an enrollment kit
    pub is_kit: bool,

    /// Kit tier (kits only)
    pub kit_tier: Option<KitTier>,

    /// Lifecycle status
    pub status: ProductStatus,

    /// ISO country codes this product sells in
    pub country_availability: Vec<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product resolves for a kit-tier lookup
    pub fn is_active_kit(&self, tier: KitTier) -> bool {
        self.is_kit && self.status == ProductStatus::Active && self.kit_tier == Some(tier)
    }
}

/// Immutable copy of a kit's commercial terms, captured at enrollment time.
///
/// Later catalog price changes must never alter historical order totals, so
/// the enrollment engine works from this value, not the live [`Product`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitSnapshot {
    /// Source product ID
    pub product_id: Uuid,

    /// SKU at purchase time
    pub sku: String,

    /// Name at purchase time
    pub name: String,

    /// Distributor unit price at purchase time
    pub unit_price: Decimal,

    /// PV at purchase time
    pub pv: Decimal,

    /// BV at purchase time
    pub bv: Decimal,
}

impl KitSnapshot {
    /// Capture a snapshot from the live product
    pub fn capture(product: &Product) -> Self {
        Self {
            product_id: product.id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price_distributor,
            pv: product.pv,
            bv: product.bv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kit(tier: KitTier, status: ProductStatus) -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: format!("KIT-{}", tier.code()),
            name: format!("Starter Kit {}", tier.code()),
            description: None,
            category: "kits".to_string(),
            price_public: Decimal::new(12000, 2),
            price_distributor: Decimal::new(9900, 2),
            currency: Currency::USD,
            pv: Decimal::new(5000, 2),
            bv: Decimal::new(30000, 2),
            is_kit: true,
            kit_tier: Some(tier),
            status,
            country_availability: vec!["SV".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_kit_tier_roundtrip() {
        assert_eq!(KitTier::from_str("ESP2"), Some(KitTier::Esp2));
        assert_eq!(KitTier::Esp3.code(), "ESP3");
        assert_eq!(KitTier::from_str("ESP9"), None);
    }

    #[test]
    fn test_is_active_kit() {
        let p = kit(KitTier::Esp1, ProductStatus::Active);
        assert!(p.is_active_kit(KitTier::Esp1));
        assert!(!p.is_active_kit(KitTier::Esp2));

        let inactive = kit(KitTier::Esp1, ProductStatus::Inactive);
        assert!(!inactive.is_active_kit(KitTier::Esp1));
    }

    #[test]
    fn test_snapshot_is_detached_from_product() {
        let mut p = kit(KitTier::Esp1, ProductStatus::Active);
        let snap = KitSnapshot::capture(&p);

        p.price_distributor = Decimal::new(1, 2);
        p.bv = Decimal::ZERO;

        assert_eq!(snap.unit_price, Decimal::new(9900, 2));
        assert_eq!(snap.bv, Decimal::new(30000, 2));
    }
}
