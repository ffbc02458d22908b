//! Core types for the placement ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money and volume)
//!
//! Tree relations are held as IDs into the store, never as live object
//! references, so the parent/sponsor self-relations cannot form cycles in
//! memory.

use chrono::{DateTime, NaiveDate, Utc};
use kit_catalog::KitTier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Affiliate code (`GH-{COUNTRY}-{SEQ:06}`), unique per network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffiliateCode(String);

impl AffiliateCode {
    /// Build a code from country and sequence number
    pub fn new(country_code: &str, sequence: u64) -> Self {
        Self(format!("GH-{}-{:06}", country_code.to_uppercase(), sequence))
    }

    /// Wrap an existing code string
    pub fn from_string(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the country segment (`GH-SV-000001` -> `SV`)
    pub fn country_code(&self) -> Option<&str> {
        self.0.split('-').nth(1)
    }
}

impl fmt::Display for AffiliateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order number (`ORD-{YYYYMMDD}-{SEQ:04}`)
///
/// The sequence comes from a single global counter; the date segment is
/// purely cosmetic and does not reset the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Build an order number from a timestamp and sequence number
    pub fn new(at: DateTime<Utc>, sequence: u64) -> Self {
        Self(format!("ORD-{}-{:04}", at.format("%Y%m%d"), sequence))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of a parent's binary subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlacementSide {
    /// Left leg
    Left = 1,
    /// Right leg
    Right = 2,
}

impl PlacementSide {
    /// Canonical lowercase name
    pub fn code(&self) -> &'static str {
        match self {
            PlacementSide::Left => "left",
            PlacementSide::Right => "right",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "left" => Some(PlacementSide::Left),
            "right" => Some(PlacementSide::Right),
            _ => None,
        }
    }

    /// Single byte used in index keys
    pub fn key_byte(&self) -> u8 {
        match self {
            PlacementSide::Left => b'L',
            PlacementSide::Right => b'R',
        }
    }
}

impl fmt::Display for PlacementSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Affiliate lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AffiliateStatus {
    /// Enrolled, kit not yet paid
    Pending = 1,
    /// Kit paid, in good standing
    Active = 2,
    /// Lapsed
    Inactive = 3,
    /// Administratively suspended
    Suspended = 4,
    /// Cancelled membership
    Cancelled = 5,
}

impl AffiliateStatus {
    /// Canonical lowercase name
    pub fn code(&self) -> &'static str {
        match self {
            AffiliateStatus::Pending => "pending",
            AffiliateStatus::Active => "active",
            AffiliateStatus::Inactive => "inactive",
            AffiliateStatus::Suspended => "suspended",
            AffiliateStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AffiliateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One node of the binary placement tree, one per enrolled distributor.
///
/// `sponsor_id` records who recruited the affiliate and is informational;
/// `placement_parent_id` + `placement_side` define the tree position and
/// drive BV accrual. The two relations may diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateNode {
    /// Unique affiliate ID
    pub id: Uuid,

    /// Login account (1:1, created at enrollment)
    pub user_id: Option<Uuid>,

    /// Unique human-readable code
    pub code: AffiliateCode,

    /// ISO 3166-1 alpha-2 country
    pub country_code: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Contact email (unique across users and affiliates)
    pub email: String,

    /// Phone
    pub phone: Option<String>,

    /// Date of birth
    pub date_of_birth: Option<NaiveDate>,

    /// Identity document type (DUI, Cedula, INE, Passport)
    pub id_doc_type: Option<String>,

    /// Identity document number
    pub id_doc_number: Option<String>,

    /// Tax ID type (NIT, RFC, RUC, RUT)
    pub tax_id_type: Option<String>,

    /// Tax ID number
    pub tax_id_number: Option<String>,

    /// Street address
    pub address_line1: Option<String>,

    /// Street address, second line
    pub address_line2: Option<String>,

    /// City
    pub city: Option<String>,

    /// State or province
    pub state_province: Option<String>,

    /// Postal code
    pub postal_code: Option<String>,

    /// Recruiter (informational relation)
    pub sponsor_id: Option<Uuid>,

    /// Structural parent in the binary tree
    pub placement_parent_id: Option<Uuid>,

    /// Which of the parent's legs this node occupies
    pub placement_side: Option<PlacementSide>,

    /// Kit tier purchased at enrollment
    pub kit_tier: Option<KitTier>,

    /// Lifecycle status
    pub status: AffiliateStatus,

    /// Current rank (no advancement logic in this phase)
    pub current_rank: String,

    /// Highest rank ever reached
    pub highest_rank: String,

    /// Personal volume, current period
    pub pv_current_period: Decimal,

    /// Lifetime BV credited on the left leg
    pub bv_left_total: Decimal,

    /// Lifetime BV credited on the right leg
    pub bv_right_total: Decimal,

    /// Carry-forward reserve, left leg (not yet populated by any operation)
    pub bv_left_carry: Decimal,

    /// Carry-forward reserve, right leg (not yet populated by any operation)
    pub bv_right_carry: Decimal,

    /// Enrollment timestamp
    pub enrolled_at: DateTime<Utc>,

    /// Soft-delete marker; every read path filters on this
    pub deleted_at: Option<DateTime<Utc>>,

    /// Admin/staff user who created the record
    pub created_by: Option<Uuid>,
}

impl AffiliateNode {
    /// Display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Soft-delete predicate
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    /// First kit purchase; payment confirmation activates the affiliate
    Enrollment = 1,
    /// Regular repurchase
    Repurchase = 2,
    /// Recurring subscription order
    Autoship = 3,
    /// Administrative adjustment
    Admin = 4,
}

impl OrderType {
    /// Canonical lowercase name
    pub fn code(&self) -> &'static str {
        match self {
            OrderType::Enrollment => "enrollment",
            OrderType::Repurchase => "repurchase",
            OrderType::Autoship => "autoship",
            OrderType::Admin => "admin",
        }
    }
}

/// Order lifecycle status
///
/// Only the `PendingPayment -> Paid` transition is driven by this crate and
/// it is one-way; the fulfilment states exist for downstream modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    /// Awaiting payment confirmation
    PendingPayment = 1,
    /// Payment confirmed, volume accrued
    Paid = 2,
    /// Warehouse preparation
    InPreparation = 3,
    /// Shipped
    Shipped = 4,
    /// Delivered
    Delivered = 5,
    /// Cancelled
    Cancelled = 6,
    /// Returned
    Returned = 7,
}

impl OrderStatus {
    /// Canonical lowercase name
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::InPreparation => "in_preparation",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One order line, snapshotting catalog terms at purchase time.
///
/// Later price or volume changes in the catalog must not retroactively
/// alter historical totals, so these fields are copies, not joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Source product
    pub product_id: Uuid,

    /// SKU at purchase time
    pub sku: String,

    /// Product name at purchase time
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Unit price at purchase time
    pub unit_price: Decimal,

    /// Unit PV at purchase time
    pub pv: Decimal,

    /// Unit BV at purchase time
    pub bv: Decimal,

    /// quantity * unit_price
    pub line_total: Decimal,

    /// quantity * pv
    pub line_pv: Decimal,

    /// quantity * bv
    pub line_bv: Decimal,
}

/// A purchase; owns its items (cascade by value)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,

    /// Unique human-readable number
    pub order_number: OrderNumber,

    /// Purchasing affiliate
    pub affiliate_id: Uuid,

    /// Order type
    pub order_type: OrderType,

    /// Lifecycle status
    pub status: OrderStatus,

    /// Sum of line totals before adjustments
    pub subtotal: Decimal,

    /// Tax
    pub tax_amount: Decimal,

    /// Shipping
    pub shipping_amount: Decimal,

    /// Discount
    pub discount_amount: Decimal,

    /// Grand total
    pub total: Decimal,

    /// Total PV across lines
    pub total_pv: Decimal,

    /// Total BV across lines
    pub total_bv: Decimal,

    /// Payment method (recorded at confirmation)
    pub payment_method: Option<String>,

    /// External payment reference
    pub payment_reference: Option<String>,

    /// Payment timestamp
    pub paid_at: Option<DateTime<Utc>>,

    /// Free-form notes
    pub notes: Option<String>,

    /// User who created the order
    pub created_by: Uuid,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Order lines
    pub items: Vec<OrderItem>,
}

/// Read-only snapshot node produced by the tree reader.
///
/// Carries copies of the ledger fields, never references into the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Affiliate ID
    pub id: Uuid,

    /// Affiliate code
    pub affiliate_code: AffiliateCode,

    /// Display name
    pub full_name: String,

    /// Lifecycle status
    pub status: AffiliateStatus,

    /// Current rank
    pub current_rank: String,

    /// Personal volume, current period
    pub pv_current_period: Decimal,

    /// Lifetime BV, left leg
    pub bv_left_total: Decimal,

    /// Lifetime BV, right leg
    pub bv_right_total: Decimal,

    /// Enrollment timestamp
    pub enrolled_at: DateTime<Utc>,

    /// Left child, if within the requested depth
    pub left_child: Option<Box<TreeNode>>,

    /// Right child, if within the requested depth
    pub right_child: Option<Box<TreeNode>>,
}

impl TreeNode {
    /// Snapshot a single node without children
    pub fn from_affiliate(a: &AffiliateNode) -> Self {
        Self {
            id: a.id,
            affiliate_code: a.code.clone(),
            full_name: a.full_name(),
            status: a.status,
            current_rank: a.current_rank.clone(),
            pv_current_period: a.pv_current_period,
            bv_left_total: a.bv_left_total,
            bv_right_total: a.bv_right_total,
            enrolled_at: a.enrolled_at,
            left_child: None,
            right_child: None,
        }
    }
}
