//! GrowHub Network Core
//!
//! Binary-tree compensation ledger for a distributor network: enrollment
//! into the placement tree, PV/BV accrual on payment confirmation, and
//! bounded-depth tree snapshots.
//!
//! # Architecture
//!
//! - **Single Writer**: one actor task serializes every mutating command
//! - **Atomic Batches**: each command commits one RocksDB `WriteBatch`
//! - **Soft Delete**: a read filter, never a structural change
//! - **Snapshots**: order items copy catalog terms at purchase time
//!
//! # Invariants
//!
//! - At most one child per `(parent, side)` slot, forever
//! - Nodes are only appended as leaves, never moved
//! - PV/BV accumulators are monotonically non-decreasing and mutated only
//!   by payment confirmation
//! - `pending_payment -> paid` is the only order transition here, one-way

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod audit;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod network;
pub mod notify;
pub mod payment;
pub mod sequence;
pub mod storage;
pub mod tree;
pub mod types;

// Re-exports
pub use audit::AuditRecord;
pub use config::Config;
pub use enrollment::EnrollmentRequest;
pub use error::{Error, ErrorCategory, Result};
pub use identity::{Principal, UserAccount};
pub use network::Network;
pub use notify::{EnrollmentNotice, LogNotifier, Notifier};
pub use payment::PaymentOutcome;
pub use storage::Storage;
pub use types::{
    AffiliateCode, AffiliateNode, AffiliateStatus, Order, OrderItem, OrderNumber, OrderStatus,
    OrderType, PlacementSide, TreeNode,
};
