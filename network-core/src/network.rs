//! Main network orchestration layer
//!
//! Ties storage, the single-writer actor, the product catalog, and the
//! notification collaborator into a high-level API.
//!
//! # Example
//!
//! ```no_run
//! use kit_catalog::CatalogStore;
//! use network_core::{Config, LogNotifier, Network};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> network_core::Result<()> {
//!     let config = Config::default();
//!     let catalog = Arc::new(CatalogStore::new());
//!     let network = Network::open(config, catalog, Arc::new(LogNotifier)).await?;
//!
//!     // let (affiliate, order) = network.enroll(request, actor).await?;
//!
//!     network.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_network_actor, NetworkHandle},
    audit::AuditRecord,
    enrollment::EnrollmentRequest,
    error::Result,
    identity::{Principal, UserAccount},
    metrics::Metrics,
    notify::{EnrollmentNotice, Notifier},
    storage::Storage,
    tree,
    types::{AffiliateNode, Order, TreeNode},
    Config,
};
use kit_catalog::ProductCatalog;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use uuid::Uuid;

/// Main network interface
pub struct Network {
    /// Actor handle for mutating operations
    handle: NetworkHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Notification collaborator, invoked after commit
    notifier: Arc<dyn Notifier>,

    /// Metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Network {
    /// Open the network with configuration and collaborators
    pub async fn open(
        config: Config,
        catalog: Arc<dyn ProductCatalog>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let handle = spawn_network_actor(
            storage.clone(),
            catalog,
            config.default_country.clone(),
            config.mailbox_capacity,
        );

        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("Failed to create metrics: {}", e)))?;

        Ok(Self { handle, storage, notifier, metrics, config })
    }

    /// Enroll a new affiliate with their kit order.
    ///
    /// On success the enrollment-completed notice goes to the notification
    /// collaborator; its failure is logged and swallowed, never propagated.
    pub async fn enroll(
        &self,
        request: EnrollmentRequest,
        actor: Principal,
    ) -> Result<(AffiliateNode, Order)> {
        let (affiliate, order) = self.handle.enroll(request, actor).await?;
        self.metrics.record_enrollment();

        let notice = self.build_notice(&affiliate, &order);
        if let Err(e) = self.notifier.enrollment_completed(&notice) {
            tracing::warn!(
                affiliate_code = %affiliate.code,
                error = %e,
                "Enrollment notification failed (ignored)"
            );
        }

        Ok((affiliate, order))
    }

    /// Confirm payment on an order, accruing PV/BV and activating the
    /// affiliate on enrollment orders
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
        method: impl Into<String>,
        reference: Option<String>,
        actor: Principal,
    ) -> Result<Order> {
        let outcome = self
            .handle
            .confirm_payment(order_id, method.into(), reference, actor)
            .await?;

        self.metrics.record_payment(
            outcome.bv_accrued.to_f64().unwrap_or(0.0),
            outcome.ancestors_credited,
        );

        Ok(outcome.order)
    }

    /// Bounded-depth snapshot of the placement tree
    pub fn tree(&self, root_id: Uuid, depth: usize) -> Result<TreeNode> {
        self.metrics.record_tree_query();
        tree::tree(&self.storage, root_id, depth)
    }

    /// Get a live affiliate by ID
    pub fn affiliate(&self, id: Uuid) -> Result<AffiliateNode> {
        self.storage.get_affiliate(id)
    }

    /// Get a live affiliate by code
    pub fn affiliate_by_code(&self, code: &str) -> Result<AffiliateNode> {
        self.storage.get_affiliate_by_code(code)
    }

    /// Get an order with its items
    pub fn order(&self, id: Uuid) -> Result<Order> {
        self.storage.get_order(id)
    }

    /// Orders of one affiliate
    pub fn orders_of(&self, affiliate_id: Uuid) -> Result<Vec<Order>> {
        self.storage.orders_of(affiliate_id)
    }

    /// Get a login account
    pub fn user(&self, id: Uuid) -> Result<Option<UserAccount>> {
        self.storage.get_user(id)
    }

    /// Newest-first audit records
    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        self.storage.recent_audit(limit)
    }

    /// Soft-delete an affiliate
    pub async fn soft_delete_affiliate(
        &self,
        affiliate_id: Uuid,
        actor: Principal,
        reason: Option<String>,
    ) -> Result<()> {
        self.handle.soft_delete_affiliate(affiliate_id, actor, reason).await
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown network
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }

    fn build_notice(&self, affiliate: &AffiliateNode, order: &Order) -> EnrollmentNotice {
        let (kit_name, kit_price) = order
            .items
            .first()
            .map(|i| (i.name.clone(), i.unit_price.to_string()))
            .unwrap_or_default();

        let sponsor_name = affiliate
            .sponsor_id
            .and_then(|id| self.storage.get_affiliate(id).ok())
            .map(|s| s.full_name());

        let placement = affiliate.placement_parent_id.and_then(|parent_id| {
            let side = affiliate.placement_side?;
            let parent = self.storage.get_affiliate_raw(parent_id).ok().flatten()?;
            Some(format!("{} of {}", side.code(), parent.code))
        });

        EnrollmentNotice {
            affiliate_code: affiliate.code.to_string(),
            full_name: affiliate.full_name(),
            email: affiliate.email.clone(),
            kit_name,
            kit_price,
            order_number: order.order_number.to_string(),
            sponsor_name,
            placement,
        }
    }
}
