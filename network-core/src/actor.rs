//! Actor-based concurrency for the placement ledger
//!
//! All mutating operations flow through one actor task: each command runs
//! its reads, precondition checks, and a single atomic `WriteBatch` commit
//! before the next command starts. That single-writer discipline is what
//! serializes concurrent enrollments racing for the same `(parent, side)`
//! slot or the same sequence counter, and payment confirmations sharing
//! ancestors, without in-process row locking. Reads that tolerate a
//! slightly stale view (tree snapshots, lookups) go straight to storage.

use crate::{
    audit::AuditRecord,
    enrollment::{self, EnrollmentRequest},
    error::{Error, Result},
    identity::Principal,
    payment::{self, PaymentOutcome},
    storage::Storage,
    types::{AffiliateNode, Order},
};
use chrono::Utc;
use kit_catalog::ProductCatalog;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Message sent to the network actor
pub enum NetworkMessage {
    /// Enroll a new affiliate
    Enroll {
        /// Request payload
        request: Box<EnrollmentRequest>,
        /// Acting principal
        actor: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<(AffiliateNode, Order)>>,
    },

    /// Confirm payment on an order
    ConfirmPayment {
        /// Order to confirm
        order_id: Uuid,
        /// Payment method
        method: String,
        /// External payment reference
        reference: Option<String>,
        /// Acting principal
        actor: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<PaymentOutcome>>,
    },

    /// Soft-delete an affiliate (read filter, not a structural change)
    SoftDeleteAffiliate {
        /// Affiliate to mark deleted
        affiliate_id: Uuid,
        /// Acting principal
        actor: Principal,
        /// Reason recorded in the audit trail
        reason: Option<String>,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes network commands one at a time
pub struct NetworkActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Product catalog collaborator
    catalog: Arc<dyn ProductCatalog>,

    /// Country used when a request omits one
    default_country: String,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<NetworkMessage>,
}

impl NetworkActor {
    /// Create new actor
    pub fn new(
        storage: Arc<Storage>,
        catalog: Arc<dyn ProductCatalog>,
        default_country: String,
        mailbox: mpsc::Receiver<NetworkMessage>,
    ) -> Self {
        Self { storage, catalog, default_country, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                NetworkMessage::Shutdown => break,
                other => self.handle_message(other),
            }
        }
    }

    fn handle_message(&mut self, msg: NetworkMessage) {
        match msg {
            NetworkMessage::Enroll { request, actor, response } => {
                let result = enrollment::enroll(
                    &self.storage,
                    self.catalog.as_ref(),
                    &self.default_country,
                    &request,
                    &actor,
                );
                let _ = response.send(result);
            }

            NetworkMessage::ConfirmPayment { order_id, method, reference, actor, response } => {
                let result = payment::confirm_payment(
                    &self.storage,
                    order_id,
                    &method,
                    reference.as_deref(),
                    &actor,
                );
                let _ = response.send(result);
            }

            NetworkMessage::SoftDeleteAffiliate { affiliate_id, actor, reason, response } => {
                let result = self.soft_delete(affiliate_id, &actor, reason.as_deref());
                let _ = response.send(result);
            }

            NetworkMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Mark an affiliate deleted. The placement slot stays occupied and
    /// historical orders are untouched; reads start filtering the row out.
    fn soft_delete(
        &self,
        affiliate_id: Uuid,
        actor: &Principal,
        reason: Option<&str>,
    ) -> Result<()> {
        let mut affiliate = self.storage.get_affiliate(affiliate_id)?;
        affiliate.deleted_at = Some(Utc::now());

        let audit =
            AuditRecord::new(Some(actor.id), "affiliate.delete", "affiliate", Some(affiliate_id))
                .with_old_values(json!({ "status": affiliate.status.code() }))
                .with_new_values(json!({
                    "deleted_at": affiliate.deleted_at,
                    "reason": reason,
                }));

        let mut tx = self.storage.begin();
        tx.update_affiliate(&affiliate)?;
        tx.put_audit(&audit)?;
        self.storage.commit(tx)?;

        tracing::info!(code = %affiliate.code, "Affiliate soft-deleted");
        Ok(())
    }
}

/// Handle for sending commands to the actor
#[derive(Clone)]
pub struct NetworkHandle {
    sender: mpsc::Sender<NetworkMessage>,
}

impl NetworkHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<NetworkMessage>) -> Self {
        Self { sender }
    }

    /// Enroll a new affiliate
    pub async fn enroll(
        &self,
        request: EnrollmentRequest,
        actor: Principal,
    ) -> Result<(AffiliateNode, Order)> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(NetworkMessage::Enroll {
                request: Box::new(request),
                actor,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Confirm payment on an order
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
        method: String,
        reference: Option<String>,
        actor: Principal,
    ) -> Result<PaymentOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(NetworkMessage::ConfirmPayment {
                order_id,
                method,
                reference,
                actor,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Soft-delete an affiliate
    pub async fn soft_delete_affiliate(
        &self,
        affiliate_id: Uuid,
        actor: Principal,
        reason: Option<String>,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(NetworkMessage::SoftDeleteAffiliate {
                affiliate_id,
                actor,
                reason,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(NetworkMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the network actor
pub fn spawn_network_actor(
    storage: Arc<Storage>,
    catalog: Arc<dyn ProductCatalog>,
    default_country: String,
    mailbox_capacity: usize,
) -> NetworkHandle {
    // Bounded channel for backpressure
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = NetworkActor::new(storage, catalog, default_country, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    NetworkHandle::new(tx)
}
