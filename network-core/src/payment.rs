//! Payment confirmation and volume accrual
//!
//! The only place where PV/BV gets credited to the network. Confirming a
//! payment marks the order paid, credits the purchaser's personal volume,
//! walks the placement tree upward crediting business volume to the correct
//! leg of every ancestor, and activates the affiliate on enrollment orders.
//! The status guard makes the whole thing idempotent: an order can only
//! leave `pending_payment` once.

use crate::{
    audit::AuditRecord,
    error::{Error, Result},
    identity::Principal,
    storage::Storage,
    types::{AffiliateNode, AffiliateStatus, Order, OrderStatus, OrderType, PlacementSide},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

/// Result of a payment confirmation, for metrics and response composition
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// The order after confirmation, hydrated with items
    pub order: Order,
    /// BV credited to each ancestor (zero when the purchaser is the root)
    pub bv_accrued: Decimal,
    /// How many ancestors received the credit
    pub ancestors_credited: usize,
    /// Whether the affiliate transitioned `pending -> active`
    pub affiliate_activated: bool,
}

/// Confirm payment on an order.
///
/// Legal only from `pending_payment`; any other current status is a
/// conflict naming that status. All effects commit in one batch.
pub fn confirm_payment(
    storage: &Storage,
    order_id: Uuid,
    payment_method: &str,
    payment_reference: Option<&str>,
    actor: &Principal,
) -> Result<PaymentOutcome> {
    // 1. Load and guard the order state machine
    let mut order = storage.get_order(order_id)?;

    if order.status != OrderStatus::PendingPayment {
        return Err(Error::InvalidOrderState { current: order.status.code().to_string() });
    }

    let old_status = order.status;
    order.status = OrderStatus::Paid;
    order.payment_method = Some(payment_method.to_string());
    order.payment_reference = payment_reference.map(str::to_string);
    order.paid_at = Some(Utc::now());

    // 2. Credit the purchaser's personal volume
    let mut affiliate = storage
        .get_affiliate_raw(order.affiliate_id)?
        .ok_or_else(|| Error::AffiliateNotFound(order.affiliate_id.to_string()))?;
    affiliate.pv_current_period += order.total_pv;

    // 3. Business volume up the placement tree
    let ancestors = accrue_bv_to_upline(storage, &affiliate, order.total_bv)?;

    // 4. Enrollment orders activate the affiliate
    let activated = order.order_type == OrderType::Enrollment
        && affiliate.status == AffiliateStatus::Pending;
    if activated {
        affiliate.status = AffiliateStatus::Active;
    }

    // 5. Audit trail with before/after
    let audit = AuditRecord::new(Some(actor.id), "order.confirm_payment", "order", Some(order.id))
        .with_old_values(json!({ "status": old_status.code() }))
        .with_new_values(json!({
            "status": OrderStatus::Paid.code(),
            "payment_method": payment_method,
            "payment_reference": payment_reference,
            "pv_accrued": order.total_pv.to_string(),
            "bv_accrued": order.total_bv.to_string(),
            "affiliate_activated": activated,
        }));

    // 6. Single atomic commit
    let mut tx = storage.begin();
    tx.put_order(&order)?;
    tx.update_affiliate(&affiliate)?;
    for ancestor in &ancestors {
        tx.update_affiliate(ancestor)?;
    }
    tx.put_audit(&audit)?;
    storage.commit(tx)?;

    tracing::info!(
        order_number = %order.order_number,
        pv = %order.total_pv,
        bv = %order.total_bv,
        ancestors = ancestors.len(),
        activated,
        "Payment confirmed"
    );

    Ok(PaymentOutcome {
        bv_accrued: order.total_bv,
        ancestors_credited: ancestors.len(),
        affiliate_activated: activated,
        order,
    })
}

/// Walk up from the purchaser, adding `bv_amount` to the leg of each parent
/// that the current node hangs off.
///
/// An explicit loop, not recursion: the walk must terminate even on
/// pathological data, and a dangling parent reference stops it with a
/// warning instead of failing the payment. Returns the mutated ancestors,
/// nearest first; the caller stages them into its transaction.
fn accrue_bv_to_upline(
    storage: &Storage,
    purchaser: &AffiliateNode,
    bv_amount: Decimal,
) -> Result<Vec<AffiliateNode>> {
    let mut ancestors = Vec::new();

    let mut parent_id = purchaser.placement_parent_id;
    let mut side = purchaser.placement_side;

    while let Some(id) = parent_id {
        let Some(current_side) = side else {
            tracing::warn!(affiliate_id = %id, "Placement parent without side, stopping accrual");
            break;
        };

        // Soft-deleted ancestors still carry structural volume; only a
        // missing row breaks the chain.
        let mut parent = match storage.get_affiliate_raw(id)? {
            Some(p) => p,
            None => {
                tracing::warn!(parent_id = %id, "Dangling placement parent, stopping accrual");
                break;
            }
        };

        match current_side {
            PlacementSide::Left => parent.bv_left_total += bv_amount,
            PlacementSide::Right => parent.bv_right_total += bv_amount,
        }

        parent_id = parent.placement_parent_id;
        side = parent.placement_side;
        ancestors.push(parent);
    }

    Ok(ancestors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AffiliateCode;
    use crate::Config;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn node(seq: u64, parent: Option<(Uuid, PlacementSide)>) -> AffiliateNode {
        AffiliateNode {
            id: Uuid::new_v4(),
            user_id: None,
            code: AffiliateCode::new("SV", seq),
            country_code: "SV".to_string(),
            first_name: "N".to_string(),
            last_name: format!("{}", seq),
            email: format!("n{}@example.com", seq),
            phone: None,
            date_of_birth: None,
            id_doc_type: Some("DUI".to_string()),
            id_doc_number: Some("1".to_string()),
            tax_id_type: None,
            tax_id_number: None,
            address_line1: None,
            address_line2: None,
            city: None,
            state_province: None,
            postal_code: None,
            sponsor_id: None,
            placement_parent_id: parent.map(|(id, _)| id),
            placement_side: parent.map(|(_, s)| s),
            kit_tier: None,
            status: AffiliateStatus::Active,
            current_rank: "affiliate".to_string(),
            highest_rank: "affiliate".to_string(),
            pv_current_period: Decimal::ZERO,
            bv_left_total: Decimal::ZERO,
            bv_right_total: Decimal::ZERO,
            bv_left_carry: Decimal::ZERO,
            bv_right_carry: Decimal::ZERO,
            enrolled_at: Utc::now(),
            deleted_at: None,
            created_by: None,
        }
    }

    #[test]
    fn test_upline_walk_credits_correct_legs() {
        let (storage, _temp) = test_storage();

        // root <- B (left) <- D (left), with a right child C off root
        let root = node(1, None);
        let b = node(2, Some((root.id, PlacementSide::Left)));
        let c = node(3, Some((root.id, PlacementSide::Right)));
        let d = node(4, Some((b.id, PlacementSide::Left)));

        let mut tx = storage.begin();
        for n in [&root, &b, &c, &d] {
            tx.put_affiliate(n).unwrap();
        }
        storage.commit(tx).unwrap();

        let credited = accrue_bv_to_upline(&storage, &d, Decimal::from(300)).unwrap();
        assert_eq!(credited.len(), 2);

        // Nearest first: B then root, both on the left leg
        assert_eq!(credited[0].id, b.id);
        assert_eq!(credited[0].bv_left_total, Decimal::from(300));
        assert_eq!(credited[0].bv_right_total, Decimal::ZERO);
        assert_eq!(credited[1].id, root.id);
        assert_eq!(credited[1].bv_left_total, Decimal::from(300));
        assert_eq!(credited[1].bv_right_total, Decimal::ZERO);
    }

    #[test]
    fn test_upline_walk_right_leg() {
        let (storage, _temp) = test_storage();

        let root = node(1, None);
        let c = node(2, Some((root.id, PlacementSide::Right)));

        let mut tx = storage.begin();
        tx.put_affiliate(&root).unwrap();
        tx.put_affiliate(&c).unwrap();
        storage.commit(tx).unwrap();

        let credited = accrue_bv_to_upline(&storage, &c, Decimal::from(150)).unwrap();
        assert_eq!(credited.len(), 1);
        assert_eq!(credited[0].bv_right_total, Decimal::from(150));
        assert_eq!(credited[0].bv_left_total, Decimal::ZERO);
    }

    #[test]
    fn test_upline_walk_stops_on_dangling_parent() {
        let (storage, _temp) = test_storage();

        // B's parent was never stored
        let ghost = Uuid::new_v4();
        let b = node(1, Some((ghost, PlacementSide::Left)));
        let d = node(2, Some((b.id, PlacementSide::Right)));

        let mut tx = storage.begin();
        tx.put_affiliate(&b).unwrap();
        tx.put_affiliate(&d).unwrap();
        storage.commit(tx).unwrap();

        // Credits B, then hits the broken link and stops without error
        let credited = accrue_bv_to_upline(&storage, &d, Decimal::from(100)).unwrap();
        assert_eq!(credited.len(), 1);
        assert_eq!(credited[0].id, b.id);
        assert_eq!(credited[0].bv_right_total, Decimal::from(100));
    }

    #[test]
    fn test_root_purchase_credits_nobody() {
        let (storage, _temp) = test_storage();
        let root = node(1, None);

        let mut tx = storage.begin();
        tx.put_affiliate(&root).unwrap();
        storage.commit(tx).unwrap();

        let credited = accrue_bv_to_upline(&storage, &root, Decimal::from(500)).unwrap();
        assert!(credited.is_empty());
    }
}
