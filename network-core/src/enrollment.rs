//! Enrollment engine
//!
//! Validates an enrollment request and inserts a new node into the binary
//! placement tree, creating the distributor's login account and their first
//! (kit) order in one atomic batch. Precondition checks run in a fixed
//! order, each with its own error kind; nothing is written until every
//! check has passed.

use crate::{
    audit::AuditRecord,
    error::{Error, Result},
    identity::{self, Principal, UserAccount, ROLE_DISTRIBUTOR},
    sequence,
    storage::Storage,
    types::{
        AffiliateNode, AffiliateStatus, Order, OrderItem, OrderStatus, OrderType, PlacementSide,
    },
};
use chrono::{NaiveDate, Utc};
use kit_catalog::{KitSnapshot, KitTier, ProductCatalog};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

/// Minimum password length for the distributor login
const MIN_PASSWORD_LEN: usize = 8;

/// Enrollment request
#[derive(Debug, Clone)]
pub struct EnrollmentRequest {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Contact email, becomes the login email
    pub email: String,
    /// Phone
    pub phone: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// ISO country; falls back to the configured default when absent
    pub country_code: Option<String>,

    /// Identity document type
    pub id_doc_type: Option<String>,
    /// Identity document number
    pub id_doc_number: Option<String>,
    /// Tax ID type
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

    /// Recruiter
    pub sponsor_id: Option<Uuid>,
    /// Structural parent in the tree
    pub placement_parent_id: Option<Uuid>,
    /// Which leg of the parent to occupy
    pub placement_side: Option<PlacementSide>,

    /// Kit tier to purchase
    pub kit_tier: KitTier,

    /// Distributor login password (hashed before storage)
    pub password: String,
}

impl EnrollmentRequest {
    /// Validate request shape. Runs before any storage read or write.
    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(Error::Validation("First and last name are required".to_string()));
        }

        if !self.email.contains('@') {
            return Err(Error::Validation(format!("Invalid email: {}", self.email)));
        }

        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if let Some(cc) = &self.country_code {
            if cc.len() != 2 || !cc.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(Error::Validation(format!("Invalid country code: {}", cc)));
            }
        }

        // At least one complete document pair (identity or tax ID)
        let has_id = self.id_doc_type.is_some() && self.id_doc_number.is_some();
        let has_tax = self.tax_id_type.is_some() && self.tax_id_number.is_some();
        if !has_id && !has_tax {
            return Err(Error::Validation(
                "At least one document is required (identity or tax ID)".to_string(),
            ));
        }

        // A placement parent needs a side
        if self.placement_parent_id.is_some() && self.placement_side.is_none() {
            return Err(Error::Validation(
                "placement_side is required when placement_parent_id is provided".to_string(),
            ));
        }

        Ok(())
    }
}

/// Enroll a new affiliate. Precondition checks run first; code allocation,
/// account provisioning, node insertion, kit order and audit then commit
/// as one batch.
pub fn enroll(
    storage: &Storage,
    catalog: &dyn ProductCatalog,
    default_country: &str,
    request: &EnrollmentRequest,
    actor: &Principal,
) -> Result<(AffiliateNode, Order)> {
    request.validate()?;

    // 1. Sponsor must exist, or be omitted only for the very first enrollment
    if let Some(sponsor_id) = request.sponsor_id {
        match storage.get_affiliate_raw(sponsor_id)? {
            Some(s) if !s.is_deleted() => {}
            _ => return Err(Error::SponsorNotFound(sponsor_id.to_string())),
        }
    } else if storage.any_live_affiliate()? {
        return Err(Error::SponsorRequired);
    }

    // 2. Placement parent must exist and the slot must be free
    if let Some(parent_id) = request.placement_parent_id {
        // validate() guarantees the side is present
        let side = request
            .placement_side
            .ok_or_else(|| Error::Validation("placement_side missing".to_string()))?;

        match storage.get_affiliate_raw(parent_id)? {
            Some(p) if !p.is_deleted() => {}
            _ => return Err(Error::ParentNotFound(parent_id.to_string())),
        }

        if storage.placement_occupant(parent_id, side)?.is_some() {
            return Err(Error::PositionTaken { side: side.code().to_string() });
        }
    }

    // 3. Email unique across users and affiliates
    if storage.email_in_use(&request.email)? {
        return Err(Error::EmailConflict(request.email.clone()));
    }

    // 4. Kit tier must resolve to an active kit product
    let kit = catalog
        .kit_by_tier(request.kit_tier)
        .ok_or_else(|| Error::KitNotFound(request.kit_tier.code().to_string()))?;
    let kit = KitSnapshot::capture(&kit);

    let country = request
        .country_code
        .as_deref()
        .unwrap_or(default_country)
        .to_uppercase();
    let now = Utc::now();

    let mut tx = storage.begin();

    // 5. Allocate codes; staged, so a failed commit burns nothing
    let affiliate_code = sequence::next_affiliate_code(storage, &mut tx, &country)?;
    let order_number = sequence::next_order_number(storage, &mut tx, now)?;

    // 6. Login account with the distributor role
    let user = UserAccount {
        id: Uuid::new_v4(),
        email: request.email.clone(),
        username: None,
        password_hash: identity::hash_password(&request.password)?,
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
        is_active: true,
        is_superadmin: false,
        roles: vec![ROLE_DISTRIBUTOR.to_string()],
        created_at: now,
    };
    tx.put_user(&user)?;

    // 7. The tree node itself, pending until the kit is paid
    let affiliate = AffiliateNode {
        id: Uuid::new_v4(),
        user_id: Some(user.id),
        code: affiliate_code.clone(),
        country_code: country,
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
        email: request.email.clone(),
        phone: request.phone.clone(),
        date_of_birth: request.date_of_birth,
        id_doc_type: request.id_doc_type.clone(),
        id_doc_number: request.id_doc_number.clone(),
        tax_id_type: request.tax_id_type.clone(),
        tax_id_number: request.tax_id_number.clone(),
        address_line1: request.address_line1.clone(),
        address_line2: request.address_line2.clone(),
        city: request.city.clone(),
        state_province: request.state_province.clone(),
        postal_code: request.postal_code.clone(),
        sponsor_id: request.sponsor_id,
        placement_parent_id: request.placement_parent_id,
        placement_side: request.placement_side,
        kit_tier: Some(request.kit_tier),
        status: AffiliateStatus::Pending,
        current_rank: "affiliate".to_string(),
        highest_rank: "affiliate".to_string(),
        pv_current_period: Decimal::ZERO,
        bv_left_total: Decimal::ZERO,
        bv_right_total: Decimal::ZERO,
        bv_left_carry: Decimal::ZERO,
        bv_right_carry: Decimal::ZERO,
        enrolled_at: now,
        deleted_at: None,
        created_by: Some(actor.id),
    };
    tx.put_affiliate(&affiliate)?;

    if let (Some(parent_id), Some(side)) = (request.placement_parent_id, request.placement_side) {
        tx.put_placement(parent_id, side, affiliate.id)?;
    }

    // 8. Enrollment order with one immutable snapshot line
    let item = OrderItem {
        product_id: kit.product_id,
        sku: kit.sku,
        name: kit.name,
        quantity: 1,
        unit_price: kit.unit_price,
        pv: kit.pv,
        bv: kit.bv,
        line_total: kit.unit_price,
        line_pv: kit.pv,
        line_bv: kit.bv,
    };

    let order = Order {
        id: Uuid::new_v4(),
        order_number: order_number.clone(),
        affiliate_id: affiliate.id,
        order_type: OrderType::Enrollment,
        status: OrderStatus::PendingPayment,
        subtotal: item.line_total,
        tax_amount: Decimal::ZERO,
        shipping_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        total: item.line_total,
        total_pv: item.line_pv,
        total_bv: item.line_bv,
        payment_method: None,
        payment_reference: None,
        paid_at: None,
        notes: None,
        created_by: actor.id,
        created_at: now,
        items: vec![item],
    };
    tx.put_order(&order)?;

    // 9. Audit trail
    let audit = AuditRecord::new(Some(actor.id), "affiliate.enroll", "affiliate", Some(affiliate.id))
        .with_new_values(json!({
            "affiliate_code": affiliate_code.as_str(),
            "email": request.email,
            "kit_tier": request.kit_tier.code(),
            "sponsor_id": request.sponsor_id.map(|id| id.to_string()),
            "order_number": order_number.as_str(),
        }));
    tx.put_audit(&audit)?;

    storage.commit(tx)?;

    tracing::info!(
        affiliate_code = %affiliate_code,
        order_number = %order_number,
        kit_tier = %request.kit_tier,
        "Affiliate enrolled"
    );

    Ok((affiliate, order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EnrollmentRequest {
        EnrollmentRequest {
            first_name: "Rosa".to_string(),
            last_name: "Cabrera".to_string(),
            email: "rosa@example.com".to_string(),
            phone: None,
            date_of_birth: None,
            country_code: Some("SV".to_string()),
            id_doc_type: Some("DUI".to_string()),
            id_doc_number: Some("01234567-8".to_string()),
            tax_id_type: None,
            tax_id_number: None,
            address_line1: None,
            address_line2: None,
            city: None,
            state_province: None,
            postal_code: None,
            sponsor_id: None,
            placement_parent_id: None,
            placement_side: None,
            kit_tier: KitTier::Esp1,
            password: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_document_pair() {
        let mut req = request();
        req.id_doc_type = None;
        req.id_doc_number = None;
        assert!(matches!(req.validate(), Err(Error::Validation(_))));

        // Tax pair alone is enough
        req.tax_id_type = Some("NIT".to_string());
        req.tax_id_number = Some("0614-000000-000-0".to_string());
        assert!(req.validate().is_ok());

        // An incomplete pair does not count
        req.tax_id_number = None;
        assert!(matches!(req.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_requires_side_with_parent() {
        let mut req = request();
        req.placement_parent_id = Some(Uuid::new_v4());
        assert!(matches!(req.validate(), Err(Error::Validation(_))));

        req.placement_side = Some(PlacementSide::Left);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_password() {
        let mut req = request();
        req.password = "short".to_string();
        assert!(matches!(req.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_country() {
        let mut req = request();
        req.country_code = Some("SLV".to_string());
        assert!(matches!(req.validate(), Err(Error::Validation(_))));
    }
}
