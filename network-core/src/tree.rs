//! Tree reader
//!
//! Reconstructs a bounded-depth snapshot of the placement tree for
//! visualization. Children come from the placement-slot index, so each
//! level costs two point lookups per node. The snapshot carries copies of
//! the ledger fields only.

use crate::{error::Result, storage::Storage, types::TreeNode};
use uuid::Uuid;

/// Build the placement tree rooted at `root_id`, descending `depth` levels.
///
/// `depth == 0` returns the root alone even if children exist. A missing or
/// soft-deleted root is a not-found failure.
pub fn tree(storage: &Storage, root_id: Uuid, depth: usize) -> Result<TreeNode> {
    let root = storage.get_affiliate(root_id)?;

    build_node(storage, TreeNode::from_affiliate(&root), root_id, depth)
}

fn build_node(
    storage: &Storage,
    mut node: TreeNode,
    id: Uuid,
    remaining_depth: usize,
) -> Result<TreeNode> {
    if remaining_depth == 0 {
        return Ok(node);
    }

    let (left, right) = storage.children_of(id)?;

    if let Some(child) = left {
        let snapshot = TreeNode::from_affiliate(&child);
        node.left_child = Some(Box::new(build_node(
            storage,
            snapshot,
            child.id,
            remaining_depth - 1,
        )?));
    }

    if let Some(child) = right {
        let snapshot = TreeNode::from_affiliate(&child);
        node.right_child = Some(Box::new(build_node(
            storage,
            snapshot,
            child.id,
            remaining_depth - 1,
        )?));
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{AffiliateCode, AffiliateNode, AffiliateStatus, PlacementSide};
    use crate::Config;
    use chrono::Utc;
    use rust_decimal::Decimal;
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
            email: format!("t{}@example.com", seq),
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

    /// root with left child B, right child C, and B's left child D
    fn seed_chain(storage: &Storage) -> (AffiliateNode, AffiliateNode, AffiliateNode, AffiliateNode) {
        let root = node(1, None);
        let b = node(2, Some((root.id, PlacementSide::Left)));
        let c = node(3, Some((root.id, PlacementSide::Right)));
        let d = node(4, Some((b.id, PlacementSide::Left)));

        let mut tx = storage.begin();
        for n in [&root, &b, &c, &d] {
            tx.put_affiliate(n).unwrap();
            if let (Some(p), Some(s)) = (n.placement_parent_id, n.placement_side) {
                tx.put_placement(p, s, n.id).unwrap();
            }
        }
        storage.commit(tx).unwrap();

        (root, b, c, d)
    }

    #[test]
    fn test_depth_zero_returns_root_alone() {
        let (storage, _temp) = test_storage();
        let (root, _, _, _) = seed_chain(&storage);

        let snapshot = tree(&storage, root.id, 0).unwrap();
        assert_eq!(snapshot.id, root.id);
        assert!(snapshot.left_child.is_none());
        assert!(snapshot.right_child.is_none());
    }

    #[test]
    fn test_depth_bounds_descent() {
        let (storage, _temp) = test_storage();
        let (root, b, c, _d) = seed_chain(&storage);

        let snapshot = tree(&storage, root.id, 1).unwrap();
        let left = snapshot.left_child.as_ref().unwrap();
        let right = snapshot.right_child.as_ref().unwrap();
        assert_eq!(left.id, b.id);
        assert_eq!(right.id, c.id);
        // D is two levels down, outside depth 1
        assert!(left.left_child.is_none());

        let deeper = tree(&storage, root.id, 2).unwrap();
        let left = deeper.left_child.as_ref().unwrap();
        assert!(left.left_child.is_some());
        assert!(left.right_child.is_none());
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let (storage, _temp) = test_storage();
        let result = tree(&storage, Uuid::new_v4(), 3);
        assert!(matches!(result, Err(Error::AffiliateNotFound(_))));
    }

    #[test]
    fn test_soft_deleted_root_is_not_found() {
        let (storage, _temp) = test_storage();
        let (root, _, _, _) = seed_chain(&storage);

        let mut deleted = root.clone();
        deleted.deleted_at = Some(Utc::now());
        let mut tx = storage.begin();
        tx.update_affiliate(&deleted).unwrap();
        storage.commit(tx).unwrap();

        assert!(matches!(
            tree(&storage, root.id, 1),
            Err(Error::AffiliateNotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_carries_volume_fields() {
        let (storage, _temp) = test_storage();
        let (root, b, _, _) = seed_chain(&storage);

        let mut b2 = b.clone();
        b2.bv_left_total = Decimal::from(300);
        let mut tx = storage.begin();
        tx.update_affiliate(&b2).unwrap();
        storage.commit(tx).unwrap();

        let snapshot = tree(&storage, root.id, 1).unwrap();
        assert_eq!(
            snapshot.left_child.unwrap().bv_left_total,
            Decimal::from(300)
        );
    }
}
