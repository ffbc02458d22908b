//! Monotonic sequence allocation
//!
//! Counters live in the `sequences` column family, one per scope key:
//! `affiliate:{COUNTRY}` for affiliate codes, `order` for order numbers.
//! Allocation reads the last committed value and stages the increment into
//! the caller's [`WriteTx`], so the number only burns when the surrounding
//! transaction commits. Committed values are never reissued; a scope may
//! show gaps only if distinct scopes interleave, never duplicates.
//!
//! Note: two allocations for the SAME scope inside one transaction would
//! both read the committed value. The engines never need that; each
//! operation touches a scope at most once.

use crate::{
    error::Result,
    storage::{Storage, WriteTx},
    types::{AffiliateCode, OrderNumber},
};
use chrono::{DateTime, Utc};

/// Scope key for the global order-number counter
pub const ORDER_SCOPE: &str = "order";

/// Scope key for a per-country affiliate-code counter
pub fn affiliate_scope(country_code: &str) -> String {
    format!("affiliate:{}", country_code.to_uppercase())
}

/// Allocate the next value in a scope, staging the increment into `tx`
pub fn next_in_scope(storage: &Storage, tx: &mut WriteTx<'_>, scope: &str) -> Result<u64> {
    let next = storage.sequence_value(scope)? + 1;
    tx.put_sequence(scope, next)?;
    Ok(next)
}

/// Allocate the next affiliate code for a country
pub fn next_affiliate_code(
    storage: &Storage,
    tx: &mut WriteTx<'_>,
    country_code: &str,
) -> Result<AffiliateCode> {
    let scope = affiliate_scope(country_code);
    let seq = next_in_scope(storage, tx, &scope)?;
    Ok(AffiliateCode::new(country_code, seq))
}

/// Allocate the next order number.
///
/// One global counter; the date segment is cosmetic and the sequence keeps
/// increasing across days.
pub fn next_order_number(
    storage: &Storage,
    tx: &mut WriteTx<'_>,
    at: DateTime<Utc>,
) -> Result<OrderNumber> {
    let seq = next_in_scope(storage, tx, ORDER_SCOPE)?;
    Ok(OrderNumber::new(at, seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    #[test]
    fn test_codes_increase_per_country() {
        let (storage, _temp) = test_storage();

        for expected in 1..=3u64 {
            let mut tx = storage.begin();
            let code = next_affiliate_code(&storage, &mut tx, "SV").unwrap();
            storage.commit(tx).unwrap();
            assert_eq!(code, AffiliateCode::new("SV", expected));
        }

        // Another country starts from its own counter
        let mut tx = storage.begin();
        let code = next_affiliate_code(&storage, &mut tx, "GT").unwrap();
        storage.commit(tx).unwrap();
        assert_eq!(code.as_str(), "GH-GT-000001");
    }

    #[test]
    fn test_aborted_allocation_does_not_burn_number() {
        let (storage, _temp) = test_storage();

        {
            let mut tx = storage.begin();
            let code = next_affiliate_code(&storage, &mut tx, "SV").unwrap();
            assert_eq!(code.as_str(), "GH-SV-000001");
            // tx dropped: nothing committed
        }

        let mut tx = storage.begin();
        let code = next_affiliate_code(&storage, &mut tx, "SV").unwrap();
        storage.commit(tx).unwrap();
        assert_eq!(code.as_str(), "GH-SV-000001");
    }

    #[test]
    fn test_order_numbers_share_one_global_counter() {
        let (storage, _temp) = test_storage();
        let day1 = DateTime::parse_from_rfc3339("2025-03-15T23:59:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let day2 = DateTime::parse_from_rfc3339("2025-03-16T00:01:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let mut tx = storage.begin();
        let n1 = next_order_number(&storage, &mut tx, day1).unwrap();
        storage.commit(tx).unwrap();

        let mut tx = storage.begin();
        let n2 = next_order_number(&storage, &mut tx, day2).unwrap();
        storage.commit(tx).unwrap();

        // Sequence does not reset on date rollover
        assert_eq!(n1.as_str(), "ORD-20250315-0001");
        assert_eq!(n2.as_str(), "ORD-20250316-0002");
    }
}
