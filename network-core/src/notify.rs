//! Notification seam
//!
//! Enrollment-completed events go out AFTER the transaction commits, and a
//! failing notifier must never fail or roll back the enrollment: the caller
//! logs the error and moves on. The default [`LogNotifier`] just writes a
//! structured log line, which is also what development environments use
//! instead of a real mail provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Notification delivery failure; swallowed and logged by the caller
#[derive(Error, Debug)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Enrollment summary handed to the notification collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentNotice {
    /// New affiliate's code
    pub affiliate_code: String,

    /// New affiliate's display name
    pub full_name: String,

    /// New affiliate's email
    pub email: String,

    /// Kit name at purchase time
    pub kit_name: String,

    /// Kit price at purchase time (formatted)
    pub kit_price: String,

    /// Order number
    pub order_number: String,

    /// Sponsor's display name, when known
    pub sponsor_name: Option<String>,

    /// Human description of the tree position, e.g. `left of GH-SV-000001`
    pub placement: Option<String>,
}

/// Notification collaborator
pub trait Notifier: Send + Sync {
    /// Deliver an enrollment-completed notice
    fn enrollment_completed(&self, notice: &EnrollmentNotice) -> Result<(), NotifyError>;
}

/// Notifier that logs instead of sending
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn enrollment_completed(&self, notice: &EnrollmentNotice) -> Result<(), NotifyError> {
        tracing::info!(
            affiliate_code = %notice.affiliate_code,
            email = %notice.email,
            kit = %notice.kit_name,
            order_number = %notice.order_number,
            sponsor = notice.sponsor_name.as_deref().unwrap_or("-"),
            "Enrollment notice (log only)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_accepts_notice() {
        let notice = EnrollmentNotice {
            affiliate_code: "GH-SV-000001".to_string(),
            full_name: "Rosa Cabrera".to_string(),
            email: "rosa@example.com".to_string(),
            kit_name: "Starter Kit ESP1".to_string(),
            kit_price: "99.00".to_string(),
            order_number: "ORD-20250315-0001".to_string(),
            sponsor_name: None,
            placement: None,
        };

        assert!(LogNotifier.enrollment_completed(&notice).is_ok());
    }
}
