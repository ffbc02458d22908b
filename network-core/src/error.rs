//! Error types for the network core

use thiserror::Error;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-facing error category (404/409/422-equivalents).
///
/// Authorization failures are decided by the surrounding access
/// collaborator and never originate here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Referenced entity does not exist (or is soft-deleted)
    NotFound,
    /// State or uniqueness conflict
    Conflict,
    /// Request shape invalid
    Validation,
    /// Storage, serialization, or internal failure
    Internal,
}

/// Network core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Sponsor reference does not resolve
    #[error("Sponsor not found: {0}")]
    SponsorNotFound(String),

    /// Tree is non-empty, so a sponsor must be named
    #[error("Sponsor is required")]
    SponsorRequired,

    /// Placement parent reference does not resolve
    #[error("Placement parent not found: {0}")]
    ParentNotFound(String),

    /// The (parent, side) slot is already occupied
    #[error("Position '{side}' under this parent is already taken")]
    PositionTaken {
        /// Requested leg
        side: String,
    },

    /// Email already registered (user directory or affiliate directory)
    #[error("An account with this email already exists: {0}")]
    EmailConflict(String),

    /// Kit tier does not resolve to an active kit product
    #[error("Kit {0} not found or inactive")]
    KitNotFound(String),

    /// Affiliate not found
    #[error("Affiliate not found: {0}")]
    AffiliateNotFound(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order is not in the state the operation requires
    #[error("Order is already '{current}', cannot confirm payment")]
    InvalidOrderState {
        /// Status the order currently holds
        current: String,
    },

    /// Request validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Password hashing failure
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map to the transport-facing category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::SponsorNotFound(_)
            | Error::ParentNotFound(_)
            | Error::KitNotFound(_)
            | Error::AffiliateNotFound(_)
            | Error::OrderNotFound(_) => ErrorCategory::NotFound,

            Error::PositionTaken { .. }
            | Error::EmailConflict(_)
            | Error::InvalidOrderState { .. } => ErrorCategory::Conflict,

            Error::SponsorRequired | Error::Validation(_) => ErrorCategory::Validation,

            Error::Storage(_)
            | Error::Serialization(_)
            | Error::PasswordHash(_)
            | Error::Concurrency(_)
            | Error::Config(_)
            | Error::Io(_) => ErrorCategory::Internal,
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::SponsorNotFound("x".into()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            Error::PositionTaken { side: "left".into() }.category(),
            ErrorCategory::Conflict
        );
        assert_eq!(Error::SponsorRequired.category(), ErrorCategory::Validation);
        assert_eq!(
            Error::Storage("oops".into()).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_invalid_order_state_names_current_status() {
        let err = Error::InvalidOrderState { current: "paid".into() };
        assert!(err.to_string().contains("'paid'"));
    }
}
