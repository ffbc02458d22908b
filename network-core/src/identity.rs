//! Identity directory
//!
//! Login accounts for the back office and for distributors provisioned at
//! enrollment. The core never issues or validates credentials; it only
//! creates the password hash for the new distributor account and records
//! the acting [`Principal`] handed in by the access collaborator.

use crate::error::{Error, Result};
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default role assigned to newly enrolled distributors
pub const ROLE_DISTRIBUTOR: &str = "distributor";

/// Login account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique user ID
    pub id: Uuid,

    /// Email (unique across users and affiliates)
    pub email: String,

    /// Optional login username
    pub username: Option<String>,

    /// Argon2 PHC-format hash; the plaintext is never stored or logged
    pub password_hash: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Whether the account can log in
    pub is_active: bool,

    /// Superadmin flag
    pub is_superadmin: bool,

    /// Assigned role names
    pub roles: Vec<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Acting identity supplied by the access collaborator.
///
/// Permission decisions happen outside the core; engines only record the
/// principal's ID in audit entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// User ID
    pub id: Uuid,

    /// Email
    pub email: String,

    /// Display name
    pub display_name: String,

    /// Active flag
    pub is_active: bool,
}

/// Hash a password with Argon2 and a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert_ne!(hash, "correct horse battery");
        assert!(hash.starts_with("$argon2"));

        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let h1 = hash_password("same").unwrap();
        let h2 = hash_password("same").unwrap();
        assert_ne!(h1, h2);
    }
}
