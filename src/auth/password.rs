//! Argon2id hashing for stored credentials. Each hash carries its own
//! random salt in the PHC string, so verification needs no extra state.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` on a mismatch; an error means the stored hash could
/// not be parsed at all.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("stored hash is malformed: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_the_original_password() {
        let hash = hash_password("orange bike at dawn 42").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("orange bike at dawn 42", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_a_different_password() {
        let hash = hash_password("left-lane-42").unwrap();
        assert!(!verify_password("left-lane-43", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_to_distinct_strings() {
        let a = hash_password("repeatable?").unwrap();
        let b = hash_password("repeatable?").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("anything", "plainly not a phc string").is_err());
    }
}
