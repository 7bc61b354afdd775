use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Hashes `password` with argon2id and a fresh salt, returning the PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("hashing password: {}", err))?;
    Ok(hash.to_string())
}

/// False for a wrong password and for a hash that does not parse.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    match PasswordHash::new(hashed_password) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Verifies against a throwaway hash so a missing account costs as much as a
/// wrong password. Always false.
pub fn verify_dummy(password: &str) -> bool {
    let dummy = DUMMY_HASH.get_or_init(|| hash_password("notes-api dummy password").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("testpass").unwrap();
        let b = hash_password("testpass").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_verification_never_matches() {
        assert!(!verify_dummy("notes-api dummy password"));
        assert!(!verify_dummy("testpass"));
        assert!(DUMMY_HASH.get().and_then(|h| h.as_deref()).is_some_and(|h| h.starts_with("$argon2id$")));
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        assert!(!verify_password("testpass", "not-a-phc-string"));
        assert!(!verify_password("testpass", ""));
    }
}
