//! Argon2id credential hashes for the in-memory backend
//!
//! The hosted provider keeps its own hashes; nothing here leaves the process.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::types::{EnaaError, Result};

/// PHC string (algorithm, params, salt and digest) for `password`
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| EnaaError::Internal(format!("password hashing: {}", e)))?;
    Ok(phc.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when `phc` is not a valid hash string
pub fn verify_password(password: &str, phc: &str) -> Result<bool> {
    let stored =
        PasswordHash::new(phc).map_err(|e| EnaaError::Internal(format!("stored hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &stored)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let phc = hash_password("jetons-rouges-42").unwrap();

        assert!(phc.starts_with("$argon2id$"));
        assert!(verify_password("jetons-rouges-42", &phc).unwrap());
        assert!(!verify_password("jetons-bleus", &phc).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("meme-mot").unwrap();
        let b = hash_password("meme-mot").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("password", "not-a-valid-hash").is_err());
    }
}
