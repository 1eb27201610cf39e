//! Argon2 password hashing. Hashing is CPU-bound, so both operations run on
//! the blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use tracing::warn;

use domains::{PasswordHasher, Result};

use crate::error::AuthAdapterError;

#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

fn hash_blocking(password: &str) -> std::result::Result<String, AuthAdapterError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthAdapterError::Hash(e.to_string()))
}

/// A stored hash that does not parse never verifies.
fn verify_blocking(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_blocking(&password))
            .await
            .map_err(AuthAdapterError::from)??;
        Ok(hash)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let (password, hash) = (password.to_owned(), hash.to_owned());
        let ok = tokio::task::spawn_blocking(move || verify_blocking(&password, &hash))
            .await
            .map_err(AuthAdapterError::from)?;
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify_password("correct horse", &hash).await.unwrap());
        assert!(!hasher.verify_password("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn salts_differ_per_hash() {
        let hasher = Argon2PasswordHasher::new();
        let a = hasher.hash_password("same password").await.unwrap();
        let b = hasher.hash_password("same password").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_hash_never_verifies() {
        let hasher = Argon2PasswordHasher::new();
        assert!(!hasher.verify_password("anything", "not-a-phc-string").await.unwrap());
    }
}
