//! Password hashing with Argon2id.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::auth::AuthError;

/// Salted Argon2id hasher producing PHC strings.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    const TIME_COST: u32 = 2;
    const PARALLELISM: u32 = 1;

    /// Creates a hasher with the given memory cost in KiB.
    ///
    /// Falls back to the library defaults if the parameters are rejected.
    pub fn new(memory_kib: u32) -> Self {
        let params = Params::new(memory_kib, Self::TIME_COST, Self::PARALLELISM, None)
            .unwrap_or_default();
        Self { params }
    }

    /// Cheap parameters for tests.
    pub fn fast() -> Self {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default();
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Returns true if `password` matches the stored PHC string.
    ///
    /// An unparsable hash never verifies.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }

    /// Hashes on the blocking pool so the runtime is not stalled.
    pub async fn hash_async(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    pub async fn verify_async(&self, password: String, hash: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Params::DEFAULT_M_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted() {
        let hasher = PasswordHasher::fast();
        let a = hasher.hash("secret").unwrap();
        let b = hasher.hash("secret").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(hasher.verify("secret", &a));
        assert!(hasher.verify("secret", &b));
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hasher = PasswordHasher::fast();
        let hash = hasher.hash("admin123").unwrap();

        assert!(!hasher.verify("admin124", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let hasher = PasswordHasher::fast();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_async_roundtrip() {
        let hasher = PasswordHasher::fast();
        let hash = hasher.hash_async("pa55word!".to_string()).await.unwrap();
        assert!(hasher.verify_async("pa55word!".to_string(), hash).await);
    }
}
