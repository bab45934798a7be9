// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Params, Scrypt,
};
use thiserror::Error;

/// Default scrypt work factor (log2 of the CPU/memory cost)
pub const DEFAULT_LOG_N: u8 = 15;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("invalid scrypt parameters: {0}")]
    Params(String),

    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),

    #[error("hashing failed: {0}")]
    Hashing(String),

    #[error("hashing task aborted: {0}")]
    Aborted(String),
}

/// One-way salted password hashing.
///
/// A `false` from [`verify`](PasswordHashing::verify) means "wrong password";
/// an `Err` means the hasher itself failed and must be treated as a server fault.
pub trait PasswordHashing: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashError>;
    fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashError>;
}

/// scrypt in PHC string format
#[derive(Debug, Clone)]
pub struct ScryptHasher {
    params: Params,
}

impl ScryptHasher {
    /// Build a hasher with the given work factor (r = 8, p = 1).
    pub fn new(log_n: u8) -> Result<Self, HashError> {
        let params = Params::new(
            log_n,
            Params::RECOMMENDED_R,
            Params::RECOMMENDED_P,
            Params::RECOMMENDED_LEN,
        )
        .map_err(|e| HashError::Params(e.to_string()))?;
        Ok(Self { params })
    }
}

impl Default for ScryptHasher {
    fn default() -> Self {
        Self {
            params: Params::recommended(),
        }
    }
}

impl PasswordHashing for ScryptHasher {
    fn hash(&self, plain: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params, &salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| HashError::MalformedHash(e.to_string()))?;
        match Scrypt.verify_password(plain.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(HashError::Hashing(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> ScryptHasher {
        ScryptHasher::new(4).unwrap()
    }

    #[test]
    fn test_password_hashing_and_verification() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert_ne!(hash, "secret1");
        assert!(hash.starts_with("$scrypt$"));
        assert!(hasher.verify("secret1", &hash).unwrap());
        assert!(!hasher.verify("secret2", &hash).unwrap());
        assert!(!hasher.verify("", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        let hasher = fast_hasher();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret1", &first).unwrap());
        assert!(hasher.verify("secret1", &second).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        let hasher = fast_hasher();
        let result = hasher.verify("secret1", "not-a-phc-string");
        assert!(matches!(result, Err(HashError::MalformedHash(_))));
    }
}
