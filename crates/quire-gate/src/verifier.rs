//! Password hashing and verification.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, Params};

use crate::error::{GateError, GateResult};

/// Hashes new secrets and checks submitted ones against stored hashes.
pub trait PasswordVerifier: Send + Sync {
    /// Hash `secret` into a self-describing string suitable for storage.
    fn hash(&self, secret: &str) -> GateResult<String>;

    /// Whether `secret` matches `hash`.
    ///
    /// A mismatch is `Ok(false)`; a hash that cannot be parsed is
    /// [`GateError::InvalidHash`].
    fn verify(&self, secret: &str, hash: &str) -> GateResult<bool>;
}

/// Argon2id with a random salt, stored as a PHC string.
#[derive(Clone, Default)]
pub struct Argon2Verifier {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for Argon2Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Verifier").finish_non_exhaustive()
    }
}

impl Argon2Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit cost parameters (memory in KiB, iterations,
    /// parallelism).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> GateResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| GateError::Hashing(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        })
    }
}

impl PasswordVerifier for Argon2Verifier {
    fn hash(&self, secret: &str) -> GateResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| GateError::Hashing(e.to_string()))
    }

    fn verify(&self, secret: &str, hash: &str) -> GateResult<bool> {
        use argon2::PasswordVerifier as _;

        let parsed = PasswordHash::new(hash).map_err(|e| GateError::InvalidHash(e.to_string()))?;
        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(GateError::InvalidHash(e.to_string())),
        }
    }
}
