/// Errors raised by the access gateway.
///
/// A wrong password or a throttled attempt is an outcome, not an error;
/// see [`crate::UnlockOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The stored hash is not a usable PHC string.
    #[error("stored password hash is invalid: {0}")]
    InvalidHash(String),

    /// Hashing a new secret failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The throttle table's lock was poisoned by a panicking holder.
    #[error("throttle lock poisoned")]
    LockPoisoned,
}

pub type GateResult<T> = Result<T, GateError>;
