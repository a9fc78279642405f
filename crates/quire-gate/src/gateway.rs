use std::sync::Arc;

use quire_types::PublicationRecord;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ThrottleConfig;
use crate::error::GateResult;
use crate::session::UnlockSession;
use crate::throttle::AttemptThrottle;
use crate::verifier::{Argon2Verifier, PasswordVerifier};

/// Whether a session may read a publication right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// The publication has no password.
    Open,
    /// The session unlocked it earlier.
    Unlocked,
    /// A password is required.
    Locked,
}

impl AccessState {
    pub fn is_readable(self) -> bool {
        !matches!(self, Self::Locked)
    }
}

/// Result of a password attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockOutcome {
    /// Nothing to unlock; no attempt was counted.
    Open,
    /// The session already holds the unlock; no attempt was counted.
    AlreadyUnlocked,
    /// The password matched; the session now holds the unlock.
    Unlocked,
    /// The password did not match.
    WrongPassword,
    /// Too many attempts for this publication in the current window.
    Throttled,
}

impl UnlockOutcome {
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Open | Self::AlreadyUnlocked | Self::Unlocked)
    }
}

/// Password gate in front of protected publications.
///
/// Unlock state is carried by the caller's [`UnlockSession`]; the gateway
/// itself only owns the shared attempt throttle and the verifier.
#[derive(Clone)]
pub struct AccessGateway {
    verifier: Arc<dyn PasswordVerifier>,
    throttle: Arc<AttemptThrottle>,
}

impl std::fmt::Debug for AccessGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGateway")
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}

impl AccessGateway {
    pub fn new(verifier: Arc<dyn PasswordVerifier>, throttle: Arc<AttemptThrottle>) -> Self {
        Self { verifier, throttle }
    }

    /// Argon2id verification with a fresh throttle built from `config`.
    pub fn with_config(config: &ThrottleConfig) -> Self {
        Self::new(
            Arc::new(Argon2Verifier::new()),
            Arc::new(AttemptThrottle::new(config)),
        )
    }

    pub fn verifier(&self) -> &dyn PasswordVerifier {
        self.verifier.as_ref()
    }

    pub fn throttle(&self) -> &Arc<AttemptThrottle> {
        &self.throttle
    }

    pub fn access_state(&self, session: &UnlockSession, record: &PublicationRecord) -> AccessState {
        if !record.is_protected() {
            AccessState::Open
        } else if session.is_unlocked(&record.id) {
            AccessState::Unlocked
        } else {
            AccessState::Locked
        }
    }

    /// Check `password` for `record` and, on success, unlock it in `session`.
    ///
    /// The throttle is consulted before the verifier runs, so a throttled
    /// attempt never touches the stored hash.
    pub fn verify_and_unlock(
        &self,
        session: &mut UnlockSession,
        record: &PublicationRecord,
        password: &str,
    ) -> GateResult<UnlockOutcome> {
        let Some(hash) = record.password_hash.as_deref() else {
            return Ok(UnlockOutcome::Open);
        };
        if session.is_unlocked(&record.id) {
            return Ok(UnlockOutcome::AlreadyUnlocked);
        }

        if !self.throttle.allow_attempt(&record.id)? {
            return Ok(UnlockOutcome::Throttled);
        }

        if self.verifier.verify(password, hash)? {
            session.unlock(record.id);
            info!(id = %record.id, "publication unlocked");
            Ok(UnlockOutcome::Unlocked)
        } else {
            debug!(id = %record.id, "wrong password");
            Ok(UnlockOutcome::WrongPassword)
        }
    }
}
