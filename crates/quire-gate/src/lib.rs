//! Access gateway for Quire.
//!
//! Publications may carry a password hash. Readers unlock them per session
//! through [`AccessGateway::verify_and_unlock`]; every attempt against an
//! identifier passes through a shared [`AttemptThrottle`] before the
//! password is checked.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::Utc;
//! use quire_gate::{
//!     AccessGateway, Argon2Verifier, AttemptThrottle, PasswordVerifier, ThrottleConfig,
//!     UnlockOutcome, UnlockSession,
//! };
//! use quire_types::{PublicationId, PublicationRecord};
//!
//! let verifier = Arc::new(Argon2Verifier::with_params(8, 1, 1).unwrap());
//! let mut record = PublicationRecord::new(PublicationId::generate(), "notes.md", Utc::now());
//! record.password_hash = Some(verifier.hash("open sesame").unwrap());
//!
//! let gate = AccessGateway::new(
//!     verifier,
//!     Arc::new(AttemptThrottle::new(&ThrottleConfig::default())),
//! );
//! let mut session = UnlockSession::new();
//! let outcome = gate.verify_and_unlock(&mut session, &record, "open sesame").unwrap();
//! assert_eq!(outcome, UnlockOutcome::Unlocked);
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod throttle;
pub mod verifier;

pub use config::ThrottleConfig;
pub use error::{GateError, GateResult};
pub use gateway::{AccessGateway, AccessState, UnlockOutcome};
pub use session::UnlockSession;
pub use throttle::{spawn_sweeper, sweep_task, AttemptThrottle, Sweep};
pub use verifier::{Argon2Verifier, PasswordVerifier};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use quire_types::{PublicationId, PublicationRecord};

    /// Plain-text verifier that counts calls.
    #[derive(Default)]
    struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl PasswordVerifier for CountingVerifier {
        fn hash(&self, secret: &str) -> GateResult<String> {
            Ok(format!("plain:{secret}"))
        }

        fn verify(&self, secret: &str, hash: &str) -> GateResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match hash.strip_prefix("plain:") {
                Some(expected) => Ok(expected == secret),
                None => Err(GateError::InvalidHash(hash.into())),
            }
        }
    }

    fn gateway() -> (AccessGateway, Arc<CountingVerifier>) {
        let verifier = Arc::new(CountingVerifier::default());
        let throttle = Arc::new(AttemptThrottle::new(&ThrottleConfig::default()));
        (AccessGateway::new(verifier.clone(), throttle), verifier)
    }

    fn protected(password: &str) -> PublicationRecord {
        let mut r = PublicationRecord::new(PublicationId::generate(), "secret.md", Utc::now());
        r.password_hash = Some(format!("plain:{password}"));
        r
    }

    // -----------------------------------------------------------------------
    // 1. Unprotected publications are always open
    // -----------------------------------------------------------------------
    #[test]
    fn open_publication_needs_no_attempt() {
        let (gate, verifier) = gateway();
        let record = PublicationRecord::new(PublicationId::generate(), "a.md", Utc::now());
        let mut session = UnlockSession::new();

        assert_eq!(gate.access_state(&session, &record), AccessState::Open);
        let outcome = gate.verify_and_unlock(&mut session, &record, "x").unwrap();
        assert_eq!(outcome, UnlockOutcome::Open);
        assert!(session.is_empty());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(gate.throttle().attempts(&record.id).unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // 2. Locked -> Unlocked on the right password
    // -----------------------------------------------------------------------
    #[test]
    fn correct_password_unlocks_session() {
        let (gate, _) = gateway();
        let record = protected("pw");
        let mut session = UnlockSession::new();

        assert_eq!(gate.access_state(&session, &record), AccessState::Locked);
        assert_eq!(
            gate.verify_and_unlock(&mut session, &record, "nope").unwrap(),
            UnlockOutcome::WrongPassword
        );
        assert_eq!(gate.access_state(&session, &record), AccessState::Locked);
        assert_eq!(
            gate.verify_and_unlock(&mut session, &record, "pw").unwrap(),
            UnlockOutcome::Unlocked
        );
        assert_eq!(gate.access_state(&session, &record), AccessState::Unlocked);
    }

    // -----------------------------------------------------------------------
    // 3. Unlocks are per session
    // -----------------------------------------------------------------------
    #[test]
    fn unlock_does_not_leak_across_sessions() {
        let (gate, _) = gateway();
        let record = protected("pw");
        let mut alice = UnlockSession::new();
        let bob = UnlockSession::new();

        gate.verify_and_unlock(&mut alice, &record, "pw").unwrap();
        assert_eq!(gate.access_state(&alice, &record), AccessState::Unlocked);
        assert_eq!(gate.access_state(&bob, &record), AccessState::Locked);
    }

    // -----------------------------------------------------------------------
    // 4. Unlock survives a password change
    // -----------------------------------------------------------------------
    #[test]
    fn unlock_persists_after_password_change() {
        let (gate, _) = gateway();
        let mut record = protected("old");
        let mut session = UnlockSession::new();
        gate.verify_and_unlock(&mut session, &record, "old").unwrap();

        record.password_hash = Some("plain:new".into());
        assert_eq!(gate.access_state(&session, &record), AccessState::Unlocked);
        assert_eq!(
            gate.verify_and_unlock(&mut session, &record, "anything").unwrap(),
            UnlockOutcome::AlreadyUnlocked
        );
    }

    // -----------------------------------------------------------------------
    // 5. Throttle caps guesses regardless of outcome
    // -----------------------------------------------------------------------
    #[test]
    fn sixth_attempt_is_throttled_even_with_right_password() {
        let (gate, verifier) = gateway();
        let record = protected("pw");
        let mut session = UnlockSession::new();

        for _ in 0..5 {
            assert_eq!(
                gate.verify_and_unlock(&mut session, &record, "wrong").unwrap(),
                UnlockOutcome::WrongPassword
            );
        }
        assert_eq!(
            gate.verify_and_unlock(&mut session, &record, "pw").unwrap(),
            UnlockOutcome::Throttled
        );
        // The throttled attempt never reached the verifier.
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 5);
        assert!(session.is_empty());
    }

    // -----------------------------------------------------------------------
    // 6. The throttle is shared across sessions
    // -----------------------------------------------------------------------
    #[test]
    fn throttle_is_per_identifier_not_per_session() {
        let (gate, _) = gateway();
        let record = protected("pw");
        for _ in 0..5 {
            gate.verify_and_unlock(&mut UnlockSession::new(), &record, "x")
                .unwrap();
        }
        let outcome = gate
            .verify_and_unlock(&mut UnlockSession::new(), &record, "pw")
            .unwrap();
        assert_eq!(outcome, UnlockOutcome::Throttled);

        // A different publication is unaffected.
        let other = protected("pw");
        let outcome = gate
            .verify_and_unlock(&mut UnlockSession::new(), &other, "pw")
            .unwrap();
        assert_eq!(outcome, UnlockOutcome::Unlocked);
    }

    // -----------------------------------------------------------------------
    // 7. Already-unlocked sessions do not consume attempts
    // -----------------------------------------------------------------------
    #[test]
    fn already_unlocked_consumes_no_attempt() {
        let (gate, _) = gateway();
        let record = protected("pw");
        let mut session = UnlockSession::new();
        gate.verify_and_unlock(&mut session, &record, "pw").unwrap();
        for _ in 0..10 {
            gate.verify_and_unlock(&mut session, &record, "pw").unwrap();
        }
        assert_eq!(gate.throttle().attempts(&record.id).unwrap(), Some(1));
    }

    // -----------------------------------------------------------------------
    // 8. A broken stored hash is an error, not a wrong password
    // -----------------------------------------------------------------------
    #[test]
    fn invalid_hash_surfaces_as_error() {
        let (gate, _) = gateway();
        let mut record = protected("pw");
        record.password_hash = Some("garbage".into());
        let err = gate
            .verify_and_unlock(&mut UnlockSession::new(), &record, "pw")
            .unwrap_err();
        assert!(matches!(err, GateError::InvalidHash(_)));
    }

    // -----------------------------------------------------------------------
    // 9. Outcome helpers and wire names
    // -----------------------------------------------------------------------
    #[test]
    fn outcome_helpers() {
        assert!(UnlockOutcome::AlreadyUnlocked.grants_access());
        assert!(!UnlockOutcome::Throttled.grants_access());
        assert!(AccessState::Unlocked.is_readable());
        assert!(!AccessState::Locked.is_readable());
        assert_eq!(
            serde_json::to_string(&UnlockOutcome::WrongPassword).unwrap(),
            "\"wrong_password\""
        );
    }
}
