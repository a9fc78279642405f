//! Reader sessions carried by an opaque cookie.
//!
//! Each session owns an [`UnlockSession`]. Handlers take a snapshot, let the
//! gateway work on it, and fold the result back in with [`SessionRegistry::save`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use quire_gate::{GateError, GateResult, Sweep, UnlockSession};
use rand::RngCore;

use crate::error::{ServerError, ServerResult};

pub const SESSION_COOKIE: &str = "quire_session";

const TOKEN_BYTES: usize = 16;

#[derive(Debug)]
struct Entry {
    unlocks: UnlockSession,
    last_seen: Instant,
}

/// A session as seen by one request.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    pub token: String,
    pub unlocks: UnlockSession,
    /// The cookie must be (re)issued when this session is saved.
    pub is_new: bool,
}

#[derive(Debug)]
pub struct SessionRegistry {
    idle_ttl: Duration,
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            idle_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> ServerResult<MutexGuard<'_, HashMap<String, Entry>>> {
        self.sessions
            .lock()
            .map_err(|_| ServerError::Internal("session lock poisoned".into()))
    }

    /// Find the session named by the request's cookie, or start a new one.
    ///
    /// New sessions are not stored until they are saved, so anonymous
    /// readers of open publications leave nothing behind.
    pub fn resolve(&self, headers: &HeaderMap) -> ServerResult<SessionHandle> {
        if let Some(token) = cookie_token(headers) {
            if let Some(entry) = self.sessions()?.get_mut(&token) {
                entry.last_seen = Instant::now();
                return Ok(SessionHandle {
                    token,
                    unlocks: entry.unlocks.clone(),
                    is_new: false,
                });
            }
        }

        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Ok(SessionHandle {
            token: hex::encode(bytes),
            unlocks: UnlockSession::new(),
            is_new: true,
        })
    }

    /// Merge the handle's unlocks into the stored session.
    pub fn save(&self, handle: &SessionHandle) -> ServerResult<()> {
        let mut sessions = self.sessions()?;
        let entry = sessions.entry(handle.token.clone()).or_insert_with(|| Entry {
            unlocks: UnlockSession::new(),
            last_seen: Instant::now(),
        });
        entry.unlocks.absorb(handle.unlocks.clone());
        entry.last_seen = Instant::now();
        Ok(())
    }

    pub fn purge_idle_at(&self, now: Instant) -> ServerResult<usize> {
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        let ttl = self.idle_ttl;
        sessions.retain(|_, e| now.saturating_duration_since(e.last_seen) < ttl);
        Ok(before - sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sweep for SessionRegistry {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn sweep(&self, now: Instant) -> GateResult<usize> {
        self.purge_idle_at(now).map_err(|_| GateError::LockPoisoned)
    }
}

/// `Set-Cookie` value for a session token.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/p; HttpOnly; SameSite=Lax")
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
