//! Per-publication password attempt throttling.
//!
//! Fixed windows: the first attempt for an identifier (or the first after its
//! window expired) opens a new window of [`ThrottleConfig::window`] and counts
//! as attempt 1. Further attempts inside the window are allowed until the
//! count reaches `max_attempts`; after that every attempt is denied until the
//! window expires. Outcomes of verification do not matter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use quire_types::PublicationId;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::ThrottleConfig;
use crate::error::{GateError, GateResult};

#[derive(Clone, Copy, Debug)]
struct Window {
    attempts: u32,
    expires_at: Instant,
}

/// Process-wide attempt counters keyed by publication identifier.
#[derive(Debug)]
pub struct AttemptThrottle {
    max_attempts: u32,
    window: Duration,
    entries: Mutex<HashMap<PublicationId, Window>>,
}

impl AttemptThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: config.window(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> GateResult<MutexGuard<'_, HashMap<PublicationId, Window>>> {
        self.entries.lock().map_err(|_| GateError::LockPoisoned)
    }

    /// Record an attempt for `id` now; `false` means the attempt is denied.
    pub fn allow_attempt(&self, id: &PublicationId) -> GateResult<bool> {
        self.allow_attempt_at(id, Instant::now())
    }

    /// Record an attempt for `id` at `now`.
    pub fn allow_attempt_at(&self, id: &PublicationId, now: Instant) -> GateResult<bool> {
        let mut entries = self.entries()?;

        if let Some(w) = entries.get_mut(id) {
            if now < w.expires_at {
                if w.attempts >= self.max_attempts {
                    warn!(id = %id, attempts = w.attempts, "password attempt throttled");
                    return Ok(false);
                }
                w.attempts += 1;
                return Ok(true);
            }
        }

        entries.insert(
            *id,
            Window {
                attempts: 1,
                expires_at: now + self.window,
            },
        );
        Ok(self.max_attempts >= 1)
    }

    /// Attempts counted for `id` in its current window, if it has one.
    pub fn attempts(&self, id: &PublicationId) -> GateResult<Option<u32>> {
        Ok(self.entries()?.get(id).map(|w| w.attempts))
    }

    /// Drop every entry whose window has expired by `now`.
    pub fn purge_expired_at(&self, now: Instant) -> GateResult<usize> {
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|_, w| now < w.expires_at);
        Ok(before - entries.len())
    }

    pub fn purge_expired(&self) -> GateResult<usize> {
        self.purge_expired_at(Instant::now())
    }

    /// Number of identifiers currently tracked.
    pub fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ephemeral state that a periodic sweep keeps bounded.
pub trait Sweep: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Remove stale entries; returns how many were dropped.
    fn sweep(&self, now: Instant) -> GateResult<usize>;
}

impl Sweep for AttemptThrottle {
    fn name(&self) -> &'static str {
        "throttle"
    }

    fn sweep(&self, now: Instant) -> GateResult<usize> {
        self.purge_expired_at(now)
    }
}

/// Run every target's sweep once per `interval`, forever.
///
/// Missed ticks are skipped rather than bunched up. Errors are logged and
/// the loop continues.
pub async fn sweep_task(targets: Vec<Arc<dyn Sweep>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let now = Instant::now();
        for target in &targets {
            match target.sweep(now) {
                Ok(0) => {}
                Ok(dropped) => debug!(target = target.name(), dropped, "swept expired entries"),
                Err(e) => warn!(target = target.name(), error = %e, "sweep failed"),
            }
        }
    }
}

/// Spawn [`sweep_task`] on the current tokio runtime.
pub fn spawn_sweeper(targets: Vec<Arc<dyn Sweep>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(sweep_task(targets, interval))
}
