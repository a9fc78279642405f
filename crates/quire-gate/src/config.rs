use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits on password attempts per publication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Attempts allowed per identifier within one window.
    pub max_attempts: u32,
    /// Length of the counting window, in seconds.
    pub window_secs: u64,
    /// How often expired entries are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_secs: 15 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl ThrottleConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ThrottleConfig::default();
        assert_eq!(c.max_attempts, 5);
        assert_eq!(c.window(), Duration::from_secs(900));
        assert_eq!(c.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn zero_sweep_interval_is_clamped() {
        let c = ThrottleConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(c.sweep_interval(), Duration::from_secs(1));
    }
}
