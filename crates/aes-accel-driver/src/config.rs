//! Driver configuration
//!
//! Completion is polled every 10 ms by default, up to 500 reads per block.
//! `max_poll_attempts: None` makes the poll unbounded; the driver warns about
//! it on every job.

use aes_accel_chip::platform::DEFAULT_POLL_INTERVAL;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the poll interval, in milliseconds
pub const POLL_INTERVAL_ENV: &str = "AES_ACCEL_POLL_INTERVAL_MS";

/// Environment variable overriding the poll bound; `0` means unbounded
pub const MAX_POLLS_ENV: &str = "AES_ACCEL_MAX_POLLS";

/// Default poll bound: about 5 s at the default interval
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 500;

/// Block cipher driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Sleep between completion-state reads
    pub poll_interval: Duration,

    /// Completion-state reads allowed per block before `Timeout`
    pub max_poll_attempts: Option<u32>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: Some(DEFAULT_MAX_POLL_ATTEMPTS),
        }
    }
}

impl DriverConfig {
    /// Defaults overlaid with `AES_ACCEL_POLL_INTERVAL_MS` / `AES_ACCEL_MAX_POLLS`
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var(POLL_INTERVAL_ENV).ok().as_deref(),
            std::env::var(MAX_POLLS_ENV).ok().as_deref(),
        )
    }

    /// Apply textual overrides; unparsable values are ignored with a warning
    #[must_use]
    pub fn with_overrides(mut self, interval_ms: Option<&str>, max_polls: Option<&str>) -> Self {
        if let Some(raw) = interval_ms {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.poll_interval = Duration::from_millis(ms),
                Err(e) => warn!("Ignoring {POLL_INTERVAL_ENV}={raw:?}: {e}"),
            }
        }
        if let Some(raw) = max_polls {
            match raw.trim().parse::<u32>() {
                Ok(0) => self.max_poll_attempts = None,
                Ok(n) => self.max_poll_attempts = Some(n),
                Err(e) => warn!("Ignoring {MAX_POLLS_ENV}={raw:?}: {e}"),
            }
        }
        debug!(
            "Driver config: poll every {:?}, max polls {:?}",
            self.poll_interval, self.max_poll_attempts
        );
        self
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the poll bound (`None` = unbounded)
    #[must_use]
    pub const fn with_max_poll_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_poll_attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = DriverConfig::default();
        assert_eq!(c.poll_interval, Duration::from_millis(10));
        assert_eq!(c.max_poll_attempts, Some(500));
    }

    #[test]
    fn overrides() {
        let c = DriverConfig::default().with_overrides(Some("1"), Some("0"));
        assert_eq!(c.poll_interval, Duration::from_millis(1));
        assert_eq!(c.max_poll_attempts, None);

        let c = DriverConfig::default().with_overrides(Some("fast"), Some("20"));
        assert_eq!(c.poll_interval, Duration::from_millis(10));
        assert_eq!(c.max_poll_attempts, Some(20));
    }
}
