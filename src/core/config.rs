//! # Host configuration.
//!
//! Provides [`HostConfig`] centralized settings for one [`Host`](crate::Host).
//!
//! ## Sentinel values
//! - `stop_timeout = 0s` → wait for the exit confirmation forever (never escalate to kill)
//! - `bus_capacity` is clamped to a minimum of 1

use std::time::Duration;

/// Global configuration for a host.
///
/// ## Field semantics
/// - `stop_timeout`: how long a stop (or the teardown inside a restart) waits after
///   `Terminate` before sending `Kill` (`0s` = never escalate)
/// - `bus_capacity`: ring buffer size of the broadcast stream used by async subscribers
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Maximum time to wait for a terminated child to exit before killing it.
    ///
    /// The entry keeps waiting for the exit confirmation after the kill; `stopped`
    /// is still published only once the process is gone.
    pub stop_timeout: Duration,

    /// Capacity of the bus broadcast ring buffer.
    ///
    /// Async subscribers that lag behind more than `bus_capacity` events skip the
    /// oldest ones. Minimum value is 1 (clamped).
    pub bus_capacity: usize,
}

impl HostConfig {
    /// Returns the kill escalation timeout as an `Option`.
    ///
    /// - `None` → never escalate
    /// - `Some(d)` → send `Kill` after `d`
    #[inline]
    pub fn stop_timeout(&self) -> Option<Duration> {
        if self.stop_timeout == Duration::ZERO {
            None
        } else {
            Some(self.stop_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for HostConfig {
    /// Default configuration:
    ///
    /// - `stop_timeout = 5s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(5),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stop_timeout_means_no_escalation() {
        let cfg = HostConfig {
            stop_timeout: Duration::ZERO,
            ..HostConfig::default()
        };
        assert_eq!(cfg.stop_timeout(), None);
        assert_eq!(
            HostConfig::default().stop_timeout(),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = HostConfig {
            bus_capacity: 0,
            ..HostConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
