//! Chain, wait and homing configuration from TOML.

use heapless::String;
use serde::Deserialize;

/// Default interval between on-target polls.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// Default timeout for a commanded move to reach its target.
pub const DEFAULT_MOTION_TIMEOUT_MS: u32 = 60_000;

/// Default timeout for a reference move.
pub const DEFAULT_HOMING_TIMEOUT_MS: u32 = 120_000;

/// How the chain master is discovered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    /// Optional enumeration mask passed to the driver (for example a controller model).
    #[serde(default)]
    pub descriptor_filter: Option<String<32>>,
}

/// On-target polling for commanded moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WaitConfig {
    /// Delay between two on-target polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u32,

    /// Give up after this long. `0` waits forever.
    ///
    /// With `std` this is wall-clock time including driver round trips.
    /// Without it, only the sleeps between polls are counted.
    #[serde(default = "default_motion_timeout")]
    pub timeout_ms: u32,
}

/// On-target polling for the reference move during open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HomingConfig {
    /// Give up after this long. `0` waits forever.
    #[serde(default = "default_homing_timeout")]
    pub timeout_ms: u32,
}

fn default_poll_interval() -> u32 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_motion_timeout() -> u32 {
    DEFAULT_MOTION_TIMEOUT_MS
}

fn default_homing_timeout() -> u32 {
    DEFAULT_HOMING_TIMEOUT_MS
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_MOTION_TIMEOUT_MS,
        }
    }
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_HOMING_TIMEOUT_MS,
        }
    }
}

impl WaitConfig {
    /// Timeout, or `None` when waits are unbounded.
    pub fn timeout(&self) -> Option<u32> {
        (self.timeout_ms > 0).then_some(self.timeout_ms)
    }
}

impl HomingConfig {
    /// Timeout, or `None` when waits are unbounded.
    pub fn timeout(&self) -> Option<u32> {
        (self.timeout_ms > 0).then_some(self.timeout_ms)
    }
}

/// Sleeps between polls that fit in the timeout, at least one.
pub(crate) fn max_polls(timeout_ms: Option<u32>, poll_interval_ms: u32) -> Option<u32> {
    timeout_ms.map(|t| (t / poll_interval_ms.max(1)).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_defaults() {
        let config = WaitConfig::default();
        assert_eq!(config.poll_interval_ms, 10);
        assert_eq!(config.timeout(), Some(60_000));
        assert_eq!(max_polls(config.timeout(), config.poll_interval_ms), Some(6_000));
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let config = WaitConfig {
            poll_interval_ms: 5,
            timeout_ms: 0,
        };
        assert_eq!(config.timeout(), None);
        assert_eq!(max_polls(config.timeout(), config.poll_interval_ms), None);
    }

    #[test]
    fn test_max_polls_rounds_down_but_keeps_one() {
        assert_eq!(max_polls(Some(25), 10), Some(2));
        assert_eq!(max_polls(Some(3), 10), Some(1));
    }
}
