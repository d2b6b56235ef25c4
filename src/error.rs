//! Error types for chain-stage.
//!
//! Provides unified error handling across configuration, session lifecycle and motion commands.

use heapless::String;
use thiserror::Error;

use crate::driver::{ChainAddress, DriverError, DriverOp};

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all chain-stage operations.
///
/// Nothing is retried internally: every error surfaces synchronously to the
/// caller of the failing operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// No controller could be discovered, or the chain reported no connected device.
    #[error("no controller found")]
    NoDeviceFound,

    /// A device could not be brought into a motion-ready state during open.
    #[error("device at chain address {address} failed to initialize: {stage}")]
    Initialization {
        /// Chain address of the failing device.
        address: ChainAddress,
        /// Step of the initialization sequence that failed.
        stage: InitStage,
    },

    /// Device index outside the session's device list.
    #[error("device index {index} out of range, session has {count} device(s)")]
    InvalidDeviceIndex {
        /// Requested index.
        index: usize,
        /// Number of devices in the session.
        count: usize,
    },

    /// Axis omitted, unknown, or not a logical stage axis.
    #[error("invalid axis: {0}")]
    InvalidAxis(AxisError),

    /// A driver call failed.
    #[error("driver call '{operation}' failed: {source}")]
    Communication {
        /// The driver operation that failed.
        operation: DriverOp,
        /// Error reported by the driver.
        source: DriverError,
    },

    /// A wait did not observe on-target within the configured timeout.
    #[error("device at chain address {address} not on target after {timeout_ms} ms")]
    MotionTimeout {
        /// Chain address of the device being waited on.
        address: ChainAddress,
        /// Timeout that elapsed.
        timeout_ms: u32,
    },

    /// The session was closed; no further commands are accepted.
    #[error("session is closed")]
    SessionClosed,

    /// Configuration parsing or validation error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Step of per-device initialization that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStage {
    /// Sub-connection to the chained device failed.
    #[error("connect")]
    Connect,
    /// Querying the controllable axes failed.
    #[error("axis query")]
    AxisQuery,
    /// The device reported no controllable axis.
    #[error("no controllable axis")]
    NoAxes,
    /// Reading the travel range failed.
    #[error("travel range query")]
    TravelRange,
    /// Enabling the servo loop failed.
    #[error("servo enable")]
    Servo,
    /// Triggering or polling the reference move failed.
    #[error("homing")]
    Homing,
    /// The reference move did not finish within the homing timeout.
    #[error("homing timed out")]
    HomingTimeout,
    /// The reference move finished but the controller does not report the axis as referenced.
    #[error("axis not referenced after homing")]
    NotReferenced,
}

/// Axis resolution errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AxisError {
    /// Axis omitted on a device that does not have exactly one axis.
    #[error("device {index} has {count} axes, an axis must be given")]
    Ambiguous {
        /// Device index.
        index: usize,
        /// Number of axes on the device.
        count: usize,
    },
    /// Axis not among the device's controllable axes.
    #[error("device {index} has no axis '{axis}'")]
    Unknown {
        /// Device index.
        index: usize,
        /// Requested axis.
        axis: String<8>,
    },
    /// Name is not a logical stage axis.
    #[error("'{0}' is not a stage axis")]
    UnknownName(String<8>),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    #[error("parse error: {0}")]
    ParseError(String<128>),
    /// Poll interval must be non-zero
    #[error("invalid poll interval: {0} ms, must be > 0")]
    InvalidPollInterval(u32),
    /// A timeout is shorter than one poll interval
    #[error("timeout of {timeout_ms} ms is shorter than the poll interval of {poll_interval_ms} ms")]
    TimeoutShorterThanPoll {
        /// Configured timeout.
        timeout_ms: u32,
        /// Configured poll interval.
        poll_interval_ms: u32,
    },
    /// Descriptor filter does not fit the 32-byte mask buffer
    #[error("descriptor filter of {0} bytes exceeds 32 bytes")]
    DescriptorFilterTooLong(usize),
    /// Two stage axes bound to the same device
    #[error("stage axes share device index {0}")]
    DuplicateAxisBinding(usize),
    /// File I/O error (std only)
    #[error("I/O error: {0}")]
    IoError(String<128>),
}

impl From<AxisError> for Error {
    fn from(e: AxisError) -> Self {
        Error::InvalidAxis(e)
    }
}

/// Truncate `s` into a fixed-capacity string, keeping whole characters.
pub(crate) fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_keeps_prefix() {
        let s: String<4> = truncated("abcdef");
        assert_eq!(s.as_str(), "abcd");

        let s: String<8> = truncated("xy");
        assert_eq!(s.as_str(), "xy");
    }

    #[test]
    fn test_axis_error_converts() {
        let err: Error = AxisError::Ambiguous { index: 0, count: 2 }.into();
        assert!(matches!(err, Error::InvalidAxis(AxisError::Ambiguous { .. })));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_display_messages() {
        let err = Error::InvalidDeviceIndex { index: 3, count: 2 };
        assert_eq!(err.to_string(), "device index 3 out of range, session has 2 device(s)");

        let err = Error::Initialization {
            address: ChainAddress::new(2),
            stage: InitStage::NotReferenced,
        };
        assert_eq!(
            err.to_string(),
            "device at chain address 2 failed to initialize: axis not referenced after homing"
        );
    }
}
