//! Error types for beacon-core.
//!
//! This module defines all error types that can occur when talking to the
//! logger beacon over Bluetooth Low Energy or driving a [`crate::Session`].
//!
//! Connection failures are surfaced to the caller as-is. Nothing in this
//! crate retries or reconnects on its own.

use std::time::Duration;

use thiserror::Error;

use crate::session::SessionState;

/// Errors that can occur when communicating with the beacon.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// Required BLE characteristic not found on device.
    #[error("Characteristic not found: {uuid} (searched in {service_count} services)")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: String,
        /// Number of services that were searched.
        service_count: usize,
    },

    /// A notification payload did not match the frame layout.
    #[error("Invalid frame: expected at least {expected} bytes, got {actual}")]
    InvalidFrame {
        /// Minimum frame size.
        expected: usize,
        /// Actual payload size.
        actual: usize,
    },

    /// Failed to parse data received from device or user.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// A session action is not allowed in the current state.
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        /// The state the session was in.
        from: SessionState,
        /// The rejected action.
        action: &'static str,
    },
}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// No beacons found during scan.
    NoDevicesInRange,
    /// Device with specified name/address not found.
    NotFound { identifier: String },
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDevicesInRange => write!(f, "no beacons in range"),
            Self::NotFound { identifier } => write!(f, "device '{}' not found", identifier),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a device not found error for a specific identifier.
    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound {
            identifier: identifier.into(),
        })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl Into<String>, service_count: usize) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.into(),
            service_count,
        }
    }
}

impl From<beacon_types::ParseError> for Error {
    fn from(err: beacon_types::ParseError) -> Self {
        match err {
            beacon_types::ParseError::InsufficientBytes { expected, actual } => {
                Error::InvalidFrame { expected, actual }
            }
            beacon_types::ParseError::InvalidHex(msg) => Error::InvalidData(msg),
            // Handle future ParseError variants (non_exhaustive)
            _ => Error::InvalidData(format!("Parse error: {}", err)),
        }
    }
}

/// Result type alias using beacon-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::device_not_found("Leafony_AC02");
        assert!(err.to_string().contains("Leafony_AC02"));

        let err = Error::characteristic_not_found("442f1571", 3);
        assert!(err.to_string().contains("442f1571"));
        assert!(err.to_string().contains("3 services"));

        let err = Error::timeout("connect", Duration::from_secs(15));
        assert!(err.to_string().contains("connect"));
        assert!(err.to_string().contains("15s"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::InvalidTransition {
            from: SessionState::Connected,
            action: "connect",
        };
        assert_eq!(err.to_string(), "Cannot connect while connected");
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = beacon_types::ParseError::InsufficientBytes {
            expected: 12,
            actual: 4,
        }
        .into();
        assert!(matches!(
            err,
            Error::InvalidFrame {
                expected: 12,
                actual: 4
            }
        ));

        let err: Error = beacon_types::ParseError::InvalidHex("zz".to_string()).into();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_device_not_found_reasons() {
        let err = Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter);
        assert!(err.to_string().contains("no Bluetooth adapter"));

        let err = Error::DeviceNotFound(DeviceNotFoundReason::NoDevicesInRange);
        assert!(err.to_string().contains("no beacons in range"));
    }

    #[test]
    fn test_btleplug_error_conversion() {
        fn _assert_from_impl<T: From<btleplug::Error>>() {}
        _assert_from_impl::<Error>();
    }
}
