//! Error types for frame decoding in beacon-types.

use thiserror::Error;

/// Errors that can occur when decoding beacon payloads.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in beacon-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload is shorter than the fixed frame layout.
    #[error("Frame requires {expected} bytes, got {actual}")]
    InsufficientBytes {
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },

    /// A textual payload (hex dump) could not be parsed.
    #[error("Invalid hex payload: {0}")]
    InvalidHex(String),
}

/// Result type alias using beacon-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
