//! Platform-agnostic types for the logger beacon.
//!
//! This crate provides the frame layout shared by the native BLE wrapper
//! (beacon-core) and the command-line tools (beacon-cli).
//!
//! # Features
//!
//! - Bounds-checked decoder for sensor notification payloads
//! - Advertisement text decoding
//! - UUID constants for the beacon's BLE service
//! - Error types for payload parsing
//!
//! # Example
//!
//! ```
//! use beacon_types::SensorFrame;
//!
//! let payload = [0x16, 0x80, 0x2D, 0x00, 0x01, 0xF4, 0x03, 0x33, 0x00, 0x00, 0x00, 0x00];
//! let frame = SensorFrame::decode("Leafony_AC02", "desk", &payload).unwrap();
//! assert_eq!(frame.temperature(), 22.5);
//! assert_eq!(frame.illuminance(), 500);
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{
    MIN_FRAME_BYTES, SensorFrame, SensorSample, TIMESTAMP_OFFSET, advertisement_text, parse_hex,
};
pub use uuid as uuids;
