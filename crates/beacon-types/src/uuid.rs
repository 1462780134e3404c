//! Bluetooth UUIDs for the logger beacon.
//!
//! The beacon firmware exposes a single vendor service with one notify
//! characteristic (sensor frames) and one write characteristic (commands).

use uuid::{Uuid, uuid};

/// Vendor service advertised by the beacon.
pub const BEACON_SERVICE: Uuid = uuid!("442f1570-8a00-9a28-cbe1-e1d4212d53eb");

/// Notify characteristic carrying sensor frames.
pub const FRAME_NOTIFY: Uuid = uuid!("442f1571-8a00-9a28-cbe1-e1d4212d53eb");

/// Write characteristic accepting ASCII commands.
pub const COMMAND_WRITE: Uuid = uuid!("442f1572-8a00-9a28-cbe1-e1d4212d53eb");

/// Advertised name prefix used by the beacon firmware.
pub const DEVICE_NAME_PREFIX: &str = "Leafony";

/// Command that keeps the beacon awake while a central is attached.
pub const DISABLE_SLEEP_COMMAND: &[u8] = b"SLP0";
