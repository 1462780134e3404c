//! Core BLE session library for the logger beacon.
//!
//! This crate talks to the STM32/Leafony logger beacon over Bluetooth Low
//! Energy, decodes its notification frames and keeps the display model
//! (text slots plus chart series) for one connection session.
//!
//! # Features
//!
//! - **Device discovery**: Scan for nearby beacons via BLE
//! - **Notifications**: Forward sensor frames as [`DeviceEvent`]s
//! - **Passive scanning**: Forward advertisement payloads
//! - **Session state machine**: [`Session`] owns the wrapper, listeners and [`Presenter`]
//! - **Mock device**: [`MockDevice`] for tests and demo mode
//!
//! # Platform Differences
//!
//! - **macOS**: Devices are identified by a UUID assigned by CoreBluetooth;
//!   the reported MAC address is all zeros.
//! - **Linux/Windows**: Devices are identified by their Bluetooth MAC address.
//!
//! # Quick Start
//!
//! ```no_run
//! use beacon_core::device::{ConnectionConfig, Device};
//! use beacon_core::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new(|| Device::new(None, ConnectionConfig::default()));
//!     session.connect().await?;
//!
//!     while session.next_event().await.is_some() {
//!         println!("{:?}", session.presenter().slots());
//!     }
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod events;
pub mod mock;
pub mod presenter;
pub mod scan;
pub mod session;
pub mod traits;
pub mod util;

pub use beacon_types::types;
pub use beacon_types::uuid;

pub use device::{ConnectionConfig, Device};
pub use error::{DeviceNotFoundReason, Error, Result};
pub use events::{DeviceEvent, EventDispatcher, EventKind, EventReceiver, EventSender, StateUpdate};
pub use mock::MockDevice;
pub use presenter::{
    ChartGroup, ChartSink, Column, DisplaySlots, Presenter, RecordingSink, Series, SeriesKind,
    SeriesSet, format_timestamp, format_timestamp_in,
};
pub use scan::{DiscoveredDevice, ScanOptions};
pub use session::{Controls, DispatchOutcome, Session, SessionState};
pub use traits::{BeaconDevice, DeviceFactory};
pub use util::{create_identifier, format_peripheral_id};

pub use beacon_types::uuid as uuids;
pub use beacon_types::{ParseError, SensorFrame, SensorSample};
