//! Trait abstractions for beacon device operations.
//!
//! This module provides the [`BeaconDevice`] trait that abstracts over
//! the real Bluetooth wrapper and the mock device used for testing.

use async_trait::async_trait;

use crate::error::Result;
use crate::events::EventReceiver;

/// Trait abstracting a beacon device session wrapper.
///
/// A wrapper owns one link to one beacon. It publishes notifications and
/// advertisements as [`crate::DeviceEvent`]s; callers obtain receivers with
/// [`subscribe`](Self::subscribe).
///
/// # Example
///
/// ```ignore
/// use beacon_core::{BeaconDevice, Result};
///
/// async fn attach<D: BeaconDevice>(device: &D) -> Result<()> {
///     let mut events = device.subscribe();
///     device.disable_sleep().await?;
///     device.connect().await?;
///     while let Ok(event) = events.recv().await {
///         println!("{:?}", event);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BeaconDevice: Send + Sync {
    // --- Connection Management ---

    /// Check if the device is connected.
    async fn is_connected(&self) -> bool;

    /// Connect to the beacon and start forwarding notifications.
    async fn connect(&self) -> Result<()>;

    /// Disconnect from the beacon and stop all forwarding tasks.
    async fn disconnect(&self) -> Result<()>;

    // --- Scanning ---

    /// Start a passive scan, forwarding advertisement payloads.
    async fn lescan(&self) -> Result<()>;

    /// Stop a passive scan started with [`lescan`](Self::lescan).
    async fn lestop(&self) -> Result<()>;

    // --- Commands ---

    /// Ask the beacon to stay awake while connected.
    ///
    /// May be called before [`connect`](Self::connect); the command is then
    /// sent as soon as the link is up.
    async fn disable_sleep(&self) -> Result<()>;

    // --- Identity & Events ---

    /// Get the device name, if known.
    fn name(&self) -> Option<String>;

    /// Get the application-assigned unique name, if known.
    fn unique_name(&self) -> Option<String>;

    /// Subscribe to this device's events.
    fn subscribe(&self) -> EventReceiver;
}

/// Builds fresh device wrappers for a [`crate::Session`].
///
/// A new wrapper is requested on every disconnect so that no state from the
/// previous link survives into the next one.
pub trait DeviceFactory: Send + Sync {
    /// The wrapper type produced.
    type Device: BeaconDevice;

    /// Create a new, unconnected wrapper.
    fn create(&self) -> Self::Device;
}

impl<D, F> DeviceFactory for F
where
    D: BeaconDevice,
    F: Fn() -> D + Send + Sync,
{
    type Device = D;

    fn create(&self) -> D {
        self()
    }
}
