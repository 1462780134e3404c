//! Mock device implementation for testing.
//!
//! This module provides a mock beacon that can be used for unit testing
//! without requiring actual BLE hardware, and for the `--demo` mode of the
//! command-line tools.
//!
//! The [`MockDevice`] implements the [`BeaconDevice`] trait, allowing it to be
//! used interchangeably with real devices in generic code.
//!
//! # Features
//!
//! - **Event injection**: push notification and advertisement payloads
//! - **Failure injection**: make `connect` fail
//! - **Call tracking**: count every trait call for assertions
//! - **Synthetic feed**: generate plausible frames on a timer

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::{DeviceEvent, EventDispatcher, EventReceiver, StateUpdate};
use crate::traits::BeaconDevice;

/// Counters for calls made through the [`BeaconDevice`] trait.
#[derive(Debug, Default)]
struct CallCounters {
    connect: AtomicU32,
    disconnect: AtomicU32,
    lescan: AtomicU32,
    lestop: AtomicU32,
    disable_sleep: AtomicU32,
}

#[derive(Debug)]
struct MockState {
    name: String,
    unique_name: String,
    connected: AtomicBool,
    scanning: AtomicBool,
    sleep_disabled: AtomicBool,
    fail_connect: AtomicBool,
    calls: CallCounters,
    dispatcher: EventDispatcher,
    feed: Mutex<Option<CancellationToken>>,
}

/// A mock beacon for testing.
///
/// Clones share state, so a test can keep one handle while a
/// [`crate::Session`] owns another.
///
/// # Example
///
/// ```
/// use beacon_core::{BeaconDevice, MockDevice};
///
/// #[tokio::main]
/// async fn main() {
///     let device = MockDevice::new("Leafony_AC02");
///     let mut events = device.subscribe();
///     device.connect().await.unwrap();
///
///     device.push_frame(&[0x16, 0x80, 0x2D, 0x00, 0x01, 0xF4, 0x03, 0x33, 0, 0, 0, 0]);
///     assert!(events.recv().await.is_ok());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockDevice {
    state: Arc<MockState>,
}

impl MockDevice {
    /// Create a new mock device with a random unique name.
    pub fn new(name: &str) -> Self {
        let unique_name = format!("MOCK-{:06X}", rand::random::<u32>() % 0xFFFFFF);
        Self::with_unique_name(name, &unique_name)
    }

    /// Create a new mock device with an explicit unique name.
    pub fn with_unique_name(name: &str, unique_name: &str) -> Self {
        Self {
            state: Arc::new(MockState {
                name: name.to_string(),
                unique_name: unique_name.to_string(),
                connected: AtomicBool::new(false),
                scanning: AtomicBool::new(false),
                sleep_disabled: AtomicBool::new(false),
                fail_connect: AtomicBool::new(false),
                calls: CallCounters::default(),
                dispatcher: EventDispatcher::default(),
                feed: Mutex::new(None),
            }),
        }
    }

    /// Make subsequent `connect` calls fail (or succeed again).
    pub fn set_fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Publish a notification payload as a [`DeviceEvent::StateChange`].
    pub fn push_frame(&self, data: &[u8]) {
        self.state
            .dispatcher
            .send(DeviceEvent::StateChange(StateUpdate {
                device_name: self.state.name.clone(),
                unique_name: self.state.unique_name.clone(),
                data: data.to_vec(),
            }));
    }

    /// Publish an advertisement payload.
    pub fn push_advertisement(&self, payload: &[u8]) {
        self.state.dispatcher.send(DeviceEvent::Advertisement {
            payload: payload.to_vec(),
        });
    }

    /// Whether a passive scan is active.
    pub fn is_scanning(&self) -> bool {
        self.state.scanning.load(Ordering::SeqCst)
    }

    /// Whether the disable-sleep command has been issued.
    pub fn sleep_disabled(&self) -> bool {
        self.state.sleep_disabled.load(Ordering::SeqCst)
    }

    /// Number of live event receivers.
    pub fn listener_count(&self) -> usize {
        self.state.dispatcher.receiver_count()
    }

    /// Number of `connect` calls made.
    pub fn connect_calls(&self) -> u32 {
        self.state.calls.connect.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls made.
    pub fn disconnect_calls(&self) -> u32 {
        self.state.calls.disconnect.load(Ordering::SeqCst)
    }

    /// Number of `lescan` calls made.
    pub fn lescan_calls(&self) -> u32 {
        self.state.calls.lescan.load(Ordering::SeqCst)
    }

    /// Number of `lestop` calls made.
    pub fn lestop_calls(&self) -> u32 {
        self.state.calls.lestop.load(Ordering::SeqCst)
    }

    /// Number of `disable_sleep` calls made.
    pub fn disable_sleep_calls(&self) -> u32 {
        self.state.calls.disable_sleep.load(Ordering::SeqCst)
    }

    /// Spawn a task that pushes a synthetic frame every `period` while connected.
    ///
    /// The task stops when `cancel` is triggered or this device is
    /// disconnected. Starting a new feed stops the previous one.
    pub fn start_feed(
        &self,
        period: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let cancel = cancel.child_token();
        if let Some(previous) = self.replace_feed(Some(cancel.clone())) {
            previous.cancel();
        }
        let device = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut seq: u32 = 0;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if device.state.connected.load(Ordering::SeqCst) {
                            device.push_frame(&synthetic_frame(seq));
                            seq = seq.wrapping_add(1);
                        }
                    }
                }
            }
            debug!(name = %device.state.name, "Mock feed stopped");
        })
    }

    /// Whether a synthetic feed task is running.
    pub fn is_feeding(&self) -> bool {
        self.state
            .feed
            .lock()
            .map(|feed| feed.as_ref().is_some_and(|token| !token.is_cancelled()))
            .unwrap_or(false)
    }

    fn replace_feed(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        match self.state.feed.lock() {
            Ok(mut feed) => std::mem::replace(&mut *feed, token),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), token),
        }
    }
}

/// Build a plausible payload for sample number `seq`.
///
/// Values drift slowly with a little random noise: around 22 C, 45 %RH,
/// a few hundred lux and a 3.3 V battery.
pub fn synthetic_frame(seq: u32) -> Vec<u8> {
    let phase = f32::from((seq % 360) as u16).to_radians();
    let noise = || rand::random::<f32>() * 0.2 - 0.1;

    let encode = |value: f32| {
        let raw = (value.clamp(0.0, 255.99) * 256.0) as u16;
        raw.to_be_bytes()
    };

    let temperature = encode(22.0 + 2.0 * phase.sin() + noise());
    let humidity = encode(45.0 + 5.0 * phase.cos() + noise());
    let illuminance = (300.0 + 200.0 * phase.sin()).max(0.0) as u16;
    let battery = encode(3.3 - 0.0001 * seq as f32);
    let timestamp = (1_700_000_000u32.wrapping_add(seq)).to_le_bytes();

    let mut frame = Vec::with_capacity(beacon_types::MIN_FRAME_BYTES);
    frame.extend_from_slice(&temperature);
    frame.extend_from_slice(&humidity);
    frame.extend_from_slice(&illuminance.to_be_bytes());
    frame.extend_from_slice(&battery);
    frame.extend_from_slice(&timestamp);
    frame
}

#[async_trait]
impl BeaconDevice for MockDevice {
    async fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<()> {
        self.state.calls.connect.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(Error::device_not_found(self.state.name.clone()));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.calls.disconnect.fetch_add(1, Ordering::SeqCst);
        if let Some(feed) = self.replace_feed(None) {
            feed.cancel();
        }
        self.state.connected.store(false, Ordering::SeqCst);
        self.state.scanning.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn lescan(&self) -> Result<()> {
        self.state.calls.lescan.fetch_add(1, Ordering::SeqCst);
        self.state.scanning.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn lestop(&self) -> Result<()> {
        self.state.calls.lestop.fetch_add(1, Ordering::SeqCst);
        self.state.scanning.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn disable_sleep(&self) -> Result<()> {
        self.state.calls.disable_sleep.fetch_add(1, Ordering::SeqCst);
        self.state.sleep_disabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> Option<String> {
        Some(self.state.name.clone())
    }

    fn unique_name(&self) -> Option<String> {
        Some(self.state.unique_name.clone())
    }

    fn subscribe(&self) -> EventReceiver {
        self.state.dispatcher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::SensorSample;

    #[tokio::test]
    async fn test_mock_connect_disconnect() {
        let device = MockDevice::new("Leafony");
        assert!(!device.is_connected().await);

        device.connect().await.unwrap();
        assert!(device.is_connected().await);
        assert_eq!(device.connect_calls(), 1);

        device.disconnect().await.unwrap();
        assert!(!device.is_connected().await);
        assert_eq!(device.disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_fail_connect() {
        let device = MockDevice::new("Leafony");
        device.set_fail_connect(true);

        assert!(device.connect().await.is_err());
        assert!(!device.is_connected().await);

        device.set_fail_connect(false);
        assert!(device.connect().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_clones_share_state() {
        let device = MockDevice::with_unique_name("Leafony", "desk");
        let handle = device.clone();

        device.lescan().await.unwrap();
        assert!(handle.is_scanning());

        handle.lestop().await.unwrap();
        assert!(!device.is_scanning());
        assert_eq!(device.lescan_calls(), 1);
        assert_eq!(device.lestop_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_push_frame_reaches_subscriber() {
        let device = MockDevice::with_unique_name("Leafony", "desk");
        let mut rx = device.subscribe();

        device.push_frame(&[0; 12]);

        match rx.recv().await.unwrap() {
            DeviceEvent::StateChange(update) => {
                assert_eq!(update.device_name, "Leafony");
                assert_eq!(update.unique_name, "desk");
                assert_eq!(update.data.len(), 12);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_mock_unique_name_format() {
        let device = MockDevice::new("Leafony");
        let unique = device.unique_name().unwrap();
        assert!(unique.starts_with("MOCK-"));
    }

    #[test]
    fn test_synthetic_frame_decodes() {
        for seq in [0, 1, 90, 359, 10_000] {
            let frame = synthetic_frame(seq);
            let sample = SensorSample::from_bytes(&frame).unwrap();
            assert!((19.0..25.0).contains(&sample.temperature));
            assert!((39.0..51.0).contains(&sample.humidity));
            assert!(sample.battery_voltage > 2.0);
            assert_eq!(sample.timestamp, 1_700_000_000 + seq);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_only_pushes_while_connected() {
        let device = MockDevice::new("Leafony");
        let mut rx = device.subscribe();
        let cancel = CancellationToken::new();
        let handle = device.start_feed(Duration::from_millis(100), cancel.clone());

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(rx.try_recv().is_err());

        device.connect().await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_ok());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_feed() {
        let device = MockDevice::new("Leafony");
        let cancel = CancellationToken::new();
        let handle = device.start_feed(Duration::from_millis(100), cancel.clone());
        device.connect().await.unwrap();
        assert!(device.is_feeding());

        device.disconnect().await.unwrap();
        assert!(!device.is_feeding());
        handle.await.unwrap();
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_feed_stops_previous() {
        let device = MockDevice::new("Leafony");
        let cancel = CancellationToken::new();
        let first = device.start_feed(Duration::from_millis(100), cancel.clone());
        let second = device.start_feed(Duration::from_millis(100), cancel.clone());

        first.await.unwrap();
        assert!(device.is_feeding());

        cancel.cancel();
        second.await.unwrap();
        assert!(!device.is_feeding());
    }
}
