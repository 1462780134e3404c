//! Logger beacon connection over Bluetooth Low Energy.
//!
//! [`Device`] is the btleplug-backed [`BeaconDevice`]. It is created
//! unconnected; [`BeaconDevice::connect`] locates the beacon, subscribes to
//! the notify characteristic and starts forwarding notifications as
//! [`DeviceEvent::StateChange`] events.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{DeviceEvent, EventDispatcher, EventReceiver, StateUpdate};
use crate::scan::{
    ScanOptions, find_device_with_options, find_first_beacon, get_adapter, is_beacon_device,
    peripheral_matches,
};
use crate::traits::BeaconDevice;
use crate::util::{create_identifier, format_peripheral_id};
use beacon_types::uuid::{COMMAND_WRITE, DISABLE_SLEEP_COMMAND, FRAME_NOTIFY};

/// Default timeout for establishing the BLE link.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for characteristic writes.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default scan duration when looking for the beacon.
const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(5);

/// Configuration for locating and connecting to a beacon.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use beacon_core::device::ConnectionConfig;
///
/// let config = ConnectionConfig::default()
///     .connection_timeout(Duration::from_secs(20))
///     .disable_sleep_command(b"SLP0".to_vec());
/// assert_eq!(config.connection_timeout, Duration::from_secs(20));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing a BLE connection.
    pub connection_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
    /// Timeout for BLE write operations.
    pub write_timeout: Duration,
    /// How long to scan when the beacon is not already known to the adapter.
    pub scan_duration: Duration,
    /// Bytes written to the command characteristic by `disable_sleep`.
    pub disable_sleep_command: Vec<u8>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            scan_duration: DEFAULT_SCAN_DURATION,
            disable_sleep_command: DISABLE_SLEEP_COMMAND.to_vec(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new connection config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the service discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the scan duration.
    #[must_use]
    pub fn scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = duration;
        self
    }

    /// Set the disable-sleep command bytes.
    #[must_use]
    pub fn disable_sleep_command(mut self, command: Vec<u8>) -> Self {
        self.disable_sleep_command = command;
        self
    }
}

/// An established link. Dropping it stops notification forwarding.
struct Link {
    // Keeps the adapter alive for as long as the peripheral is in use.
    _adapter: Adapter,
    peripheral: Peripheral,
    write_char: Option<Characteristic>,
    notify_task: JoinHandle<()>,
}

impl Drop for Link {
    fn drop(&mut self) {
        self.notify_task.abort();
    }
}

/// A running passive scan. Dropping it stops advertisement forwarding.
struct ScanTask {
    adapter: Adapter,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for ScanTask {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

#[derive(Debug, Default, Clone)]
struct Names {
    device_name: Option<String>,
    unique_name: Option<String>,
}

/// A logger beacon reached through btleplug.
///
/// One `Device` drives one link. After `disconnect` a session discards the
/// wrapper and asks its factory for a new one.
pub struct Device {
    identifier: Option<String>,
    config: ConnectionConfig,
    aliases: HashMap<String, String>,
    dispatcher: EventDispatcher,
    link: Mutex<Option<Link>>,
    scan: Mutex<Option<ScanTask>>,
    sleep_pending: AtomicBool,
    names: RwLock<Names>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("identifier", &self.identifier)
            .field("names", &self.names)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Create an unconnected wrapper.
    ///
    /// With `identifier` set, the beacon is matched by peripheral ID, MAC
    /// address or name substring; otherwise the first beacon found is used.
    pub fn new(identifier: Option<String>, config: ConnectionConfig) -> Self {
        let names = Names {
            device_name: None,
            unique_name: identifier.clone(),
        };
        Self {
            identifier,
            config,
            aliases: HashMap::new(),
            dispatcher: EventDispatcher::default(),
            link: Mutex::new(None),
            scan: Mutex::new(None),
            sleep_pending: AtomicBool::new(false),
            names: RwLock::new(names),
        }
    }

    /// Attach an identifier-to-unique-name alias table.
    #[must_use]
    pub fn with_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        if let Some(identifier) = &self.identifier
            && let Some(alias) = lookup_alias(&aliases, identifier)
            && let Ok(mut names) = self.names.write()
        {
            names.unique_name = Some(alias);
        }
        self.aliases = aliases;
        self
    }

    /// Get the connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[tracing::instrument(level = "info", skip_all, fields(identifier = ?self.identifier))]
    async fn open_link(&self) -> Result<Link> {
        let options = ScanOptions::default()
            .duration(self.config.scan_duration)
            .all_devices();
        let (adapter, peripheral) = match &self.identifier {
            Some(identifier) => find_device_with_options(identifier, options).await?,
            None => find_first_beacon(options).await?,
        };

        info!("Connecting to beacon...");
        timeout(self.config.connection_timeout, peripheral.connect())
            .await
            .map_err(|_| Error::timeout("connect to device", self.config.connection_timeout))??;
        info!("Connected");

        timeout(self.config.discovery_timeout, peripheral.discover_services())
            .await
            .map_err(|_| Error::timeout("discover services", self.config.discovery_timeout))??;

        let service_count = peripheral.services().len();
        let characteristics = peripheral.characteristics();
        let notify_char = characteristics
            .iter()
            .find(|c| c.uuid == FRAME_NOTIFY)
            .cloned()
            .ok_or_else(|| {
                Error::characteristic_not_found(FRAME_NOTIFY.to_string(), service_count)
            })?;
        let write_char = characteristics
            .iter()
            .find(|c| c.uuid == COMMAND_WRITE)
            .cloned();
        if write_char.is_none() {
            debug!("Beacon exposes no command characteristic");
        }

        let properties = peripheral.properties().await?;
        let address = properties
            .as_ref()
            .map(|p| create_identifier(&p.address.to_string(), &peripheral.id()))
            .unwrap_or_else(|| format_peripheral_id(&peripheral.id()));
        let device_name = properties
            .as_ref()
            .and_then(|p| p.local_name.clone())
            .unwrap_or_else(|| address.clone());
        let unique_name = self.resolve_unique_name(&address, &device_name);
        info!(device_name = %device_name, unique_name = %unique_name, "Beacon identified");

        if let Ok(mut names) = self.names.write() {
            names.device_name = Some(device_name.clone());
            names.unique_name = Some(unique_name.clone());
        }

        peripheral.subscribe(&notify_char).await?;
        let mut stream = peripheral.notifications().await?;
        let dispatcher = self.dispatcher.clone();
        let notify_uuid = notify_char.uuid;
        let notify_task = tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid != notify_uuid {
                    continue;
                }
                debug!(len = notification.value.len(), "Notification received");
                dispatcher.send(DeviceEvent::StateChange(StateUpdate {
                    device_name: device_name.clone(),
                    unique_name: unique_name.clone(),
                    data: notification.value,
                }));
            }
            debug!("Notification stream ended");
        });

        Ok(Link {
            _adapter: adapter,
            peripheral,
            write_char,
            notify_task,
        })
    }

    fn resolve_unique_name(&self, address: &str, device_name: &str) -> String {
        self.identifier
            .as_deref()
            .and_then(|id| lookup_alias(&self.aliases, id))
            .or_else(|| lookup_alias(&self.aliases, address))
            .or_else(|| lookup_alias(&self.aliases, device_name))
            .or_else(|| self.identifier.clone())
            .unwrap_or_else(|| address.to_string())
    }

    async fn write_disable_sleep(&self, link: &Link) -> Result<()> {
        let characteristic = link
            .write_char
            .as_ref()
            .ok_or_else(|| Error::characteristic_not_found(COMMAND_WRITE.to_string(), 0))?;

        timeout(
            self.config.write_timeout,
            link.peripheral.write(
                characteristic,
                &self.config.disable_sleep_command,
                WriteType::WithResponse,
            ),
        )
        .await
        .map_err(|_| Error::timeout("write disable-sleep command", self.config.write_timeout))??;

        info!("Disable-sleep command sent");
        Ok(())
    }

    async fn start_scan(&self) -> Result<ScanTask> {
        let adapter = get_adapter().await?;
        let mut events = adapter.events().await?;
        adapter.start_scan(ScanFilter::default()).await?;
        info!("Passive scan started");

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let scan_adapter = adapter.clone();
        let dispatcher = self.dispatcher.clone();
        let identifier = self.identifier.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.next() => {
                        let Some(event) = event else { break };
                        let CentralEvent::ManufacturerDataAdvertisement {
                            id,
                            manufacturer_data,
                        } = event
                        else {
                            continue;
                        };
                        let Ok(peripheral) = scan_adapter.peripheral(&id).await else {
                            continue;
                        };
                        let Ok(Some(props)) = peripheral.properties().await else {
                            continue;
                        };
                        let wanted = match &identifier {
                            Some(identifier) => peripheral_matches(&props, &id, identifier),
                            None => is_beacon_device(&props),
                        };
                        if !wanted {
                            continue;
                        }
                        for payload in manufacturer_data.into_values() {
                            dispatcher.send(DeviceEvent::Advertisement { payload });
                        }
                    }
                }
            }
            debug!("Passive scan task stopped");
        });

        Ok(ScanTask {
            adapter,
            cancel,
            handle,
        })
    }
}

fn lookup_alias(aliases: &HashMap<String, String>, key: &str) -> Option<String> {
    aliases.get(key).cloned().or_else(|| {
        aliases
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
    })
}

#[async_trait]
impl BeaconDevice for Device {
    async fn is_connected(&self) -> bool {
        match self.link.lock().await.as_ref() {
            Some(link) => link.peripheral.is_connected().await.unwrap_or(false),
            None => false,
        }
    }

    async fn connect(&self) -> Result<()> {
        let mut guard = self.link.lock().await;
        if guard.is_some() {
            debug!("Already connected");
            return Ok(());
        }

        let link = self.open_link().await?;
        if self.sleep_pending.swap(false, Ordering::SeqCst)
            && let Err(e) = self.write_disable_sleep(&link).await
        {
            warn!(error = %e, "Failed to send queued disable-sleep command");
        }
        *guard = Some(link);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if let Some(scan) = self.scan.lock().await.take()
            && let Err(e) = scan.adapter.stop_scan().await
        {
            debug!(error = %e, "Failed to stop scan during disconnect");
        }

        let Some(link) = self.link.lock().await.take() else {
            debug!("Disconnect requested without a link");
            return Ok(());
        };
        info!("Disconnecting from beacon...");
        link.notify_task.abort();
        link.peripheral.disconnect().await?;
        Ok(())
    }

    async fn lescan(&self) -> Result<()> {
        let mut guard = self.scan.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        *guard = Some(self.start_scan().await?);
        Ok(())
    }

    async fn lestop(&self) -> Result<()> {
        let Some(scan) = self.scan.lock().await.take() else {
            return Ok(());
        };
        scan.cancel.cancel();
        scan.adapter.stop_scan().await?;
        info!("Passive scan stopped");
        Ok(())
    }

    async fn disable_sleep(&self) -> Result<()> {
        let guard = self.link.lock().await;
        match guard.as_ref() {
            Some(link) => self.write_disable_sleep(link).await,
            None => {
                debug!("Not connected yet, queueing disable-sleep command");
                self.sleep_pending.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn name(&self) -> Option<String> {
        self.names.read().ok().and_then(|n| n.device_name.clone())
    }

    fn unique_name(&self) -> Option<String> {
        self.names.read().ok().and_then(|n| n.unique_name.clone())
    }

    fn subscribe(&self) -> EventReceiver {
        self.dispatcher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::new()
            .connection_timeout(Duration::from_secs(3))
            .discovery_timeout(Duration::from_secs(4))
            .write_timeout(Duration::from_secs(5))
            .scan_duration(Duration::from_secs(6))
            .disable_sleep_command(vec![0x01]);

        assert_eq!(config.connection_timeout, Duration::from_secs(3));
        assert_eq!(config.discovery_timeout, Duration::from_secs(4));
        assert_eq!(config.write_timeout, Duration::from_secs(5));
        assert_eq!(config.scan_duration, Duration::from_secs(6));
        assert_eq!(config.disable_sleep_command, vec![0x01]);
    }

    #[test]
    fn test_default_disable_sleep_command() {
        assert_eq!(
            ConnectionConfig::default().disable_sleep_command,
            DISABLE_SLEEP_COMMAND
        );
    }

    #[test]
    fn test_lookup_alias_ignores_case() {
        let mut aliases = HashMap::new();
        aliases.insert("AA:BB:CC:DD:EE:FF".to_string(), "kitchen".to_string());

        assert_eq!(
            lookup_alias(&aliases, "aa:bb:cc:dd:ee:ff").as_deref(),
            Some("kitchen")
        );
        assert_eq!(lookup_alias(&aliases, "other"), None);
    }

    #[test]
    fn test_unique_name_resolution() {
        let mut aliases = HashMap::new();
        aliases.insert("Leafony_AC02".to_string(), "desk".to_string());

        let device = Device::new(None, ConnectionConfig::default()).with_aliases(aliases.clone());
        assert_eq!(device.resolve_unique_name("11:22:33:44:55:66", "Leafony_AC02"), "desk");
        assert_eq!(
            device.resolve_unique_name("11:22:33:44:55:66", "Leafony_XX"),
            "11:22:33:44:55:66"
        );

        let device = Device::new(Some("Leafony_AC02".to_string()), ConnectionConfig::default())
            .with_aliases(aliases);
        assert_eq!(device.unique_name().as_deref(), Some("desk"));
        assert_eq!(device.name(), None);
    }

    #[test]
    fn test_unique_name_defaults_to_identifier() {
        let device = Device::new(Some("AC02".to_string()), ConnectionConfig::default());
        assert_eq!(device.unique_name().as_deref(), Some("AC02"));
        assert_eq!(device.resolve_unique_name("11:22", "Leafony_AC02"), "AC02");
    }

    #[tokio::test]
    async fn test_disable_sleep_is_queued_before_connect() {
        let device = Device::new(None, ConnectionConfig::default());
        device.disable_sleep().await.unwrap();
        assert!(device.sleep_pending.load(Ordering::SeqCst));
        assert!(!device.is_connected().await);
    }

    #[tokio::test]
    async fn test_disconnect_without_link_is_noop() {
        let device = Device::new(None, ConnectionConfig::default());
        assert!(device.disconnect().await.is_ok());
        assert!(device.lestop().await.is_ok());
    }
}
