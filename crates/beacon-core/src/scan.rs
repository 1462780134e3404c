//! Device discovery and scanning.
//!
//! This module finds logger beacons using Bluetooth Low Energy. A scan is a
//! single pass: nothing here retries when a beacon is missed.

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::util::{addresses_match, create_identifier, format_peripheral_id, is_placeholder_address};
use beacon_types::uuid::{BEACON_SERVICE, DEVICE_NAME_PREFIX};

/// Information about a discovered device.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// The advertised name (e.g., "Leafony_AC02").
    pub name: Option<String>,
    /// The peripheral ID for connecting.
    pub id: PeripheralId,
    /// The BLE address as a string (may be zeros on macOS, use `id` instead).
    pub address: String,
    /// A connection identifier (peripheral ID on macOS, address on other platforms).
    pub identifier: String,
    /// RSSI signal strength.
    pub rssi: Option<i16>,
    /// Whether the device looks like a logger beacon.
    pub is_beacon: bool,
    /// First manufacturer data payload from the advertisement, if any.
    pub manufacturer_data: Option<Vec<u8>>,
}

/// Options for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for devices.
    pub duration: Duration,
    /// Only return devices that appear to be logger beacons.
    pub filter_beacon_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            filter_beacon_only: true,
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set scan duration in seconds.
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Duration::from_secs(secs);
        self
    }

    /// Set whether to filter for beacons only.
    pub fn filter_beacon_only(mut self, filter: bool) -> Self {
        self.filter_beacon_only = filter;
        self
    }

    /// Scan for all BLE devices, not just beacons.
    pub fn all_devices(self) -> Self {
        self.filter_beacon_only(false)
    }
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for devices with custom options.
pub async fn scan_with_options(options: ScanOptions) -> Result<Vec<DiscoveredDevice>> {
    let adapter = get_adapter().await?;
    scan_with_adapter(&adapter, options).await
}

/// Scan for devices using a specific adapter.
pub async fn scan_with_adapter(
    adapter: &Adapter,
    options: ScanOptions,
) -> Result<Vec<DiscoveredDevice>> {
    info!(
        "Starting BLE scan for {} seconds...",
        options.duration.as_secs()
    );

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let peripherals = adapter.peripherals().await?;
    let mut discovered = Vec::new();

    for peripheral in peripherals {
        match process_peripheral(&peripheral, options.filter_beacon_only).await {
            Ok(Some(device)) => {
                debug!("Found device: {:?}", device.name);
                discovered.push(device);
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Error processing peripheral: {}", e);
            }
        }
    }

    info!("Scan complete. Found {} device(s)", discovered.len());
    Ok(discovered)
}

async fn process_peripheral(
    peripheral: &Peripheral,
    filter_beacon_only: bool,
) -> Result<Option<DiscoveredDevice>> {
    let Some(properties) = peripheral.properties().await? else {
        return Ok(None);
    };

    let is_beacon = is_beacon_device(&properties);
    if filter_beacon_only && !is_beacon {
        return Ok(None);
    }

    let id = peripheral.id();
    let address = properties.address.to_string();
    let identifier = create_identifier(&address, &id);
    let manufacturer_data = properties.manufacturer_data.values().next().cloned();

    Ok(Some(DiscoveredDevice {
        name: properties.local_name.clone(),
        id,
        address,
        identifier,
        rssi: properties.rssi,
        is_beacon,
        manufacturer_data,
    }))
}

/// Check if a peripheral looks like a logger beacon.
///
/// Matches on the advertised vendor service or on the firmware's name prefix.
pub fn is_beacon_device(properties: &PeripheralProperties) -> bool {
    if properties.services.contains(&BEACON_SERVICE)
        || properties.service_data.contains_key(&BEACON_SERVICE)
    {
        return true;
    }

    properties
        .local_name
        .as_deref()
        .is_some_and(is_beacon_name)
}

/// Whether an advertised name carries the beacon firmware's prefix.
pub fn is_beacon_name(name: &str) -> bool {
    name.to_lowercase()
        .starts_with(&DEVICE_NAME_PREFIX.to_lowercase())
}

/// Check whether a peripheral matches a user-supplied identifier.
///
/// The identifier may be a peripheral ID (macOS), a MAC address, or a
/// case-insensitive substring of the advertised name.
pub fn peripheral_matches(
    properties: &PeripheralProperties,
    peripheral_id: &PeripheralId,
    identifier: &str,
) -> bool {
    let identifier_lower = identifier.to_lowercase();
    let formatted_id = format_peripheral_id(peripheral_id).to_lowercase();

    if formatted_id == identifier_lower {
        debug!("Matched by peripheral ID: {}", formatted_id);
        return true;
    }

    let address = properties.address.to_string();
    if !is_placeholder_address(&address) && addresses_match(&address, identifier) {
        debug!("Matched by address: {}", address);
        return true;
    }

    if let Some(name) = &properties.local_name
        && name.to_lowercase().contains(&identifier_lower)
    {
        debug!("Matched by name: {}", name);
        return true;
    }

    false
}

/// Find a device by name, address or peripheral ID.
///
/// Peripherals already known to the adapter are checked first; otherwise a
/// single scan of `options.duration` is performed.
pub async fn find_device_with_options(
    identifier: &str,
    options: ScanOptions,
) -> Result<(Adapter, Peripheral)> {
    let adapter = get_adapter().await?;
    info!("Looking for device: {}", identifier);

    let matcher = |props: &PeripheralProperties, id: &PeripheralId| {
        peripheral_matches(props, id, identifier)
    };

    if let Some(peripheral) = first_matching(&adapter, &matcher).await? {
        info!("Found device in cache (no scan needed)");
        return Ok((adapter, peripheral));
    }

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    match first_matching(&adapter, &matcher).await? {
        Some(peripheral) => Ok((adapter, peripheral)),
        None => Err(Error::device_not_found(identifier)),
    }
}

/// Find the first beacon in range when no identifier was given.
pub async fn find_first_beacon(options: ScanOptions) -> Result<(Adapter, Peripheral)> {
    let adapter = get_adapter().await?;
    info!("Looking for any beacon...");

    let matcher = |props: &PeripheralProperties, _: &PeripheralId| is_beacon_device(props);

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    match first_matching(&adapter, &matcher).await? {
        Some(peripheral) => Ok((adapter, peripheral)),
        None => Err(Error::DeviceNotFound(DeviceNotFoundReason::NoDevicesInRange)),
    }
}

async fn first_matching<F>(adapter: &Adapter, matcher: &F) -> Result<Option<Peripheral>>
where
    F: Fn(&PeripheralProperties, &PeripheralId) -> bool,
{
    for peripheral in adapter.peripherals().await? {
        if let Ok(Some(props)) = peripheral.properties().await
            && matcher(&props, &peripheral.id())
        {
            return Ok(Some(peripheral));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(name: Option<&str>) -> PeripheralProperties {
        PeripheralProperties {
            local_name: name.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_scan_options_builder() {
        let opts = ScanOptions::new().duration_secs(12).all_devices();
        assert_eq!(opts.duration, Duration::from_secs(12));
        assert!(!opts.filter_beacon_only);

        let opts = ScanOptions::default();
        assert_eq!(opts.duration, Duration::from_secs(5));
        assert!(opts.filter_beacon_only);
    }

    #[test]
    fn test_is_beacon_name() {
        assert!(is_beacon_name("Leafony_AC02"));
        assert!(is_beacon_name("leafony"));
        assert!(!is_beacon_name("Thermo 12345"));
    }

    #[test]
    fn test_is_beacon_device_by_name() {
        assert!(is_beacon_device(&properties(Some("Leafony_AC02"))));
        assert!(!is_beacon_device(&properties(Some("Headphones"))));
        assert!(!is_beacon_device(&properties(None)));
    }

    #[test]
    fn test_is_beacon_device_by_service() {
        let mut props = properties(None);
        props.services.push(BEACON_SERVICE);
        assert!(is_beacon_device(&props));
    }
}
