//! Hardware integration tests for beacon-core
//!
//! These tests require a powered logger beacon in range and should be run with:
//! ```text
//! cargo test --package beacon-core --test hardware_tests -- --ignored --nocapture
//! ```
//!
//! Set `BEACON_DEVICE` to a name, MAC address or peripheral ID to target a
//! specific beacon. Without it the first beacon found is used.

use std::env;
use std::time::Duration;

use beacon_core::scan::{ScanOptions, scan_with_options};
use beacon_core::{ConnectionConfig, Device, DispatchOutcome, Session, SessionState};
use tokio::time::timeout;

/// Default timeout for BLE operations
const BLE_TIMEOUT: Duration = Duration::from_secs(30);

fn get_device() -> Option<String> {
    env::var("BEACON_DEVICE").ok().filter(|s| !s.is_empty())
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_scan_finds_beacon() {
    let options = ScanOptions::default().duration_secs(10);

    let devices = match timeout(BLE_TIMEOUT, scan_with_options(options)).await {
        Ok(Ok(devices)) => devices,
        Ok(Err(e)) => panic!("Scan failed: {}", e),
        Err(_) => panic!("Scan timed out after {:?}", BLE_TIMEOUT),
    };

    println!("Found {} beacon(s)", devices.len());
    for device in &devices {
        println!(
            "  {} ({}) rssi={:?}",
            device.name.as_deref().unwrap_or("Unknown"),
            device.identifier,
            device.rssi
        );
        assert!(device.is_beacon);
    }
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_session_receives_frames() {
    let identifier = get_device();
    let mut session =
        Session::new(move || Device::new(identifier.clone(), ConnectionConfig::default()));

    match timeout(BLE_TIMEOUT, session.connect()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Failed to connect: {}", e),
        Err(_) => panic!("Connection timed out after {:?}", BLE_TIMEOUT),
    }
    assert_eq!(session.state(), SessionState::Connected);

    let mut presented = 0;
    while presented < 3 {
        match timeout(BLE_TIMEOUT, session.next_event()).await {
            Ok(Some(DispatchOutcome::Presented)) => {
                presented += 1;
                println!("{:?}", session.presenter().slots());
            }
            Ok(Some(other)) => println!("Event: {:?}", other),
            Ok(None) => panic!("Event channel closed"),
            Err(_) => panic!("No frame within {:?}", BLE_TIMEOUT),
        }
    }

    assert_eq!(session.presenter().series().temperature.len(), 3);
    session.disconnect().await.expect("disconnect");
    assert_eq!(session.state(), SessionState::Disconnected);
}
