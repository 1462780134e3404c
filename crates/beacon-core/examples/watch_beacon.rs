//! Example: Watching a Beacon
//!
//! Connects to a logger beacon and prints every decoded frame.
//!
//! Run with: `cargo run --example watch_beacon -- [DEVICE_ADDRESS_OR_NAME]`
//! Without an argument the first beacon found is used.

use std::env;

use beacon_core::{ConnectionConfig, Device, DispatchOutcome, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let identifier = env::args().nth(1);
    match &identifier {
        Some(id) => println!("Connecting to {}...", id),
        None => println!("Connecting to the first beacon found..."),
    }

    let mut session =
        Session::new(move || Device::new(identifier.clone(), ConnectionConfig::default()));
    session.connect().await?;
    println!("Connected! Press Ctrl+C to stop.");
    println!();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            outcome = session.next_event() => match outcome {
                Some(DispatchOutcome::Presented) => {
                    let slots = session.presenter().slots();
                    println!(
                        "{}  T={} H={} L={} B={}",
                        slots.date_time, slots.temperature, slots.humidity,
                        slots.illuminance, slots.battery
                    );
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    session.disconnect().await?;
    println!("Disconnected.");
    Ok(())
}
