//! Command-line interface for the STM32/Leafony logger beacon.
//!
//! The `beacon` binary scans for beacons, decodes payloads, prints live
//! frames and hosts a terminal dashboard.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Scan for nearby beacons |
//! | `decode` | Decode a notification payload given as hex |
//! | `watch` | Connect and print every frame |
//! | `dashboard` | Interactive terminal dashboard |
//! | `config` | Manage CLI configuration and unique-name aliases |
//! | `completions` | Generate shell completions |
//!
//! # Output Formats
//!
//! - **Text** (default): Human-readable colored output
//! - **JSON**: Machine-readable JSON format
//! - **CSV**: Comma-separated values for spreadsheets
//!
//! # Configuration
//!
//! Settings live in `~/.config/logger-beacon/config.toml` (or platform
//! equivalent), or in the file named by `--config` / `BEACON_CONFIG`:
//!
//! ```toml
//! device = "Leafony_AC02"
//! scan_timeout = 5
//! connect_timeout = 15
//! disable_sleep_command = "53 4C 50 30"
//!
//! [aliases]
//! "AA:BB:CC:DD:EE:FF" = "desk"
//! ```
//!
//! # Environment Variables
//!
//! - `BEACON_DEVICE`: Default device (overridden by `--device`)
//! - `BEACON_CONFIG`: Configuration file path
//! - `NO_COLOR`: Disable colored output when set
//!
//! # Examples
//!
//! ```bash
//! beacon scan
//! beacon decode "01 80 02 40 03 00 0C 80 00 00 00 00"
//! beacon watch --device Leafony_AC02 --format csv --output frames.csv
//! beacon dashboard --demo
//! ```

pub use beacon_core;
pub use beacon_types;

#[cfg(feature = "tui")]
pub mod tui;
