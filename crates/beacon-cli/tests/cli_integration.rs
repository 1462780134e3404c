//! CLI Integration Tests
//!
//! These tests run the `beacon` binary for commands that need no Bluetooth
//! adapter. Hardware tests are marked with #[ignore].
//!
//! Run hardware tests:
//! ```
//! BEACON_DEVICE="Leafony_AC02" cargo test --package beacon-cli --test cli_integration -- --ignored --nocapture
//! ```

use std::env;
use std::path::Path;
use std::process::{Command, Output};

const REFERENCE_HEX: &str = "01 80 02 40 03 00 0C 80 00 00 00 00";

/// Run beacon with an isolated config file
fn run_beacon(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_beacon"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("BEACON_DEVICE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run beacon binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn get_device() -> Option<String> {
    env::var("BEACON_DEVICE").ok().filter(|s| !s.is_empty())
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(&dir.path().join("config.toml"), &["--help"]);

    assert!(output.status.success(), "Help should succeed");
    let text = stdout(&output);
    for command in ["scan", "decode", "watch", "dashboard", "config", "completions"] {
        assert!(text.contains(command), "Help should list {}", command);
    }
}

#[test]
fn test_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(&dir.path().join("config.toml"), &["--version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_text() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(
        &dir.path().join("config.toml"),
        &["--no-color", "decode", REFERENCE_HEX],
    );

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Temperature      1.5"));
    assert!(text.contains("Humidity         2.25"));
    assert!(text.contains("Illuminance      768"));
    assert!(text.contains("Battery Voltage  12.5"));
}

#[test]
fn test_decode_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(
        &dir.path().join("config.toml"),
        &["decode", "0180024003000C8000000000", "--format", "json"],
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["temperature"], 1.5);
    assert_eq!(value["humidity"], 2.25);
    assert_eq!(value["illuminance"], 768);
    assert_eq!(value["battery_voltage"], 12.5);
    assert_eq!(value["timestamp"], 0);
}

#[test]
fn test_decode_csv_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("frame.csv");
    let output = run_beacon(
        &dir.path().join("config.toml"),
        &[
            "decode",
            REFERENCE_HEX,
            "--format",
            "csv",
            "--output",
            out_path.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    let content = std::fs::read_to_string(&out_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("date_time,device_name"));
    assert!(lines[1].ends_with(",1.5,2.25,768,12.5,0"));
}

#[test]
fn test_decode_short_payload_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(&dir.path().join("config.toml"), &["decode", "01 80 02"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("requires 12 bytes"), "stderr: {}", stderr);
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_path_honors_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    let output = run_beacon(&config, &["config", "path"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), config.display().to_string());
}

#[test]
fn test_config_alias_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = run_beacon(&config, &["config", "set-alias", "AA:BB:CC:DD:EE:FF", "desk"]);
    assert!(output.status.success());
    assert!(config.exists());

    let shown = stdout(&run_beacon(&config, &["config", "show"]));
    assert!(shown.contains("[aliases]"));
    assert!(shown.contains("desk"));

    let output = run_beacon(&config, &["config", "rm-alias", "aa:bb:cc:dd:ee:ff"]);
    assert!(output.status.success());

    let shown = stdout(&run_beacon(&config, &["config", "show"]));
    assert!(!shown.contains("desk"));
}

// =============================================================================
// Completions
// =============================================================================

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(&dir.path().join("config.toml"), &["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("beacon"));
}

// =============================================================================
// Hardware Tests
// =============================================================================

#[test]
#[ignore = "requires BLE hardware"]
fn test_scan_finds_beacon() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(
        &dir.path().join("config.toml"),
        &["scan", "--timeout", "10", "--format", "json"],
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(value["count"].as_u64().unwrap() > 0, "No beacons found");
}

#[test]
#[ignore = "requires BLE hardware"]
fn test_watch_prints_frames() {
    let Some(device) = get_device() else {
        eprintln!("BEACON_DEVICE not set, skipping");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let output = run_beacon(
        &dir.path().join("config.toml"),
        &["watch", "--device", &device, "-n", "2", "--format", "csv"],
    );

    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 3);
}
