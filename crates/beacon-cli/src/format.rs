//! Output formatting utilities for text, JSON, and CSV output.

use std::collections::HashMap;

use anyhow::Result;
use beacon_core::presenter::format_value;
use beacon_core::{DiscoveredDevice, DisplaySlots, SensorFrame, format_timestamp};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            no_header: false,
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Serialize value to a pretty JSON string.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)? + "\n")
    }

    fn paint_name(&self, name: &str) -> String {
        if self.no_color {
            name.to_string()
        } else {
            format!("{}", name.cyan())
        }
    }
}

/// Escape a string for CSV output (RFC 4180 compliant)
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Find the configured unique name for a discovered device.
///
/// Keys are matched case-insensitively against the identifier, the address
/// and the advertised name.
pub fn alias_for<'a>(
    aliases: &'a HashMap<String, String>,
    device: &DiscoveredDevice,
) -> Option<&'a str> {
    let candidates = [
        Some(device.identifier.as_str()),
        Some(device.address.as_str()),
        device.name.as_deref(),
    ];
    candidates.into_iter().flatten().find_map(|candidate| {
        aliases
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(candidate))
            .map(|(_, name)| name.as_str())
    })
}

// ============================================================================
// Scan formatting
// ============================================================================

#[must_use]
pub fn format_scan_text(
    devices: &[DiscoveredDevice],
    opts: &FormatOptions,
    aliases: &HashMap<String, String>,
) -> String {
    use tabled::settings::Style;
    use tabled::{Table, Tabled};

    if devices.is_empty() {
        return "No beacons found.\n".to_string();
    }

    #[derive(Tabled)]
    struct DeviceRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Unique Name")]
        unique_name: String,
        #[tabled(rename = "Signal")]
        signal: String,
        #[tabled(rename = "Identifier")]
        identifier: String,
    }

    let rows: Vec<DeviceRow> = devices
        .iter()
        .map(|d| DeviceRow {
            name: opts.paint_name(d.name.as_deref().unwrap_or("Unknown")),
            unique_name: alias_for(aliases, d).unwrap_or("-").to_string(),
            signal: d
                .rssi
                .map(|r| format!("{} dBm", r))
                .unwrap_or_else(|| "N/A".to_string()),
            identifier: d.identifier.clone(),
        })
        .collect();

    let count = if opts.no_color {
        devices.len().to_string()
    } else {
        format!("{}", devices.len().to_string().green().bold())
    };

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("Found {} device(s)\n\n{}\n", count, table)
}

pub fn format_scan_json(
    devices: &[DiscoveredDevice],
    opts: &FormatOptions,
    aliases: &HashMap<String, String>,
) -> Result<String> {
    #[derive(Serialize)]
    struct ScanResult<'a> {
        count: usize,
        devices: Vec<DeviceJson<'a>>,
    }

    #[derive(Serialize)]
    struct DeviceJson<'a> {
        name: Option<&'a str>,
        unique_name: Option<&'a str>,
        address: &'a str,
        identifier: &'a str,
        rssi: Option<i16>,
        is_beacon: bool,
    }

    let result = ScanResult {
        count: devices.len(),
        devices: devices
            .iter()
            .map(|d| DeviceJson {
                name: d.name.as_deref(),
                unique_name: alias_for(aliases, d),
                address: &d.address,
                identifier: &d.identifier,
                rssi: d.rssi,
                is_beacon: d.is_beacon,
            })
            .collect(),
    };

    opts.as_json(&result)
}

#[must_use]
pub fn format_scan_csv(
    devices: &[DiscoveredDevice],
    opts: &FormatOptions,
    aliases: &HashMap<String, String>,
) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        "name,unique_name,address,identifier,rssi,is_beacon\n".to_string()
    };
    for device in devices {
        output.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_escape(device.name.as_deref().unwrap_or("")),
            csv_escape(alias_for(aliases, device).unwrap_or("")),
            csv_escape(&device.address),
            csv_escape(&device.identifier),
            device.rssi.map(|r| r.to_string()).unwrap_or_default(),
            device.is_beacon
        ));
    }
    output
}

// ============================================================================
// Frame formatting
// ============================================================================

/// Render the display slots as an aligned two-column block.
#[must_use]
pub fn format_slots_text(slots: &DisplaySlots, opts: &FormatOptions) -> String {
    let rows = slots.rows();
    let width = rows.iter().map(|(caption, _)| caption.len()).max().unwrap_or(0);

    let mut output = String::new();
    for (caption, value) in rows {
        let padded = format!("{:<width$}", caption, width = width);
        let caption = if opts.no_color {
            padded
        } else {
            format!("{}", padded.bold())
        };
        output.push_str(&format!("{}  {}\n", caption, value));
    }
    output
}

/// Format one frame as a single watch line.
#[must_use]
pub fn format_frame_line(frame: &SensorFrame, opts: &FormatOptions) -> String {
    format!(
        "{}  {} ({})  T {}  H {}  L {}  B {}\n",
        format_timestamp(frame.timestamp()),
        opts.paint_name(&frame.device_name),
        frame.unique_name,
        format_value(frame.temperature()),
        format_value(frame.humidity()),
        frame.illuminance(),
        format_value(frame.battery_voltage()),
    )
}

pub fn format_frame_json(frame: &SensorFrame, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct FrameJson<'a> {
        #[serde(flatten)]
        frame: &'a SensorFrame,
        date_time: String,
    }

    opts.as_json(&FrameJson {
        frame,
        date_time: format_timestamp(frame.timestamp()),
    })
}

/// Get the CSV header for frame output.
#[must_use]
pub fn format_frame_csv_header() -> String {
    "date_time,device_name,unique_name,temperature,humidity,illuminance,battery_voltage,timestamp\n"
        .to_string()
}

/// Format a frame as a CSV line (no header).
#[must_use]
pub fn format_frame_csv_line(frame: &SensorFrame) -> String {
    format!(
        "{},{},{},{},{},{},{},{}\n",
        csv_escape(&format_timestamp(frame.timestamp())),
        csv_escape(&frame.device_name),
        csv_escape(&frame.unique_name),
        format_value(frame.temperature()),
        format_value(frame.humidity()),
        frame.illuminance(),
        format_value(frame.battery_voltage()),
        frame.timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE_FRAME: [u8; 12] = [
        0x01, 0x80, 0x02, 0x40, 0x03, 0x00, 0x0C, 0x80, 0x00, 0x00, 0x00, 0x00,
    ];

    fn frame() -> SensorFrame {
        SensorFrame::decode("Leafony_AC02", "desk", &REFERENCE_FRAME).unwrap()
    }

    fn plain() -> FormatOptions {
        FormatOptions::new(true)
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_scan_text_empty() {
        let output = format_scan_text(&[], &plain(), &HashMap::new());
        assert_eq!(output, "No beacons found.\n");
    }

    #[test]
    fn test_scan_csv_empty_has_header_only() {
        let output = format_scan_csv(&[], &plain(), &HashMap::new());
        assert_eq!(output, "name,unique_name,address,identifier,rssi,is_beacon\n");

        let output = format_scan_csv(&[], &plain().with_no_header(true), &HashMap::new());
        assert!(output.is_empty());
    }

    #[test]
    fn test_scan_json_empty() {
        let output = format_scan_json(&[], &plain(), &HashMap::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["count"], 0);
        assert!(value["devices"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_frame_line_plain() {
        let line = format_frame_line(&frame(), &plain());
        assert!(line.starts_with(&format_timestamp(0)));
        assert!(line.contains("Leafony_AC02 (desk)"));
        assert!(line.contains("T 1.5  H 2.25  L 768  B 12.5"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_frame_line_colored_wraps_name() {
        let line = format_frame_line(&frame(), &FormatOptions::new(false));
        assert!(line.contains("\u{1b}["));
    }

    #[test]
    fn test_frame_json_is_flat() {
        let output = format_frame_json(&frame(), &plain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["device_name"], "Leafony_AC02");
        assert_eq!(value["unique_name"], "desk");
        assert_eq!(value["temperature"], 1.5);
        assert_eq!(value["illuminance"], 768);
        assert_eq!(value["timestamp"], 0);
        assert_eq!(value["date_time"], format_timestamp(0));
    }

    #[test]
    fn test_frame_csv() {
        let header = format_frame_csv_header();
        let line = format_frame_csv_line(&frame());
        assert_eq!(header.split(',').count(), line.split(',').count());
        assert!(line.ends_with(",Leafony_AC02,desk,1.5,2.25,768,12.5,0\n"));
    }

    #[test]
    fn test_slots_text_aligns_captions() {
        let slots = DisplaySlots {
            temperature: "1.5".to_string(),
            ..Default::default()
        };
        let output = format_slots_text(&slots, &plain());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("Device Name "));
        assert_eq!(lines[3], "Temperature      1.5");
        // Captions share a column width.
        assert_eq!(lines[6].find("  ").unwrap(), "Battery Voltage".len());
    }
}
