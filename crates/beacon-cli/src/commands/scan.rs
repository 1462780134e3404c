//! Scan command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use beacon_core::{ScanOptions, scan};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{FormatOptions, format_scan_csv, format_scan_json, format_scan_text};
use crate::util::write_output;

pub async fn cmd_scan(
    timeout: Option<u64>,
    format: OutputFormat,
    all: bool,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let duration = config.scan_timeout(timeout);
    if !quiet && matches!(format, OutputFormat::Text) {
        eprintln!("Scanning for beacons... ({}s)", duration.as_secs());
    }

    let options = ScanOptions::default()
        .duration(duration)
        .filter_beacon_only(!all);

    let devices = scan::scan_with_options(options)
        .await
        .context("Failed to scan for devices")?;

    let content = match format {
        OutputFormat::Text => format_scan_text(&devices, opts, &config.aliases),
        OutputFormat::Json => format_scan_json(&devices, opts, &config.aliases)?,
        OutputFormat::Csv => format_scan_csv(&devices, opts, &config.aliases),
    };

    write_output(output, &content)
}
