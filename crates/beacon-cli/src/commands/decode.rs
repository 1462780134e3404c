//! Decode command implementation.
//!
//! Runs a hex payload through the same decoder and presenter the live
//! session uses, without any Bluetooth traffic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use beacon_core::{Presenter, RecordingSink, SensorFrame};

use crate::cli::OutputFormat;
use crate::format::{
    FormatOptions, format_frame_csv_header, format_frame_csv_line, format_frame_json,
    format_slots_text,
};
use crate::util::write_output;

/// Name shown for fields a bare payload does not carry.
const UNKNOWN: &str = "-";

pub fn cmd_decode(
    hex: &str,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let bytes = beacon_types::parse_hex(hex).context("Invalid payload")?;
    let frame = SensorFrame::decode(UNKNOWN, UNKNOWN, &bytes).context("Failed to decode frame")?;

    let content = render(&frame, format, opts)?;
    write_output(output, &content)
}

fn render(frame: &SensorFrame, format: OutputFormat, opts: &FormatOptions) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => {
            let mut presenter = Presenter::new(RecordingSink::new());
            presenter.present(frame);
            format_slots_text(presenter.slots(), opts)
        }
        OutputFormat::Json => format_frame_json(frame, opts)?,
        OutputFormat::Csv => {
            let mut out = if opts.no_header {
                String::new()
            } else {
                format_frame_csv_header()
            };
            out.push_str(&format_frame_csv_line(frame));
            out
        }
    })
}
