//! Watch command implementation.
//!
//! Runs a [`Session`] against a real beacon and prints every presented frame
//! until the requested count is reached, the event stream closes or Ctrl+C
//! is pressed.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use beacon_core::{ConnectionConfig, Device, DispatchOutcome, SensorFrame, Session};
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::format::{
    FormatOptions, format_frame_csv_header, format_frame_csv_line, format_frame_json,
    format_frame_line,
};
use crate::util::OutputSink;

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub device: Option<String>,
    pub count: u32,
    pub format: OutputFormat,
    pub output: Option<&'a Path>,
    pub quiet: bool,
    pub connection: ConnectionConfig,
    pub aliases: HashMap<String, String>,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_watch(args: WatchArgs<'_>) -> Result<()> {
    let WatchArgs {
        device,
        count,
        format,
        output,
        quiet,
        connection,
        aliases,
        opts,
    } = args;

    if !quiet {
        match &device {
            Some(id) => eprintln!("Connecting to {}...", id),
            None => eprintln!("Connecting to the first beacon found..."),
        }
    }

    let mut session = Session::new(move || {
        Device::new(device.clone(), connection.clone()).with_aliases(aliases.clone())
    });
    session.connect().await.context("Failed to connect")?;

    if !quiet {
        eprintln!("Connected. Press Ctrl+C to stop.");
    }

    let mut sink = OutputSink::open(output)?;
    let mut header_written = opts.no_header || sink.has_content();
    let mut frames: u32 = 0;

    let result = loop {
        if count > 0 && frames >= count {
            if !quiet {
                eprintln!("Received {} frame(s).", frames);
            }
            break Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if !quiet {
                    eprintln!("\nShutting down...");
                }
                break Ok(());
            }
            outcome = session.next_event() => match outcome {
                Some(DispatchOutcome::Presented) => {
                    let Some(frame) = session.presenter().last_frame() else {
                        continue;
                    };
                    let written = render_frame(frame, format, opts, &mut header_written)
                        .and_then(|content| sink.emit(&content));
                    if let Err(e) = written {
                        break Err(e);
                    }
                    frames += 1;
                }
                Some(DispatchOutcome::Advertisement) => {
                    debug!(text = %session.presenter().slots().temperature, "Advertisement");
                }
                Some(DispatchOutcome::Rejected) => {
                    warn!("Skipped an undecodable frame");
                }
                Some(DispatchOutcome::Dropped) => {}
                None => {
                    warn!("Event stream closed");
                    break Ok(());
                }
            },
        }
    };

    session.disconnect().await.context("Failed to disconnect")?;
    result
}

fn render_frame(
    frame: &SensorFrame,
    format: OutputFormat,
    opts: &FormatOptions,
    header_written: &mut bool,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format_frame_line(frame, opts),
        OutputFormat::Json => format_frame_json(frame, opts)?,
        OutputFormat::Csv => {
            let mut out = String::new();
            if !*header_written {
                out.push_str(&format_frame_csv_header());
                *header_written = true;
            }
            out.push_str(&format_frame_csv_line(frame));
            out
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: [u8; 12] = [0x01, 0x80, 0x02, 0x40, 0x03, 0x00, 0x0C, 0x80, 0, 0, 0, 0];

    #[test]
    fn test_csv_header_written_once() {
        let frame = SensorFrame::decode("Leafony_AC02", "desk", &REFERENCE).unwrap();
        let opts = FormatOptions::new(true);
        let mut header_written = false;

        let first = render_frame(&frame, OutputFormat::Csv, &opts, &mut header_written).unwrap();
        let second = render_frame(&frame, OutputFormat::Csv, &opts, &mut header_written).unwrap();

        assert!(first.starts_with("date_time,"));
        assert_eq!(first.lines().count(), 2);
        assert_eq!(second.lines().count(), 1);
        assert!(header_written);
    }

    #[test]
    fn test_text_line_has_no_header() {
        let frame = SensorFrame::decode("Leafony_AC02", "desk", &REFERENCE).unwrap();
        let mut header_written = false;
        let line = render_frame(
            &frame,
            OutputFormat::Text,
            &FormatOptions::new(true),
            &mut header_written,
        )
        .unwrap();
        assert!(line.contains("Leafony_AC02 (desk)"));
        assert!(!header_written);
    }
}
