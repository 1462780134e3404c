//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Reusable device selection arguments
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// Beacon name, MAC address or peripheral ID, or use BEACON_DEVICE env var
    #[arg(short, long, env = "BEACON_DEVICE")]
    pub device: Option<String>,

    /// Connection timeout in seconds (overrides config)
    #[arg(short = 'T', long)]
    pub timeout: Option<u64>,
}

#[derive(Parser)]
#[command(name = "beacon")]
#[command(author, version, about = "CLI for the STM32/Leafony logger beacon", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Use this configuration file instead of the default location
    #[arg(long, global = true, env = "BEACON_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan for nearby beacons
    Scan {
        /// Scan timeout in seconds (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// List every BLE device, not only beacons
        #[arg(short, long)]
        all: bool,
    },

    /// Decode a notification payload given as hex
    Decode {
        /// Payload bytes, e.g. "0180024003000C8000000000" or "01:80:02:40:..."
        hex: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Connect to a beacon and print every frame
    Watch {
        #[command(flatten)]
        device: DeviceArgs,

        /// Number of frames to print before exiting (0 for unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Omit header row in CSV output (useful for appending)
        #[arg(long)]
        no_header: bool,
    },

    /// Launch the interactive terminal dashboard
    #[cfg(feature = "tui")]
    Dashboard {
        #[command(flatten)]
        device: DeviceArgs,

        /// Use a simulated beacon instead of Bluetooth
        #[arg(long)]
        demo: bool,

        /// Write logs to this file while the dashboard is running
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Show current configuration
    Show,

    /// Map a device identifier to the unique name shown for it
    SetAlias {
        /// Device name, MAC address or peripheral ID
        identifier: String,
        /// Unique name to display (e.g., "desk", "greenhouse")
        name: String,
    },

    /// Remove an alias
    #[command(alias = "rm-alias")]
    RemoveAlias {
        /// Device identifier the alias was set for
        identifier: String,
    },
}
