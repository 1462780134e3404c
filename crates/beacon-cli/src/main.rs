mod cli;
mod commands;
mod config;
mod format;
mod util;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::WatchArgs;
use config::{Config, resolve_device};
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "beacon", &mut io::stdout());
        return Ok(());
    }

    init_tracing(&cli)?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path);
    let opts = FormatOptions::new(cli.no_color || config.no_color);
    let quiet = cli.quiet;
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Scan {
            timeout,
            format,
            all,
        } => {
            commands::cmd_scan(timeout, format, all, output, quiet, &opts, &config).await?;
        }
        Commands::Decode { hex, format } => {
            commands::cmd_decode(&hex, format, output, &opts)?;
        }
        Commands::Watch {
            device,
            count,
            format,
            no_header,
        } => {
            let connection = config.connection_config(device.timeout)?;
            let opts = opts.with_no_header(no_header);
            commands::cmd_watch(WatchArgs {
                device: resolve_device(device.device, &config),
                count,
                format,
                output: output.map(|p| p.as_path()),
                quiet,
                connection,
                aliases: config.aliases.clone(),
                opts: &opts,
            })
            .await?;
        }
        #[cfg(feature = "tui")]
        Commands::Dashboard { device, demo, .. } => {
            let connection = config.connection_config(device.timeout)?;
            commands::cmd_dashboard(
                resolve_device(device.device, &config),
                connection,
                config.aliases.clone(),
                demo,
            )
            .await?;
        }
        Commands::Config { action } => {
            commands::cmd_config(action, &config_path, &config, output, quiet)?;
        }
        Commands::Completions { .. } => {
            // Already handled above
        }
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// Logs go to stderr, except for the dashboard, which owns the terminal and
/// logs only to `--log-file` when given.
fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    #[cfg(feature = "tui")]
    {
        use std::fs::File;
        use std::sync::Mutex;

        use anyhow::Context;

        if let Commands::Dashboard { log_file, .. } = &cli.command {
            let file_layer = match log_file {
                Some(path) => {
                    let file = File::create(path).with_context(|| {
                        format!("Failed to create log file {}", path.display())
                    })?;
                    Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                }
                None => None,
            };
            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .init();
            return Ok(());
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
    Ok(())
}
