//! Config command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::util::write_output;

pub fn cmd_config(
    action: ConfigAction,
    path: &Path,
    config: &Config,
    output: Option<&PathBuf>,
    quiet: bool,
) -> Result<()> {
    match action {
        ConfigAction::Path => write_output(output, &format!("{}\n", path.display())),
        ConfigAction::Show => {
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            write_output(output, &content)
        }
        ConfigAction::SetAlias { identifier, name } => {
            let identifier = identifier.trim();
            let name = name.trim();
            if identifier.is_empty() || name.is_empty() {
                bail!("Identifier and unique name must not be empty");
            }

            let mut updated = config.clone();
            updated
                .aliases
                .retain(|key, _| !key.eq_ignore_ascii_case(identifier));
            updated
                .aliases
                .insert(identifier.to_string(), name.to_string());
            updated.save_to(path)?;

            if !quiet {
                eprintln!("Alias set: {} -> {}", identifier, name);
            }
            Ok(())
        }
        ConfigAction::RemoveAlias { identifier } => {
            let mut updated = config.clone();
            let before = updated.aliases.len();
            updated
                .aliases
                .retain(|key, _| !key.eq_ignore_ascii_case(&identifier));
            if updated.aliases.len() == before {
                bail!("No alias set for '{}'", identifier);
            }
            updated.save_to(path)?;

            if !quiet {
                eprintln!("Alias removed: {}", identifier);
            }
            Ok(())
        }
    }
}
