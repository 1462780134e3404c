//! Utility functions for CLI operations.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Destination for output written piece by piece, such as watch lines.
pub enum OutputSink {
    Stdout(io::Stdout),
    File(File),
}

impl OutputSink {
    /// Open `output` for appending, or stdout when `None`.
    pub fn open(output: Option<&Path>) -> Result<Self> {
        match output {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Ok(Self::File(file))
            }
            None => Ok(Self::Stdout(io::stdout())),
        }
    }

    /// Whether output goes to an existing, non-empty file.
    pub fn has_content(&self) -> bool {
        match self {
            Self::File(file) => file.metadata().map(|m| m.len() > 0).unwrap_or(false),
            Self::Stdout(_) => false,
        }
    }

    /// Write `content` and flush it.
    pub fn emit(&mut self, content: &str) -> Result<()> {
        match self {
            Self::Stdout(out) => {
                let mut lock = out.lock();
                lock.write_all(content.as_bytes())?;
                lock.flush()?;
            }
            Self::File(file) => {
                file.write_all(content.as_bytes())
                    .context("Failed to write output file")?;
                file.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_output_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.csv");

        let mut sink = OutputSink::open(Some(&path)).unwrap();
        assert!(!sink.has_content());
        sink.emit("a\n").unwrap();
        drop(sink);

        let mut sink = OutputSink::open(Some(&path)).unwrap();
        assert!(sink.has_content());
        sink.emit("b\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }
}
