//! Command implementations for the CLI.

mod config;
#[cfg(feature = "tui")]
mod dashboard;
mod decode;
mod scan;
mod watch;

pub use config::cmd_config;
#[cfg(feature = "tui")]
pub use dashboard::cmd_dashboard;
pub use decode::cmd_decode;
pub use scan::cmd_scan;
pub use watch::{WatchArgs, cmd_watch};
