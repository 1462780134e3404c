//! Dashboard command implementation.

use std::collections::HashMap;

use anyhow::Result;
use beacon_cli::tui::{self, DashboardOptions};
use beacon_core::ConnectionConfig;

pub async fn cmd_dashboard(
    device: Option<String>,
    connection: ConnectionConfig,
    aliases: HashMap<String, String>,
    demo: bool,
) -> Result<()> {
    tui::run(DashboardOptions {
        device,
        connection,
        aliases,
        demo,
    })
    .await
}
