//! Terminal dashboard for a logger beacon.
//!
//! Shows the seven display slots and the three chart panels of a single
//! [`Session`](beacon_core::Session). The page-load scan starts immediately;
//! `c` connects and `d` disconnects.

pub mod app;
pub mod charts;
pub mod input;
pub mod ui;

pub use app::App;
pub use charts::TerminalCharts;

use std::collections::HashMap;
use std::io::{self, stdout};
use std::time::Duration;

use anyhow::Result;
use beacon_core::{ConnectionConfig, Device, DeviceFactory, MockDevice};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::info;

use input::Action;

/// Advertised name of the simulated beacon.
pub const DEMO_DEVICE_NAME: &str = "Leafony_DEMO";

/// Interval between simulated frames.
pub const DEMO_PERIOD: Duration = Duration::from_secs(1);

/// How long to wait for terminal input before pumping events again.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the dashboard should connect to.
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    /// Beacon name, address or peripheral ID; `None` picks the first beacon.
    pub device: Option<String>,
    pub connection: ConnectionConfig,
    /// Identifier to unique-name mapping.
    pub aliases: HashMap<String, String>,
    /// Use a simulated beacon instead of Bluetooth.
    pub demo: bool,
}

/// Set up the terminal for TUI rendering.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the dashboard until the user quits.
pub async fn run(options: DashboardOptions) -> Result<()> {
    if options.demo {
        info!("Starting dashboard in demo mode");
        let cancel = CancellationToken::new();
        let feed_cancel = cancel.clone();
        let result = run_with(move || demo_device(&feed_cancel)).await;
        cancel.cancel();
        result
    } else {
        let DashboardOptions {
            device,
            connection,
            aliases,
            ..
        } = options;
        info!(?device, "Starting dashboard");
        run_with(move || {
            Device::new(device.clone(), connection.clone()).with_aliases(aliases.clone())
        })
        .await
    }
}

/// A simulated beacon with its own feed.
///
/// The feed task ends when the session disconnects this wrapper or `cancel`
/// fires, so replaced wrappers do not leave tasks behind.
fn demo_device(cancel: &CancellationToken) -> MockDevice {
    let device = MockDevice::new(DEMO_DEVICE_NAME);
    drop(device.start_feed(DEMO_PERIOD, cancel.clone()));
    device
}

async fn run_with<F: DeviceFactory>(factory: F) -> Result<()> {
    let mut app = App::new(factory);
    let mut terminal = setup_terminal()?;

    app.start().await;
    let result = run_event_loop(&mut terminal, &mut app).await;
    app.shutdown().await;

    restore_terminal()?;
    result
}

async fn run_event_loop<F: DeviceFactory>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<F>,
) -> Result<()> {
    while !app.should_quit() {
        app.tick();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = input::handle_key_event(key);
            if action == Action::Connect && app.session().controls().connect_visible {
                // connect() holds the loop until it resolves.
                app.set_status("Connecting...");
                terminal.draw(|f| ui::draw(f, app))?;
            }
            app.apply(action).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::SessionState;

    #[test]
    fn test_terminal_functions_exist() {
        let _ = restore_terminal;
        let _ = setup_terminal;
    }

    #[test]
    fn test_default_options_use_bluetooth() {
        let options = DashboardOptions::default();
        assert!(!options.demo);
        assert!(options.device.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_factory_feeds_while_connected() {
        let cancel = CancellationToken::new();
        let feed_cancel = cancel.clone();
        let mut app = App::new(move || demo_device(&feed_cancel));

        app.apply(Action::Connect).await;
        assert_eq!(app.session().state(), SessionState::Connected);

        let outcome = app.session_mut().next_event().await;
        assert!(outcome.is_some());
        assert_eq!(
            app.session().presenter().slots().device_name,
            DEMO_DEVICE_NAME
        );
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_stops_replaced_feed() {
        let cancel = CancellationToken::new();
        let feed_cancel = cancel.clone();
        let mut app = App::new(move || demo_device(&feed_cancel));

        app.apply(Action::Connect).await;
        let first = app.session().device().clone();
        assert!(first.is_feeding());

        app.apply(Action::Disconnect).await;
        assert!(!first.is_feeding());
        assert!(app.session().device().is_feeding());

        app.apply(Action::Connect).await;
        app.apply(Action::Disconnect).await;
        assert!(app.session().device().is_feeding());
        assert!(!cancel.is_cancelled());
        cancel.cancel();
        assert!(!app.session().device().is_feeding());
    }
}
