//! Application state for the dashboard.

use beacon_core::{BeaconDevice, DeviceFactory, Session, SessionState};
use tracing::{info, warn};

use super::charts::TerminalCharts;
use super::input::Action;

/// Dashboard state: one session plus what the status bar shows.
pub struct App<F: DeviceFactory> {
    session: Session<F, TerminalCharts>,
    status: String,
    should_quit: bool,
}

impl<F: DeviceFactory> App<F> {
    pub fn new(factory: F) -> Self {
        Self {
            session: Session::with_sink(factory, TerminalCharts::new()),
            status: String::new(),
            should_quit: false,
        }
    }

    pub fn session(&self) -> &Session<F, TerminalCharts> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<F, TerminalCharts> {
        &mut self.session
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Start the page-load scan.
    pub async fn start(&mut self) {
        match self.session.start().await {
            Ok(()) => self.set_status("Scanning"),
            Err(e) => {
                warn!("Start failed: {}", e);
                self.set_status(format!("Scan failed: {}", e));
            }
        }
    }

    /// Apply a user action to the session.
    ///
    /// Hidden controls are ignored, matching what the status bar offers.
    pub async fn apply(&mut self, action: Action) {
        let controls = self.session.controls();
        match action {
            Action::Connect if controls.connect_visible => {
                match self.session.connect().await {
                    Ok(()) => {
                        let name = self.session.device().name();
                        info!(?name, "Connected");
                        match name {
                            Some(name) => self.set_status(format!("Connected to {}", name)),
                            None => self.set_status("Connected"),
                        }
                    }
                    Err(e) => {
                        warn!("Connect failed: {}", e);
                        self.set_status(format!("Connect failed: {}", e));
                    }
                }
            }
            Action::Disconnect if controls.disconnect_visible => {
                match self.session.disconnect().await {
                    Ok(()) => self.set_status("Disconnected"),
                    Err(e) => {
                        warn!("Disconnect reported an error: {}", e);
                        self.set_status(format!("Disconnected ({})", e));
                    }
                }
            }
            Action::Quit => self.should_quit = true,
            Action::Connect | Action::Disconnect | Action::None => {}
        }
    }

    /// Feed pending device events to the presenter.
    pub fn tick(&mut self) -> usize {
        self.session.pump()
    }

    /// Disconnect if needed before the dashboard exits.
    pub async fn shutdown(&mut self) {
        if self.session.state() == SessionState::Connected
            && let Err(e) = self.session.disconnect().await
        {
            warn!("Disconnect on exit failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::MockDevice;
    use beacon_core::mock::synthetic_frame;

    fn app() -> App<impl DeviceFactory<Device = MockDevice>> {
        App::new(|| MockDevice::with_unique_name("Leafony_AC02", "desk"))
    }

    #[tokio::test]
    async fn test_start_enters_scanning() {
        let mut app = app();
        app.start().await;
        assert_eq!(app.session().state(), SessionState::Scanning);
        assert_eq!(app.status(), "Scanning");
    }

    #[tokio::test]
    async fn test_connect_then_frames_reach_charts() {
        let mut app = app();
        app.apply(Action::Connect).await;
        assert_eq!(app.session().state(), SessionState::Connected);
        assert_eq!(app.status(), "Connected to Leafony_AC02");

        app.session().device().push_frame(&synthetic_frame(0));
        app.session().device().push_frame(&synthetic_frame(1));
        assert_eq!(app.tick(), 2);
        assert_eq!(app.session().presenter().series().temperature.len(), 2);
    }

    #[tokio::test]
    async fn test_hidden_controls_are_ignored() {
        let mut app = app();
        app.apply(Action::Disconnect).await;
        assert_eq!(app.session().state(), SessionState::Disconnected);
        assert_eq!(app.session().device().disconnect_calls(), 0);

        app.apply(Action::Connect).await;
        app.apply(Action::Connect).await;
        assert_eq!(app.session().device().connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_sets_status() {
        let mut app = App::new(|| {
            let device = MockDevice::new("Leafony");
            device.set_fail_connect(true);
            device
        });
        app.apply(Action::Connect).await;
        assert_eq!(app.session().state(), SessionState::Disconnected);
        assert!(app.status().starts_with("Connect failed"));
    }

    #[tokio::test]
    async fn test_disconnect_and_quit() {
        let mut app = app();
        app.apply(Action::Connect).await;
        app.apply(Action::Disconnect).await;
        assert_eq!(app.session().state(), SessionState::Disconnected);
        assert_eq!(app.status(), "Disconnected");

        app.apply(Action::Quit).await;
        assert!(app.should_quit());
    }
}
