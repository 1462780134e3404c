//! Connection session state machine.
//!
//! A [`Session`] owns the current device wrapper, the listeners registered
//! on it and the [`Presenter`]. It is driven from a single task: UI actions
//! call [`Session::connect`] / [`Session::disconnect`], and the event loop
//! calls [`Session::pump`] or [`Session::next_event`] to feed the presenter.
//!
//! ```text
//! Disconnected --start/lescan--> Scanning --connect--> Connected
//!      ^                            |                      |
//!      +----------lestop------------+                      |
//!      +-------------------disconnect---------------------+
//! ```

use std::collections::HashSet;
use std::fmt;

use beacon_types::SensorFrame;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{DeviceEvent, EventKind, EventReceiver};
use crate::presenter::{ChartSink, Presenter, RecordingSink};
use crate::traits::{BeaconDevice, DeviceFactory};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Scanning,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Scanning => write!(f, "scanning"),
            SessionState::Connected => write!(f, "connected"),
        }
    }
}

/// Visibility and enablement of the user controls.
///
/// Scan and stop-scan exist but are never enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub connect_visible: bool,
    pub disconnect_visible: bool,
    pub scan_enabled: bool,
    pub stop_scan_enabled: bool,
}

impl Controls {
    /// Controls for a session in `state`.
    pub fn for_state(state: SessionState) -> Self {
        let connected = state == SessionState::Connected;
        Self {
            connect_visible: !connected,
            disconnect_visible: connected,
            scan_enabled: false,
            stop_scan_enabled: false,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::for_state(SessionState::Disconnected)
    }
}

/// What happened to an event handed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A frame was decoded and presented.
    Presented,
    /// An advertisement was written to the display.
    Advertisement,
    /// The payload could not be decoded; the display is unchanged.
    Rejected,
    /// No listener is registered for this kind of event.
    Dropped,
}

/// Drives one beacon at a time.
pub struct Session<F: DeviceFactory, S = RecordingSink> {
    factory: F,
    device: F::Device,
    listeners: HashSet<EventKind>,
    events: Option<EventReceiver>,
    presenter: Presenter<S>,
    state: SessionState,
    controls: Controls,
}

impl<F: DeviceFactory> Session<F, RecordingSink> {
    /// Create a session whose charts are only recorded.
    pub fn new(factory: F) -> Self {
        Self::with_sink(factory, RecordingSink::new())
    }
}

impl<F: DeviceFactory, S: ChartSink> Session<F, S> {
    /// Create a session drawing charts into `sink`.
    pub fn with_sink(factory: F, sink: S) -> Self {
        let device = factory.create();
        Self {
            factory,
            device,
            listeners: HashSet::new(),
            events: None,
            presenter: Presenter::new(sink),
            state: SessionState::Disconnected,
            controls: Controls::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn presenter(&self) -> &Presenter<S> {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut Presenter<S> {
        &mut self.presenter
    }

    /// The current device wrapper.
    pub fn device(&self) -> &F::Device {
        &self.device
    }

    /// Whether a listener for `kind` is registered.
    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.listeners.contains(&kind)
    }

    fn enter(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Session state change");
        }
        self.state = state;
        self.controls = Controls::for_state(state);
    }

    fn register_listeners(&mut self) {
        self.listeners
            .extend([EventKind::StateChange, EventKind::Advertisement]);
        self.events = Some(self.device.subscribe());
    }

    fn deregister_listeners(&mut self) {
        self.listeners.clear();
        self.events = None;
    }

    /// Clear the display and start a passive scan.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(Error::InvalidTransition {
                from: self.state,
                action: "start",
            });
        }
        self.presenter.reset();
        self.device.lescan().await?;
        self.enter(SessionState::Scanning);
        Ok(())
    }

    /// Connect to the beacon.
    ///
    /// On failure the listeners are removed again and the state is unchanged.
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == SessionState::Connected {
            return Err(Error::InvalidTransition {
                from: self.state,
                action: "connect",
            });
        }

        self.presenter.reset();
        self.register_listeners();

        let result = match self.device.disable_sleep().await {
            Ok(()) => self.device.connect().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(error = %e, "Connect failed");
            self.deregister_listeners();
            return Err(e);
        }

        info!(
            device = ?self.device.name(),
            unique = ?self.device.unique_name(),
            "Session connected"
        );
        self.enter(SessionState::Connected);
        Ok(())
    }

    /// Disconnect and replace the wrapper with a fresh one.
    ///
    /// The transition completes even when the wrapper reports an error while
    /// disconnecting; that error is returned afterwards.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::InvalidTransition {
                from: self.state,
                action: "disconnect",
            });
        }

        self.deregister_listeners();
        let result = self.device.disconnect().await;
        self.device = self.factory.create();
        self.enter(SessionState::Disconnected);
        info!("Session disconnected");
        result
    }

    /// Start a passive scan on the current wrapper.
    pub async fn lescan(&mut self) -> Result<()> {
        self.device.lescan().await?;
        if self.state == SessionState::Disconnected {
            self.enter(SessionState::Scanning);
        }
        Ok(())
    }

    /// Stop a passive scan on the current wrapper.
    pub async fn lestop(&mut self) -> Result<()> {
        self.device.lestop().await?;
        if self.state == SessionState::Scanning {
            self.enter(SessionState::Disconnected);
        }
        Ok(())
    }

    /// Route `event` to its listener.
    pub fn dispatch(&mut self, event: DeviceEvent) -> DispatchOutcome {
        let kind = event.kind();
        if !self.listeners.contains(&kind) {
            debug!(?kind, "No listener registered, dropping event");
            return DispatchOutcome::Dropped;
        }

        match event {
            DeviceEvent::StateChange(update) => {
                match SensorFrame::decode(update.device_name, update.unique_name, &update.data) {
                    Ok(frame) => {
                        self.presenter.present(&frame);
                        DispatchOutcome::Presented
                    }
                    Err(e) => {
                        warn!(error = %e, "Discarding undecodable notification");
                        DispatchOutcome::Rejected
                    }
                }
            }
            DeviceEvent::Advertisement { payload } => {
                self.presenter.on_advertisement(&payload);
                DispatchOutcome::Advertisement
            }
        }
    }

    /// Handle every event already waiting, without blocking.
    ///
    /// Events are handled in arrival order. Returns the number of events
    /// that reached a listener.
    pub fn pump(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(events) = self.events.as_mut() {
            loop {
                match events.try_recv() {
                    Ok(event) => pending.push(event),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Listener lagged behind");
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }

        pending
            .into_iter()
            .map(|event| self.dispatch(event))
            .filter(|outcome| *outcome != DispatchOutcome::Dropped)
            .count()
    }

    /// Wait for the next event and handle it.
    ///
    /// Returns `None` when no listener is registered or the wrapper's event
    /// channel has closed.
    pub async fn next_event(&mut self) -> Option<DispatchOutcome> {
        loop {
            let events = self.events.as_mut()?;
            match events.recv().await {
                Ok(event) => match self.dispatch(event) {
                    DispatchOutcome::Dropped => {}
                    outcome => return Some(outcome),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Listener lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl<F: DeviceFactory, S> fmt::Debug for Session<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("controls", &self.controls)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
