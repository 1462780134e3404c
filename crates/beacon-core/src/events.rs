//! Device event system for notification and advertisement delivery.
//!
//! A device wrapper publishes [`DeviceEvent`]s on a broadcast channel. Every
//! listener holds its own receiver, so dropping a receiver is all it takes to
//! stop delivery to that listener.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A raw notification payload together with the identity of its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Advertised or connected device name.
    pub device_name: String,
    /// Application-assigned name for the device.
    pub unique_name: String,
    /// Raw notification bytes.
    pub data: Vec<u8>,
}

/// Events that can be emitted by a device wrapper.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum DeviceEvent {
    /// A sensor notification arrived on the connected link.
    StateChange(StateUpdate),
    /// A broadcast advertisement payload was received.
    Advertisement {
        /// Raw manufacturer payload.
        payload: Vec<u8>,
    },
}

/// Which listener an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`DeviceEvent::StateChange`].
    StateChange,
    /// [`DeviceEvent::Advertisement`].
    Advertisement,
}

impl DeviceEvent {
    /// The listener kind this event is delivered to.
    pub fn kind(&self) -> EventKind {
        match self {
            DeviceEvent::StateChange(_) => EventKind::StateChange,
            DeviceEvent::Advertisement { .. } => EventKind::Advertisement,
        }
    }
}

/// Sender for device events.
pub type EventSender = broadcast::Sender<DeviceEvent>;

/// Receiver for device events.
pub type EventReceiver = broadcast::Receiver<DeviceEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: DeviceEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind() {
        let event = DeviceEvent::Advertisement {
            payload: b"hi".to_vec(),
        };
        assert_eq!(event.kind(), EventKind::Advertisement);

        let event = DeviceEvent::StateChange(StateUpdate {
            device_name: "Leafony".to_string(),
            unique_name: "desk".to_string(),
            data: vec![0; 12],
        });
        assert_eq!(event.kind(), EventKind::StateChange);
    }

    #[tokio::test]
    async fn test_dispatcher_fan_out() {
        let dispatcher = EventDispatcher::default();
        let mut rx1 = dispatcher.subscribe();
        let mut rx2 = dispatcher.subscribe();
        assert_eq!(dispatcher.receiver_count(), 2);

        dispatcher.send(DeviceEvent::Advertisement {
            payload: vec![1, 2, 3],
        });

        assert_eq!(rx1.recv().await.unwrap().kind(), EventKind::Advertisement);
        assert_eq!(rx2.recv().await.unwrap().kind(), EventKind::Advertisement);
    }

    #[test]
    fn test_dropped_receiver_stops_counting() {
        let dispatcher = EventDispatcher::default();
        let rx = dispatcher.subscribe();
        assert_eq!(dispatcher.receiver_count(), 1);
        drop(rx);
        assert_eq!(dispatcher.receiver_count(), 0);

        // Sending with no receivers is not an error
        dispatcher.send(DeviceEvent::Advertisement { payload: vec![] });
    }

    #[test]
    fn test_event_serialization() {
        let event = DeviceEvent::Advertisement {
            payload: vec![0x41],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"advertisement\""));
    }
}
