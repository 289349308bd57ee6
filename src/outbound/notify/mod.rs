//! In-process fan-out implementation of the `Notifier` port.
//!
//! Rooms map onto `tokio::sync::broadcast` channels so any number of
//! subscribers (websocket sessions, test probes) can observe events for a
//! ride. Publishing to a room nobody listens to is a no-op, matching the
//! fire-and-forget contract of the port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::ports::{Notifier, NotifierError};

/// One event delivered to a room's subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub room: String,
    pub event: String,
    pub payload: serde_json::Value,
}

const ROOM_CHANNEL_CAPACITY: usize = 64;

/// Broadcast bus keyed by room name.
#[derive(Clone, Default)]
pub struct RoomBus {
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<RoomEvent>>>>,
}

impl RoomBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a room, creating its channel on first use.
    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.rooms.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rooms
            .entry(room.to_owned())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn sender_for(&self, room: &str) -> Option<broadcast::Sender<RoomEvent>> {
        let rooms = self.rooms.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rooms.get(room).cloned()
    }
}

#[async_trait]
impl Notifier for RoomBus {
    async fn publish(
        &self,
        room: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifierError> {
        if let Some(sender) = self.sender_for(room) {
            // A send error only means every receiver is gone; that is fine
            // for fire-and-forget delivery.
            let _ = sender.send(RoomEvent {
                room: room.to_owned(),
                event: event.to_owned(),
                payload,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn subscribers_receive_events_for_their_room() {
        let bus = RoomBus::new();
        let mut rx = bus.subscribe("ride:abc");

        bus.publish("ride:abc", "ride.status", json!({ "status": "in-progress" }))
            .await
            .expect("publish succeeds");

        let event = rx.recv().await.expect("event delivered");
        assert_eq!(event.event, "ride.status");
        assert_eq!(event.payload, json!({ "status": "in-progress" }));
    }

    #[rstest]
    #[tokio::test]
    async fn publishing_to_an_empty_room_is_a_no_op() {
        let bus = RoomBus::new();
        bus.publish("ride:nobody", "ride.status", json!({}))
            .await
            .expect("publish succeeds without subscribers");
    }

    #[rstest]
    #[tokio::test]
    async fn rooms_are_isolated_from_each_other() {
        let bus = RoomBus::new();
        let mut other = bus.subscribe("ride:other");

        bus.publish("ride:abc", "ride.status", json!({}))
            .await
            .expect("publish succeeds");

        assert!(matches!(
            other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
