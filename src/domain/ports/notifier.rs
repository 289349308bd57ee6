//! Port for publishing domain events to real-time rooms.
//!
//! Delivery is best-effort at-least-once with no acknowledgment or retry;
//! ordering holds only within a single room connection. A disconnected
//! recipient simply misses the event. Publishes happen strictly after the
//! triggering store write has committed.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ids::RideId;

/// Event emitted when a driver accepts a booking.
pub const EVENT_BOOKING_ACCEPTED: &str = "booking.accepted";
/// Event emitted on every ride status transition.
pub const EVENT_RIDE_STATUS: &str = "ride.status";
/// Event emitted when a payment settles against a booking.
pub const EVENT_PAYMENT_SETTLED: &str = "payment.settled";

/// Room key for everyone participating in a ride.
pub fn ride_room(id: &RideId) -> String {
    format!("ride:{id}")
}

/// Errors raised by publish adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifierError {
    /// The channel backend refused the publish.
    #[error("notifier backend failure: {message}")]
    Backend { message: String },
}

impl NotifierError {
    /// Create a backend error with the given message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Port for the room-scoped publish channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish an event to a room.
    async fn publish(&self, room: &str, event: &str, payload: Value) -> Result<(), NotifierError>;
}

/// Fixture notifier that drops every event; useful for wiring the engine
/// without a real-time channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn publish(
        &self,
        _room: &str,
        _event: &str,
        _payload: Value,
    ) -> Result<(), NotifierError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn room_keys_are_scoped_by_ride() {
        let id = RideId::random();
        assert_eq!(ride_room(&id), format!("ride:{id}"));
    }

    #[rstest]
    #[tokio::test]
    async fn null_notifier_swallows_events() {
        NullNotifier
            .publish("ride:1", EVENT_RIDE_STATUS, serde_json::json!({}))
            .await
            .expect("publish succeeds");
    }
}
