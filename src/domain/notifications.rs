//! Fire-and-forget dispatch of domain events.
//!
//! The dispatcher runs strictly after the triggering store write has
//! committed. A failed publish is logged and swallowed: notification is a
//! side channel, never a reason to fail the request.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::ports::Notifier;

/// Shared publish façade used by every service.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over the given publish adapter.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Publish an event to a room, best-effort.
    pub async fn publish(&self, room: &str, event: &str, payload: Value) {
        if let Err(err) = self.notifier.publish(room, event, payload).await {
            warn!(room, event, error = %err, "event publish failed, recipients miss this update");
        }
    }
}
