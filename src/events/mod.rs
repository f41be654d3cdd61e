//! Event ingestion: "user created" messages feeding the identity store.
//!
//! Processing a message never panics the loop. The [`Disposition`] decides
//! what the consumer tells the broker.

mod consumer;

pub use consumer::UserEventConsumer;

use serde::{Deserialize, Serialize};

use crate::error::{FollowError, Result};
use crate::store::UserStore;
use crate::validate::validate_username;

/// Payload published when a user is created elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    pub username: String,
}

/// What to do with a delivery after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Store mutation succeeded (or was a duplicate).
    Ack,
    /// Malformed payload; redelivery cannot help.
    Reject,
    /// Transient failure; leave unacknowledged for redelivery.
    Requeue,
}

/// Decode and validate a message body.
pub fn decode_event(payload: &[u8]) -> Result<UserCreatedEvent> {
    let event: UserCreatedEvent = serde_json::from_slice(payload)?;
    validate_username(&event.username)?;
    Ok(event)
}

/// Process one message body against the identity store.
pub async fn handle_payload(users: &UserStore, payload: &[u8]) -> Disposition {
    let event = match decode_event(payload) {
        Ok(event) => event,
        Err(e) => {
            log::warn!(
                "Rejecting malformed user event ({}): {}",
                e,
                String::from_utf8_lossy(payload)
            );
            return Disposition::Reject;
        }
    };

    log::info!("Received message: creating user with username='{}'", event.username);

    match users.create_user(&event.username).await {
        Ok(_) => {
            log::info!("User '{}' ingested", event.username);
            Disposition::Ack
        }
        Err(FollowError::InvalidArgument(msg)) => {
            log::warn!("Rejecting user event for '{}': {}", event.username, msg);
            Disposition::Reject
        }
        Err(e) => {
            log::error!(
                "Failed to ingest user '{}', leaving message for redelivery: {}",
                event.username,
                e
            );
            Disposition::Requeue
        }
    }
}
