use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use user_events::UserPayload;

/// Read-optimized copy of a user, keyed uniquely by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotification {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    /// When the subscriber applied the change, not when the user changed.
    pub updated_at: DateTime<Utc>,
    /// The authoritative store's mutation time, carried by the event.
    pub source_updated_at: DateTime<Utc>,
}

impl UserNotification {
    /// Maps an event snapshot to a record processed at `processed_at`.
    pub fn from_payload(payload: UserPayload, processed_at: DateTime<Utc>) -> Self {
        Self {
            user_id: payload.id,
            name: payload.name,
            email: payload.email,
            updated_at: processed_at,
            source_updated_at: payload.updated_at,
        }
    }

    /// Returns true if both records hold the same user fields, ignoring
    /// the subscriber-local processing time.
    pub fn same_fields(&self, other: &Self) -> bool {
        self.user_id == other.user_id && self.name == other.name && self.email == other.email
    }
}
