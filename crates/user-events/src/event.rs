//! User change event types and codec.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::{EventError, Result};

/// The single channel user change events are published on.
pub const USER_EVENTS_TOPIC: &str = "user.events";

/// Snapshot of a user at the moment of mutation.
///
/// All fields are required; `updated_at` is the store-assigned mutation
/// time and travels as an RFC 3339 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

/// Events understood by the notification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum UserChangeEvent {
    /// A user row was inserted.
    #[serde(rename = "user_created")]
    Created(UserPayload),

    /// An existing user row was overwritten.
    #[serde(rename = "user_updated")]
    Updated(UserPayload),
}

impl UserChangeEvent {
    /// Builds a `user_created` event from the stored record.
    pub fn created(payload: UserPayload) -> Self {
        Self::Created(payload)
    }

    /// Builds a `user_updated` event from the stored record.
    pub fn updated(payload: UserPayload) -> Self {
        Self::Updated(payload)
    }

    /// Returns the wire `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => "user_created",
            Self::Updated(_) => "user_updated",
        }
    }

    /// Returns the user snapshot carried by this event.
    pub fn payload(&self) -> &UserPayload {
        match self {
            Self::Created(payload) | Self::Updated(payload) => payload,
        }
    }

    /// Consumes the event, returning its snapshot.
    pub fn into_payload(self) -> UserPayload {
        match self {
            Self::Created(payload) | Self::Updated(payload) => payload,
        }
    }

    /// Serializes the event to its JSON wire form.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(EventError::Encode)
    }
}

/// Outcome of decoding a message from the user events channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceivedEvent {
    /// One of the known event types.
    Known(UserChangeEvent),

    /// A well-formed message whose `type` this consumer does not recognize.
    Unknown { event_type: String },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Decodes a raw message into a [`ReceivedEvent`].
///
/// The payload of an unknown type is never inspected.
pub fn decode(bytes: &[u8]) -> Result<ReceivedEvent> {
    let raw: RawEvent = serde_json::from_slice(bytes).map_err(EventError::Malformed)?;

    let event = match raw.event_type.as_str() {
        "user_created" => UserChangeEvent::Created(parse_payload(raw.payload)?),
        "user_updated" => UserChangeEvent::Updated(parse_payload(raw.payload)?),
        _ => {
            return Ok(ReceivedEvent::Unknown {
                event_type: raw.event_type,
            });
        }
    };

    Ok(ReceivedEvent::Known(event))
}

fn parse_payload(value: serde_json::Value) -> Result<UserPayload> {
    serde_json::from_value(value).map_err(EventError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload() -> UserPayload {
        UserPayload {
            id: UserId::new(7),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn encodes_with_type_tag_and_string_timestamp() {
        let bytes = UserChangeEvent::created(payload()).encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["type"], "user_created");
        assert_eq!(json["payload"]["id"], 7);
        assert_eq!(json["payload"]["name"], "Alice");
        assert_eq!(json["payload"]["email"], "alice@example.com");
        assert_eq!(json["payload"]["updated_at"], "2024-05-01T12:30:00Z");
    }

    #[test]
    fn decodes_known_types() {
        let bytes = UserChangeEvent::updated(payload()).encode().unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, ReceivedEvent::Known(UserChangeEvent::Updated(payload())));
    }

    #[test]
    fn decodes_payload_from_foreign_producer() {
        let raw = br#"{
            "type": "user_created",
            "payload": {
                "id": 3,
                "name": "Bob",
                "email": "bob@x.com",
                "updated_at": "2024-05-01T12:30:00.123456Z"
            }
        }"#;

        let ReceivedEvent::Known(event) = decode(raw).unwrap() else {
            panic!("expected a known event");
        };
        assert_eq!(event.event_type(), "user_created");
        assert_eq!(event.payload().id, UserId::new(3));
        assert_eq!(event.payload().name, "Bob");
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let raw = br#"{"type": "user_deleted", "payload": {"id": 7}}"#;
        assert_eq!(
            decode(raw).unwrap(),
            ReceivedEvent::Unknown {
                event_type: "user_deleted".to_string()
            }
        );
    }

    #[test]
    fn unknown_type_without_payload_is_not_an_error() {
        let raw = br#"{"type": "user_merged"}"#;
        assert!(matches!(decode(raw).unwrap(), ReceivedEvent::Unknown { .. }));
    }

    #[test]
    fn missing_payload_field_is_malformed() {
        let raw = br#"{"type": "user_created", "payload": {"id": 7, "name": "A"}}"#;
        assert!(matches!(decode(raw), Err(EventError::Malformed(_))));
    }

    #[test]
    fn wrong_typed_field_is_malformed() {
        let raw = br#"{
            "type": "user_updated",
            "payload": {"id": "seven", "name": "A", "email": "a@x", "updated_at": "2024-05-01T12:30:00Z"}
        }"#;
        assert!(matches!(decode(raw), Err(EventError::Malformed(_))));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(decode(b"{not json"), Err(EventError::Malformed(_))));
        assert!(matches!(decode(br#"{"payload": {}}"#), Err(EventError::Malformed(_))));
    }
}
