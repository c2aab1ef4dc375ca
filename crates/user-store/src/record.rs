use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user row as held by the authoritative store.
///
/// `id` and `updated_at` are always assigned by the store, never by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields for a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
}

impl UserFields {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_serializes_with_snake_case_fields() {
        let record = UserRecord {
            id: UserId::new(1),
            name: "Bob".to_string(),
            email: "bob@x.com".to_string(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Bob");
        assert_eq!(json["email"], "bob@x.com");
        assert_eq!(json["updated_at"], "2024-01-02T03:04:05Z");
    }
}
