//! Shared types used by both the user service and the notification service.

pub mod types;

pub use types::{ParseUserIdError, UserId};
