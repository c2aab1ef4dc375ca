//! Wire contract for user change notifications.
//!
//! The user service publishes one [`UserChangeEvent`] per successful
//! mutation on [`USER_EVENTS_TOPIC`]. Every event carries a full snapshot
//! of the user, never a diff.
//!
//! Consumers decode with [`decode`], which maps unrecognized `type` values
//! to [`ReceivedEvent::Unknown`] so that new event kinds can be introduced
//! without breaking older subscribers.

pub mod error;
pub mod event;

pub use error::{EventError, Result};
pub use event::{ReceivedEvent, USER_EVENTS_TOPIC, UserChangeEvent, UserPayload, decode};
