//! Read side of the user pipeline.
//!
//! This crate provides the notification service's half:
//! - [`UserNotification`]: the denormalized per-user read record
//! - [`ProjectionStore`] trait with in-memory and PostgreSQL adapters
//! - [`UserProjector`]: turns one raw bus message into one atomic upsert
//! - [`ProjectionSubscriber`]: the long-lived subscription feeding the projector

pub mod error;
pub mod memory;
pub mod postgres;
pub mod projector;
pub mod record;
pub mod store;
pub mod subscriber;

pub use error::{ProjectionError, Result};
pub use memory::InMemoryProjectionStore;
pub use postgres::PostgresProjectionStore;
pub use projector::{Clock, MessageOutcome, ProjectorStats, UserProjector};
pub use record::UserNotification;
pub use store::{ProjectionStore, UpsertOutcome};
pub use subscriber::ProjectionSubscriber;
