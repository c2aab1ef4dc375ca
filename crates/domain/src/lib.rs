//! Publisher-side write path for the user service.
//!
//! This crate provides:
//! - [`UserService`]: commits a mutation to the authoritative store, then
//!   publishes a [`UserChangeEvent`](user_events::UserChangeEvent) built
//!   from the stored row
//! - [`PublishPolicy`]: what a failed publish means for the caller

pub mod error;
pub mod policy;
pub mod service;

pub use error::DomainError;
pub use policy::{PublishPolicy, UnknownPublishPolicy};
pub use service::UserService;
