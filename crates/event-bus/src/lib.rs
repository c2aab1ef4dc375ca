//! Publish/subscribe contract used between the user service and the
//! notification service.
//!
//! - [`EventBus`] trait: publish raw messages to a topic, subscribe to a topic
//! - [`InMemoryEventBus`] for tests and single-process wiring
//! - [`KafkaEventBus`] for Kafka-compatible brokers

pub mod bus;
pub mod error;
pub mod kafka;
pub mod memory;

pub use bus::{BusMessage, EventBus, MessageStream};
pub use error::{EventBusError, Result};
pub use kafka::{KafkaEventBus, KafkaEventBusBuilder};
pub use memory::InMemoryEventBus;
