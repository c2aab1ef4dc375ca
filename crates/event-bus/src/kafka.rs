//! Kafka-compatible transport built on rdkafka.
//!
//! Publishing only enqueues the record in the producer; the delivery report
//! is awaited on a spawned task and failures there are logged, never
//! returned. Subscriptions commit offsets only after a message has been
//! handed to the subscriber, so a crash causes redelivery.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::sync::mpsc;

use crate::{BusMessage, EventBus, EventBusError, MessageStream, Result};

/// Kafka-backed event bus.
pub struct KafkaEventBus {
    producer: FutureProducer,
    brokers: String,
    consumer_group: String,
    buffer_size: usize,
    auto_offset_reset: String,
}

impl KafkaEventBus {
    /// Returns a builder for custom configuration.
    pub fn builder() -> KafkaEventBusBuilder {
        KafkaEventBusBuilder::default()
    }

    /// Returns the configured bootstrap servers.
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Returns the consumer group used by subscriptions.
    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }
}

/// Builder for [`KafkaEventBus`].
#[derive(Debug, Default)]
pub struct KafkaEventBusBuilder {
    brokers: Option<String>,
    consumer_group: Option<String>,
    message_timeout: Option<Duration>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
}

impl KafkaEventBusBuilder {
    /// Comma-separated bootstrap servers, e.g. `"localhost:9092"`.
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Consumer group shared by all instances of one logical subscriber.
    pub fn consumer_group(mut self, group: impl Into<String>) -> Self {
        self.consumer_group = Some(group.into());
        self
    }

    /// How long the producer keeps trying to deliver a record (default 5s).
    pub fn message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = Some(timeout);
        self
    }

    /// Messages buffered between the consumer and the subscriber (default 1000).
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size.max(1));
        self
    }

    /// Where a new consumer group starts reading (default `"earliest"`).
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Creates the producer. No network round-trip happens here.
    pub fn build(self) -> Result<KafkaEventBus> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventBusError::Connection("brokers not configured".to_string()))?;
        let timeout = self.message_timeout.unwrap_or(Duration::from_secs(5));

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", "1")
            .create()
            .map_err(|e| EventBusError::Connection(format!("failed to create producer: {e}")))?;

        let bus = KafkaEventBus {
            producer,
            brokers,
            consumer_group: self
                .consumer_group
                .unwrap_or_else(|| "user-events-subscriber".to_string()),
            buffer_size: self.buffer_size.unwrap_or(1000),
            auto_offset_reset: self
                .auto_offset_reset
                .unwrap_or_else(|| "earliest".to_string()),
        };

        tracing::info!(
            brokers = %bus.brokers,
            consumer_group = %bus.consumer_group,
            "kafka event bus created"
        );

        Ok(bus)
    }
}

#[async_trait]
impl EventBus for KafkaEventBus {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(&payload);

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(e, _)| EventBusError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        let topic = topic.to_string();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok((partition, offset))) => {
                    tracing::debug!(%topic, partition, offset, "message delivered");
                }
                Ok(Err((e, _))) => {
                    metrics::counter!("bus_delivery_failed").increment(1);
                    tracing::warn!(%topic, error = %e, "message delivery failed");
                }
                Err(_) => {
                    metrics::counter!("bus_delivery_failed").increment(1);
                    tracing::warn!(%topic, "producer dropped before delivery report");
                }
            }
        });

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        let subscribe_err = |reason: String| EventBusError::Subscribe {
            topic: topic.to_string(),
            reason,
        };

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.consumer_group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| subscribe_err(format!("failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| subscribe_err(e.to_string()))?;

        tracing::info!(
            topic,
            consumer_group = %self.consumer_group,
            "subscribed"
        );

        let (tx, rx) = mpsc::channel(self.buffer_size);

        tokio::spawn(async move {
            let mut messages = consumer.stream();

            while let Some(received) = messages.next().await {
                let message = match received {
                    Ok(message) => message,
                    Err(e) => {
                        let err = EventBusError::Transport(e.to_string());
                        if tx.send(Err(err)).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                let item = match message.payload() {
                    Some(payload) => Ok(BusMessage {
                        topic: message.topic().to_string(),
                        payload: payload.to_vec(),
                    }),
                    None => Err(EventBusError::Transport(
                        "message has no payload".to_string(),
                    )),
                };

                // Exit without committing so the message is redelivered.
                if tx.send(item).await.is_err() {
                    break;
                }

                if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                    tracing::warn!(
                        topic = message.topic(),
                        partition = message.partition(),
                        offset = message.offset(),
                        error = %e,
                        "offset commit failed, message may be redelivered"
                    );
                }
            }

            tracing::debug!("consumer task exiting");
        });

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Ok(Box::pin(stream))
    }
}
