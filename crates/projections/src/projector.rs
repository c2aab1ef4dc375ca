//! Applies user change messages to the notification store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use user_events::{ReceivedEvent, UserChangeEvent, decode};

use crate::store::{ProjectionStore, UpsertOutcome};
use crate::{Result, UserNotification};

/// Source of the processing time stamped on every record.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The event reached the store.
    Applied(UpsertOutcome),
    /// The event type is not one this service understands.
    Ignored,
    /// The message could not be decoded and was discarded.
    Malformed,
    /// The store rejected the upsert; the event is lost.
    StoreFailed,
}

/// Counters of processed messages since start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectorStats {
    pub received: u64,
    pub applied: u64,
    pub stale: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub failed: u64,
}

impl ProjectorStats {
    /// Messages whose handling has finished, whatever the outcome.
    pub fn processed(&self) -> u64 {
        self.applied + self.stale + self.ignored + self.malformed + self.failed
    }
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    applied: AtomicU64,
    stale: AtomicU64,
    ignored: AtomicU64,
    malformed: AtomicU64,
    failed: AtomicU64,
}

/// Turns raw bus messages into notification upserts.
///
/// Never fails: every problem is logged, counted and the message dropped, so
/// one bad message cannot stop the subscription. There are no retries.
pub struct UserProjector<P: ProjectionStore> {
    store: P,
    clock: Clock,
    counters: Counters,
}

impl<P: ProjectionStore> UserProjector<P> {
    /// Creates a projector stamping records with the wall clock.
    pub fn new(store: P) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: P, clock: Clock) -> Self {
        Self {
            store,
            clock,
            counters: Counters::default(),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn stats(&self) -> ProjectorStats {
        let c = &self.counters;
        ProjectorStats {
            received: c.received.load(Ordering::Relaxed),
            applied: c.applied.load(Ordering::Relaxed),
            stale: c.stale.load(Ordering::Relaxed),
            ignored: c.ignored.load(Ordering::Relaxed),
            malformed: c.malformed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }

    /// Decodes and applies one raw message.
    #[tracing::instrument(skip_all, fields(len = payload.len()))]
    pub async fn handle_message(&self, payload: &[u8]) -> MessageOutcome {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let event = match decode(payload) {
            Ok(ReceivedEvent::Known(event)) => event,
            Ok(ReceivedEvent::Unknown { event_type }) => {
                self.counters.ignored.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("projection_events_ignored").increment(1);
                tracing::debug!(%event_type, "ignoring unknown event type");
                return MessageOutcome::Ignored;
            }
            Err(e) => {
                self.counters.malformed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("projection_events_dropped").increment(1);
                tracing::warn!(error = %e, "dropping malformed message");
                return MessageOutcome::Malformed;
            }
        };

        let event_type = event.event_type();
        let user_id = event.payload().id;

        match self.apply(event).await {
            Ok(outcome) => {
                if outcome == UpsertOutcome::Stale {
                    self.counters.stale.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("projection_events_stale").increment(1);
                    tracing::info!(%user_id, event_type, "skipping event older than projection");
                } else {
                    self.counters.applied.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("projection_events_applied").increment(1);
                    tracing::debug!(%user_id, event_type, ?outcome, "projection updated");
                }
                MessageOutcome::Applied(outcome)
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("projection_upsert_failed").increment(1);
                tracing::error!(%user_id, event_type, error = %e, "projection upsert failed, event lost");
                MessageOutcome::StoreFailed
            }
        }
    }

    /// Maps a decoded event to a record and upserts it.
    pub async fn apply(&self, event: UserChangeEvent) -> Result<UpsertOutcome> {
        let record = UserNotification::from_payload(event.into_payload(), (self.clock)());
        self.store.upsert(record).await
    }
}
