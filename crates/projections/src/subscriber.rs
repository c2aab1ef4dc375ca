//! Long-lived subscription feeding the projector.

use std::sync::Arc;

use event_bus::{EventBus, MessageStream};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use user_events::USER_EVENTS_TOPIC;

use crate::Result;
use crate::projector::UserProjector;
use crate::store::ProjectionStore;

/// Consumes the user events topic and applies each message in arrival order.
///
/// Messages are processed one at a time, so events for the same user are
/// applied in the order the subscription delivers them.
pub struct ProjectionSubscriber<P: ProjectionStore> {
    projector: Arc<UserProjector<P>>,
}

impl<P: ProjectionStore + 'static> ProjectionSubscriber<P> {
    pub fn new(projector: Arc<UserProjector<P>>) -> Self {
        Self { projector }
    }

    pub fn projector(&self) -> &Arc<UserProjector<P>> {
        &self.projector
    }

    /// Opens the subscription and spawns the processing loop.
    ///
    /// The subscription is established before this returns, so messages
    /// published afterwards are not missed.
    pub async fn start<B: EventBus + ?Sized>(&self, bus: &B) -> Result<JoinHandle<()>> {
        let stream = bus.subscribe(USER_EVENTS_TOPIC).await?;
        tracing::info!(topic = USER_EVENTS_TOPIC, "projection subscriber started");

        let projector = Arc::clone(&self.projector);
        Ok(tokio::spawn(Self::run(stream, projector)))
    }

    /// Processes messages until the stream ends.
    pub async fn run(mut stream: MessageStream, projector: Arc<UserProjector<P>>) {
        while let Some(received) = stream.next().await {
            match received {
                Ok(message) => {
                    projector.handle_message(&message.payload).await;
                }
                Err(e) => {
                    metrics::counter!("projection_transport_errors").increment(1);
                    tracing::warn!(error = %e, "error receiving from subscription");
                }
            }
        }

        tracing::info!(topic = USER_EVENTS_TOPIC, "subscription closed");
    }
}
