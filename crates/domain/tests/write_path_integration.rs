//! Integration tests for the write path as a subscriber sees it.
//!
//! These tests subscribe to the in-memory bus before mutating, so every
//! assertion is made on what actually went over the wire.

use std::collections::HashSet;
use std::time::Duration;

use domain::{DomainError, PublishPolicy, UserService};
use event_bus::{EventBus, InMemoryEventBus, MessageStream};
use futures_util::StreamExt;
use user_events::{ReceivedEvent, USER_EVENTS_TOPIC, UserChangeEvent, decode};
use user_store::{InMemoryUserStore, UserId};

/// Helper to create a service and a live subscription on its bus
async fn create_service(
    policy: PublishPolicy,
) -> (UserService<InMemoryUserStore, InMemoryEventBus>, InMemoryEventBus, MessageStream) {
    let bus = InMemoryEventBus::new();
    let stream = bus.subscribe(USER_EVENTS_TOPIC).await.unwrap();
    let service = UserService::with_policy(InMemoryUserStore::new(), bus.clone(), policy);
    (service, bus, stream)
}

async fn next_event(stream: &mut MessageStream) -> UserChangeEvent {
    let message = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("no message within a second")
        .expect("stream ended")
        .expect("transport error");
    assert_eq!(message.topic, USER_EVENTS_TOPIC);
    match decode(&message.payload).unwrap() {
        ReceivedEvent::Known(event) => event,
        ReceivedEvent::Unknown { event_type } => panic!("unexpected event type {event_type}"),
    }
}

async fn assert_quiet(stream: &mut MessageStream) {
    let next = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
    assert!(next.is_err(), "expected no message");
}

mod publishing {
    use super::*;

    #[tokio::test]
    async fn one_message_per_mutation_in_commit_order() {
        let (service, _bus, mut stream) = create_service(PublishPolicy::BestEffort).await;

        let alice = service.create_user("Alice", "alice@x.com").await.unwrap();
        let bob = service.create_user("Bob", "bob@x.com").await.unwrap();
        service
            .update_user(alice.id, "Alice2", "alice@x.com")
            .await
            .unwrap();

        let first = next_event(&mut stream).await;
        let second = next_event(&mut stream).await;
        let third = next_event(&mut stream).await;
        assert_quiet(&mut stream).await;

        assert_eq!(first.event_type(), "user_created");
        assert_eq!(first.payload().id, alice.id);
        assert_eq!(second.payload().id, bob.id);
        assert_eq!(third.event_type(), "user_updated");
        assert_eq!(third.payload().name, "Alice2");
    }

    #[tokio::test]
    async fn ids_are_positive_and_unique() {
        let (service, _bus, _stream) = create_service(PublishPolicy::BestEffort).await;

        let mut ids = HashSet::new();
        for i in 0..20 {
            let user = service
                .create_user(&format!("user-{i}"), "u@x.com")
                .await
                .unwrap();
            assert!(user.id.as_i64() > 0);
            assert!(ids.insert(user.id), "id {} handed out twice", user.id);
        }
        assert_eq!(ids.len(), 20);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn rejected_input_publishes_nothing() {
        let (service, _bus, mut stream) = create_service(PublishPolicy::BestEffort).await;

        let result = service.create_user("", "nobody@x.com").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_quiet(&mut stream).await;
    }

    #[tokio::test]
    async fn missing_user_publishes_nothing() {
        let (service, _bus, mut stream) = create_service(PublishPolicy::BestEffort).await;

        let result = service.update_user(UserId::new(3), "X", "x@x.com").await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert_quiet(&mut stream).await;
    }

    #[tokio::test]
    async fn bus_outage_drops_events_but_keeps_writes() {
        let (service, bus, mut stream) = create_service(PublishPolicy::BestEffort).await;
        bus.set_fail_publishes(true);

        let user = service.create_user("Dropped", "d@x.com").await.unwrap();
        assert_quiet(&mut stream).await;

        bus.set_fail_publishes(false);
        service
            .update_user(user.id, "Recovered", "d@x.com")
            .await
            .unwrap();

        // The update is a full snapshot, so a subscriber that missed the
        // create still converges.
        let event = next_event(&mut stream).await;
        assert_eq!(event.payload().name, "Recovered");
        assert_eq!(event.payload().id, user.id);
    }

    #[tokio::test]
    async fn required_policy_reports_outage() {
        let (service, bus, _stream) = create_service(PublishPolicy::Required).await;
        bus.set_fail_publishes(true);

        let result = service.create_user("Loud", "l@x.com").await;

        assert!(matches!(result, Err(DomainError::Publish(_))));
        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }
}
