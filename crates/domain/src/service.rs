//! User service: the publisher side of the pipeline.

use common::UserId;
use event_bus::EventBus;
use user_events::{USER_EVENTS_TOPIC, UserChangeEvent, UserPayload};
use user_store::{UserFields, UserRecord, UserStore};

use crate::error::DomainError;
use crate::policy::PublishPolicy;

/// Service for creating, updating and reading users.
///
/// Every successful mutation is followed by exactly one publish attempt on
/// [`USER_EVENTS_TOPIC`]. The event is always built from the row the store
/// returned, so subscribers see store-assigned ids and timestamps. The
/// service keeps nothing after handing the event to the bus.
pub struct UserService<S: UserStore, B: EventBus> {
    store: S,
    bus: B,
    policy: PublishPolicy,
}

impl<S: UserStore, B: EventBus> UserService<S, B> {
    /// Creates a service with the best-effort publish policy.
    pub fn new(store: S, bus: B) -> Self {
        Self::with_policy(store, bus, PublishPolicy::default())
    }

    pub fn with_policy(store: S, bus: B, policy: PublishPolicy) -> Self {
        Self { store, bus, policy }
    }

    pub fn policy(&self) -> PublishPolicy {
        self.policy
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Inserts a user and publishes `user_created`.
    #[tracing::instrument(skip(self))]
    pub async fn create_user(&self, name: &str, email: &str) -> Result<UserRecord, DomainError> {
        let fields = validate(name, email)?;
        let user = self.store.create(fields).await?;

        metrics::counter!("users_created").increment(1);
        tracing::info!(user_id = %user.id, "user created");

        self.publish(UserChangeEvent::created(snapshot(&user)))
            .await?;
        Ok(user)
    }

    /// Overwrites a user and publishes `user_updated`.
    #[tracing::instrument(skip(self))]
    pub async fn update_user(
        &self,
        id: UserId,
        name: &str,
        email: &str,
    ) -> Result<UserRecord, DomainError> {
        let fields = validate(name, email)?;
        let user = self.store.update(id, fields).await?;

        metrics::counter!("users_updated").increment(1);
        tracing::info!(user_id = %user.id, "user updated");

        self.publish(UserChangeEvent::updated(snapshot(&user)))
            .await?;
        Ok(user)
    }

    /// Loads a user by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<UserRecord, DomainError> {
        self.store
            .get(id)
            .await?
            .ok_or(DomainError::NotFound(id))
    }

    /// Lists all users by ascending id.
    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, DomainError> {
        Ok(self.store.list().await?)
    }

    async fn publish(&self, event: UserChangeEvent) -> Result<(), DomainError> {
        let user_id = event.payload().id;
        let event_type = event.event_type();

        match self.try_publish(&event).await {
            Ok(()) => {
                metrics::counter!("user_events_published").increment(1);
                tracing::debug!(%user_id, event_type, "event published");
                Ok(())
            }
            Err(err) => {
                metrics::counter!("user_events_publish_failed").increment(1);
                match self.policy {
                    PublishPolicy::BestEffort => {
                        tracing::warn!(
                            %user_id,
                            event_type,
                            error = %err,
                            "event publish failed, projection will miss this change"
                        );
                        Ok(())
                    }
                    PublishPolicy::Required => {
                        tracing::error!(%user_id, event_type, error = %err, "event publish failed");
                        Err(err)
                    }
                }
            }
        }
    }

    async fn try_publish(&self, event: &UserChangeEvent) -> Result<(), DomainError> {
        let payload = event.encode()?;
        let key = event.payload().id.to_string();
        self.bus.publish(USER_EVENTS_TOPIC, &key, payload).await?;
        Ok(())
    }
}

fn validate(name: &str, email: &str) -> Result<UserFields, DomainError> {
    let name = name.trim();
    let email = email.trim();

    if name.is_empty() {
        return Err(DomainError::Validation("name must not be empty".to_string()));
    }
    if email.is_empty() {
        return Err(DomainError::Validation("email must not be empty".to_string()));
    }
    if !email.contains('@') {
        return Err(DomainError::Validation(format!(
            "email {email:?} is not an address"
        )));
    }

    Ok(UserFields::new(name, email))
}

fn snapshot(user: &UserRecord) -> UserPayload {
    UserPayload {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        updated_at: user.updated_at,
    }
}
