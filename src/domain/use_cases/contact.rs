use std::{sync::Arc, time::Duration};

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::contact_message::{ContactForm, ContactMessageRow, ContactReceipt, DeliveryChannel},
    errors::{AppError, StoreError},
    infrastructure::{
        http::{form_relay::FormRelay, stats_client::RemoteError},
        limiter::rate_limiter::KeyedRateLimiter,
    },
    repositories::row_store::{Mutation, RowStore, Table},
    use_cases::content::ContentRenderer,
};

pub const CONTACT_WINDOW: Duration = Duration::from_secs(60 * 60);

pub struct ContactHandler {
    store: Arc<dyn RowStore>,
    content: ContentRenderer,
    relay: Arc<dyn FormRelay>,
    limiter: KeyedRateLimiter,
    relay_url: Option<String>,
}

impl ContactHandler {
    pub fn new(
        store: Arc<dyn RowStore>,
        content: ContentRenderer,
        relay: Arc<dyn FormRelay>,
        limit_per_hour: usize,
        relay_url: Option<String>,
    ) -> Self {
        ContactHandler {
            store,
            content,
            relay,
            limiter: KeyedRateLimiter::new(limit_per_hour, CONTACT_WINDOW),
            relay_url,
        }
    }

    pub fn limiter(&self) -> &KeyedRateLimiter {
        &self.limiter
    }

    /// Stores the message, falling back to the form relay when the insert
    /// fails. Both paths answer with the same receipt.
    pub async fn submit(&self, form: ContactForm) -> Result<ContactReceipt, AppError> {
        let form = form.normalized();
        form.validate()?;

        self.limiter.check(&form.email).map_err(|retry_after| {
            let wait = humantime::format_duration(Duration::from_secs(retry_after.as_secs().max(1)));
            AppError::RateLimited(format!("Too many messages, try again in {}", wait))
        })?;

        let id = Uuid::new_v4();
        let insert_error = match self.insert(id, &form).await {
            Ok(()) => {
                info!(%id, "Contact message stored");
                return Ok(ContactReceipt::new(id, DeliveryChannel::Stored));
            }
            Err(e) => e,
        };
        warn!(%id, error = %insert_error, "Contact insert failed, trying relay");

        match self.relay(&form).await {
            Ok(()) => {
                info!(%id, "Contact message relayed");
                Ok(ContactReceipt::new(id, DeliveryChannel::Relay))
            }
            Err(relay_error) => {
                self.limiter.release(&form.email);
                warn!(%id, error = %relay_error, "Contact relay failed");
                Err(AppError::RemoteFailure(
                    "Your message could not be delivered, please try again later".to_string(),
                ))
            }
        }
    }

    async fn insert(&self, id: Uuid, form: &ContactForm) -> Result<(), StoreError> {
        let row = serde_json::to_value(ContactMessageRow::new(id, form))
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        self.store.mutate(Table::ContactMessages, Mutation::Insert(vec![row])).await?;
        Ok(())
    }

    async fn relay(&self, form: &ContactForm) -> Result<(), RemoteError> {
        let endpoint = self
            .content
            .profile()
            .await
            .data
            .contact_endpoint
            .or_else(|| self.relay_url.clone())
            .ok_or(RemoteError::NotConfigured)?;
        self.relay.submit(&endpoint, form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::content_cache::ContentCache,
        infrastructure::http::form_relay::MockFormRelay,
        repositories::memory_store::{MemoryRowStore, StoreOp},
    };
    use mockall::predicate::eq;
    use serde_json::json;

    const RELAY: &str = "https://relay.example.com/f/abc";

    fn form() -> ContactForm {
        ContactForm {
            name: "  Grace Hopper ".into(),
            email: "Grace@Example.com".into(),
            subject: "Hello".into(),
            message: "Loved the compiler talk.".into(),
        }
    }

    fn handler(store: Arc<MemoryRowStore>, relay: MockFormRelay, relay_url: Option<&str>) -> ContactHandler {
        let content = ContentRenderer::new(store.clone(), Arc::new(ContentCache::new(Duration::from_secs(60))));
        ContactHandler::new(store, content, Arc::new(relay), 2, relay_url.map(String::from))
    }

    #[tokio::test]
    async fn stores_normalized_message_without_touching_relay() {
        let store = Arc::new(MemoryRowStore::recording());
        let mut relay = MockFormRelay::new();
        relay.expect_submit().never();

        let receipt = handler(store.clone(), relay, Some(RELAY)).submit(form()).await.unwrap();
        assert_eq!(receipt.channel, DeliveryChannel::Stored);

        let rows = store.rows(Table::ContactMessages);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["email"], json!("grace@example.com"));
        assert_eq!(rows[0]["name"], json!("Grace Hopper"));
    }

    #[tokio::test]
    async fn failed_insert_goes_through_relay_with_same_acknowledgement() {
        let store = Arc::new(MemoryRowStore::recording());
        store.fail_on(Table::ContactMessages, StoreOp::Insert);
        let mut relay = MockFormRelay::new();
        relay
            .expect_submit()
            .with(eq(RELAY), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));

        let receipt = handler(store, relay, Some(RELAY)).submit(form()).await.unwrap();
        assert_eq!(receipt.channel, DeliveryChannel::Relay);
        assert_eq!(receipt.message, ContactReceipt::new(Uuid::nil(), DeliveryChannel::Stored).message);
    }

    #[tokio::test]
    async fn profile_endpoint_wins_over_configured_relay() {
        let store = Arc::new(MemoryRowStore::recording());
        store.seed(Table::ProfileSettings, vec![json!({
            "id": Uuid::new_v4(),
            "name": "Ada",
            "title": "Engineer",
            "description": "Bio",
            "contactendpoint": "https://forms.example.com/ada"
        })]);
        store.fail_on(Table::ContactMessages, StoreOp::Insert);
        let mut relay = MockFormRelay::new();
        relay
            .expect_submit()
            .with(eq("https://forms.example.com/ada"), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));

        assert!(handler(store, relay, Some(RELAY)).submit(form()).await.is_ok());
    }

    #[tokio::test]
    async fn both_paths_failing_yields_error_and_frees_the_slot() {
        let store = Arc::new(MemoryRowStore::recording());
        store.fail_on(Table::ContactMessages, StoreOp::Insert);
        let mut relay = MockFormRelay::new();
        relay.expect_submit().returning(|_, _| Err(RemoteError::Status(500)));
        let handler = handler(store, relay, Some(RELAY));

        for _ in 0..3 {
            assert!(matches!(handler.submit(form()).await, Err(AppError::RemoteFailure(_))));
        }
    }

    #[tokio::test]
    async fn no_relay_configured_is_a_failure() {
        let store = Arc::new(MemoryRowStore::recording());
        store.fail_on(Table::ContactMessages, StoreOp::Insert);
        let mut relay = MockFormRelay::new();
        relay.expect_submit().never();

        let result = handler(store, relay, None).submit(form()).await;
        assert!(matches!(result, Err(AppError::RemoteFailure(_))));
    }

    #[tokio::test]
    async fn throttles_per_email() {
        let store = Arc::new(MemoryRowStore::recording());
        let handler = handler(store.clone(), MockFormRelay::new(), None);

        handler.submit(form()).await.unwrap();
        handler.submit(form()).await.unwrap();
        assert!(matches!(handler.submit(form()).await, Err(AppError::RateLimited(_))));

        let mut other = form();
        other.email = "linus@example.com".into();
        assert!(handler.submit(other).await.is_ok());
        assert_eq!(store.rows(Table::ContactMessages).len(), 3);
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_before_any_call() {
        let store = Arc::new(MemoryRowStore::recording());
        let mut bad = form();
        bad.message = "hey".into();
        bad.email = "nope".into();

        let err = handler(store.clone(), MockFormRelay::new(), None).submit(bad).await.unwrap_err();
        match err {
            AppError::ValidationError(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["email", "message"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.calls().is_empty());
    }
}
