use std::sync::Arc;

use tokio::{sync::mpsc, time::interval};

use crate::{
    cache::content_cache::ContentCache, constants::PURGE_INTERVAL, realtime::listener::ChangeEvent,
    repositories::token::TokenServiceRepository, AppState,
};

/// Turns row-change notifications into cache invalidations. Runs until every
/// sender is gone.
pub async fn run_invalidation_dispatcher(mut events: mpsc::Receiver<ChangeEvent>, cache: Arc<ContentCache>) {
    while let Some(event) = events.recv().await {
        tracing::debug!(table = %event.table, op = ?event.op, "Content changed remotely");
        cache.invalidate(event.table);
    }
    tracing::info!("Change channel closed, dispatcher stopped");
}

/// Periodically drops expired revocations and idle limiter keys.
pub async fn start_purge_task(state: actix_web::web::Data<AppState>) {
    let mut interval = interval(PURGE_INTERVAL);

    loop {
        interval.tick().await;

        let revoked = state.auth_handler.token_service.prune_revoked();
        let contact_keys = state.contact.limiter().purge_idle();
        let login_keys = state.login_limiter.purge_idle();
        tracing::info!(revoked, contact_keys, login_keys, "Purged expired session and limiter entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{realtime::listener::ChangeOp, repositories::row_store::Table};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn change_events_invalidate_their_table() {
        let cache = Arc::new(ContentCache::new(Duration::from_secs(60)));
        cache.put(Table::ProfileSettings, vec![json!({"name": "old"})], 0);
        cache.put(Table::Projects, vec![json!({})], 0);

        let (tx, rx) = mpsc::channel(8);
        let dispatcher = tokio::spawn(run_invalidation_dispatcher(rx, cache.clone()));
        tx.send(ChangeEvent { table: Table::ProfileSettings, op: ChangeOp::Update }).await.unwrap();
        drop(tx);
        dispatcher.await.unwrap();

        assert!(cache.get(Table::ProfileSettings).is_none());
        assert!(cache.get(Table::Projects).is_some());
    }
}
