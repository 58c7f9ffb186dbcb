use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::{errors::StoreError, repositories::row_store::Table};

#[derive(Debug, Clone)]
pub struct CachedRows {
    pub rows: Arc<Vec<Value>>,
    pub fetched_at: Instant,
}

/// Per-table cache of the full row sets the public pages read.
///
/// Every `invalidate` bumps the table's generation; a fetch that started
/// before the bump does not write its now stale result back.
pub struct ContentCache {
    entries: DashMap<Table, CachedRows>,
    generations: DashMap<Table, u64>,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        ContentCache {
            entries: DashMap::new(),
            generations: DashMap::new(),
            ttl,
        }
    }

    pub fn generation(&self, table: Table) -> u64 {
        self.generations.get(&table).map(|g| *g).unwrap_or(0)
    }

    /// Fresh rows for `table`, if any.
    pub fn get(&self, table: Table) -> Option<Arc<Vec<Value>>> {
        let entry = self.entries.get(&table)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.rows.clone())
        } else {
            None
        }
    }

    /// Stores rows fetched while the table was at `generation`.
    ///
    /// The generation entry stays locked across the check and the insert, so
    /// an `invalidate` either lands before (and the rows are dropped) or after.
    pub fn put(&self, table: Table, rows: Vec<Value>, generation: u64) -> Arc<Vec<Value>> {
        let rows = Arc::new(rows);
        let current = self.generations.entry(table).or_insert(0);
        if *current == generation {
            self.entries.insert(table, CachedRows { rows: rows.clone(), fetched_at: Instant::now() });
        }
        drop(current);
        rows
    }

    pub fn invalidate(&self, table: Table) {
        let mut current = self.generations.entry(table).or_insert(0);
        *current += 1;
        self.entries.remove(&table);
        drop(current);
        debug!(%table, "content cache invalidated");
    }

    pub async fn get_or_fetch<F, Fut>(&self, table: Table, fetch: F) -> Result<Arc<Vec<Value>>, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Value>, StoreError>>,
    {
        if let Some(rows) = self.get(table) {
            return Ok(rows);
        }
        let generation = self.generation(table);
        let rows = fetch().await?;
        Ok(self.put(table, rows, generation))
    }

    /// Number of tables currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn invalidation_during_fetch_drops_the_result() {
        let cache = ContentCache::new(Duration::from_secs(60));
        let rows = cache
            .get_or_fetch(Table::Projects, || {
                cache.invalidate(Table::Projects);
                async { Ok(vec![json!({"n": "stale"})]) }
            })
            .await
            .unwrap();

        assert_eq!(rows[0]["n"], "stale");
        assert!(cache.get(Table::Projects).is_none());
        assert_eq!(cache.generation(Table::Projects), 1);
    }

    #[tokio::test]
    async fn caches_until_invalidated() {
        let cache = ContentCache::new(Duration::from_secs(60));
        let first = cache
            .get_or_fetch(Table::Projects, || async { Ok(vec![json!({"n": 1})]) })
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(Table::Projects, || async { Ok(vec![json!({"n": 2})]) })
            .await
            .unwrap();
        assert_eq!(first, second);

        cache.invalidate(Table::Projects);
        let third = cache
            .get_or_fetch(Table::Projects, || async { Ok(vec![json!({"n": 3})]) })
            .await
            .unwrap();
        assert_eq!(third[0]["n"], 3);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache = ContentCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_fetch(Table::Hackathons, || async { Err(StoreError::Unavailable("down".into())) })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn stale_fetch_does_not_overwrite_invalidation() {
        let cache = ContentCache::new(Duration::from_secs(60));
        let generation = cache.generation(Table::BlogPosts);
        cache.invalidate(Table::BlogPosts);
        cache.put(Table::BlogPosts, vec![json!({"old": true})], generation);
        assert!(cache.get(Table::BlogPosts).is_none());
    }

    #[test]
    fn expired_entries_are_ignored() {
        let cache = ContentCache::new(Duration::ZERO);
        cache.put(Table::Certificates, vec![json!({})], 0);
        assert!(cache.get(Table::Certificates).is_none());
    }
}
