use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::{
    entities::record::{ContentEntity, Stored},
    errors::StoreError,
    repositories::row_store::{Mutation, Query, RowStore},
};

#[async_trait]
pub trait EntityRepository<E: ContentEntity>: Send + Sync {
    /// Every row, newest first where the table is dated.
    async fn list(&self) -> Result<Vec<Stored<E>>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Stored<E>>, StoreError>;
    /// Writes all rows in one batch call. Ids are chosen by the caller.
    async fn insert_many(&self, rows: Vec<(Uuid, E)>) -> Result<Vec<Stored<E>>, StoreError>;
    async fn update(&self, id: Uuid, entity: &E) -> Result<Stored<E>, StoreError>;
    async fn upsert(&self, id: Uuid, entity: &E) -> Result<Stored<E>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    async fn count(&self) -> Result<i64, StoreError>;
}

/// Converts raw rows into view models. Malformed rows are skipped.
pub fn decode_rows<E: ContentEntity>(rows: &[Value]) -> Vec<Stored<E>> {
    rows.iter()
        .filter_map(|row| match serde_json::from_value::<E::Row>(row.clone()) {
            Ok(row) => Some(E::from_row(row)),
            Err(e) => {
                warn!(table = %E::TABLE, error = %e, "Skipping malformed {} row", E::LABEL);
                None
            }
        })
        .collect()
}

pub fn encode_row<E: ContentEntity>(id: Uuid, entity: &E) -> Result<Value, StoreError> {
    serde_json::to_value(E::to_row(id, entity))
        .map_err(|e| StoreError::Rejected(format!("cannot encode {}: {}", E::LABEL, e)))
}

fn single<E: ContentEntity>(rows: Vec<Value>) -> Result<Stored<E>, StoreError> {
    decode_rows::<E>(&rows).into_iter().next().ok_or(StoreError::NotFound)
}

/// Generic entity access over any row store.
pub struct StoreRepository<E> {
    store: Arc<dyn RowStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for StoreRepository<E> {
    fn clone(&self) -> Self {
        StoreRepository { store: self.store.clone(), _entity: PhantomData }
    }
}

impl<E: ContentEntity> StoreRepository<E> {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        StoreRepository { store, _entity: PhantomData }
    }
}

#[async_trait]
impl<E: ContentEntity> EntityRepository<E> for StoreRepository<E> {
    async fn list(&self) -> Result<Vec<Stored<E>>, StoreError> {
        match self.store.query(&Query::table(E::TABLE).newest_first()).await {
            Ok(rows) => Ok(decode_rows(&rows)),
            Err(StoreError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Stored<E>>, StoreError> {
        let query = Query::table(E::TABLE).eq(E::TABLE.key_column(), id.to_string()).limit(1);
        match self.store.query(&query).await {
            Ok(rows) => Ok(decode_rows(&rows).into_iter().next()),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn insert_many(&self, rows: Vec<(Uuid, E)>) -> Result<Vec<Stored<E>>, StoreError> {
        let values = rows
            .iter()
            .map(|(id, entity)| encode_row(*id, entity))
            .collect::<Result<Vec<_>, _>>()?;
        let inserted = self.store.mutate(E::TABLE, Mutation::Insert(values)).await?;
        Ok(decode_rows(&inserted))
    }

    async fn update(&self, id: Uuid, entity: &E) -> Result<Stored<E>, StoreError> {
        let changes = encode_row(id, entity)?;
        single(self.store.mutate(E::TABLE, Mutation::Update { id, changes }).await?)
    }

    async fn upsert(&self, id: Uuid, entity: &E) -> Result<Stored<E>, StoreError> {
        let row = encode_row(id, entity)?;
        single(self.store.mutate(E::TABLE, Mutation::Upsert(row)).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.mutate(E::TABLE, Mutation::Delete { id }).await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.store.count(E::TABLE, &[]).await
    }
}
