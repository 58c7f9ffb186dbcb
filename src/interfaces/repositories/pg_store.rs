use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::{
    errors::StoreError,
    repositories::row_store::{check_row, Filter, Mutation, Query, RowStore, Table},
};

/// Row store backed by PostgreSQL.
///
/// Rows travel as `jsonb` in both directions so every table shares one code
/// path; column names are whitelisted before they are spliced into SQL.
#[derive(Clone)]
pub struct PgRowStore {
    pool: PgPool,
}

impl PgRowStore {
    pub fn new(pool: PgPool) -> Self {
        PgRowStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            Filter::Eq { column, value } => {
                builder.push(format!("to_jsonb(t.{}) = ", column));
                builder.push_bind(Json(value.clone()));
            }
        }
    }
}

fn changed_columns(table: Table, row: &Value) -> Result<Vec<String>, StoreError> {
    check_row(table, row)?;
    let columns: Vec<String> = row
        .as_object()
        .map(|o| o.keys().filter(|k| k.as_str() != table.key_column()).cloned().collect())
        .unwrap_or_default();
    if columns.is_empty() {
        return Err(StoreError::Rejected(format!("nothing to write to {}", table)));
    }
    Ok(columns)
}

impl PgRowStore {
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for row in &rows {
            check_row(table, row)?;
        }
        let sql = format!(
            "INSERT INTO {t} SELECT * FROM jsonb_populate_recordset(NULL::{t}, $1) RETURNING to_jsonb({t}.*)",
            t = table.name()
        );
        let inserted: Vec<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(Json(Value::Array(rows)))
            .fetch_all(&self.pool)
            .await?;
        Ok(inserted.into_iter().map(|j| j.0).collect())
    }

    async fn update(&self, table: Table, id: Uuid, changes: Value) -> Result<Vec<Value>, StoreError> {
        let columns = changed_columns(table, &changes)?.join(", ");
        let sql = format!(
            "UPDATE {t} SET ({cols}) = (SELECT {cols} FROM jsonb_populate_record(NULL::{t}, $1)) \
             WHERE {key} = $2 RETURNING to_jsonb({t}.*)",
            t = table.name(),
            cols = columns,
            key = table.key_column()
        );
        let updated: Option<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(Json(changes))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        updated.map(|j| vec![j.0]).ok_or(StoreError::NotFound)
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<Vec<Value>, StoreError> {
        let assignments = changed_columns(table, &row)?
            .iter()
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {t} SELECT * FROM jsonb_populate_record(NULL::{t}, $1) \
             ON CONFLICT ({key}) DO UPDATE SET {assignments} RETURNING to_jsonb({t}.*)",
            t = table.name(),
            key = table.key_column(),
        );
        let row: Json<Value> = sqlx::query_scalar(&sql).bind(Json(row)).fetch_one(&self.pool).await?;
        Ok(vec![row.0])
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<Vec<Value>, StoreError> {
        let sql = format!(
            "DELETE FROM {t} WHERE {key} = $1 RETURNING to_jsonb({t}.*)",
            t = table.name(),
            key = table.key_column()
        );
        let deleted: Vec<Json<Value>> = sqlx::query_scalar(&sql).bind(id).fetch_all(&self.pool).await?;
        if deleted.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(deleted.into_iter().map(|j| j.0).collect())
    }
}

#[async_trait]
impl RowStore for PgRowStore {
    async fn query(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        query.check()?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT to_jsonb(t) FROM {} t", query.table.name()));
        push_filters(&mut builder, &query.filters);
        if let Some(order) = &query.order {
            builder.push(format!(
                " ORDER BY t.{} {}",
                order.column,
                if order.descending { "DESC" } else { "ASC" }
            ));
        }
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }

        debug!(sql = builder.sql(), "row store query");
        let rows: Vec<Json<Value>> = builder.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|j| j.0).collect())
    }

    async fn mutate(&self, table: Table, mutation: Mutation) -> Result<Vec<Value>, StoreError> {
        match mutation {
            Mutation::Insert(rows) => self.insert(table, rows).await,
            Mutation::Update { id, changes } => self.update(table, id, changes).await,
            Mutation::Upsert(row) => self.upsert(table, row).await,
            Mutation::Delete { id } => self.delete(table, id).await,
        }
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<i64, StoreError> {
        for filter in filters {
            table.check_column(filter.column())?;
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} t", table.name()));
        push_filters(&mut builder, filters);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn is_admin(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let admin: Option<bool> = sqlx::query_scalar("SELECT is_admin($1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(admin.unwrap_or(false))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
