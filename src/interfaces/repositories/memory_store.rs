use std::{cmp::Ordering, collections::{HashMap, HashSet}};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    entities::user::ADMIN_ROLE,
    errors::StoreError,
    repositories::row_store::{check_row, Filter, Mutation, Query, RowStore, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Query,
    Insert,
    Update,
    Upsert,
    Delete,
    Count,
}

impl From<&Mutation> for StoreOp {
    fn from(mutation: &Mutation) -> Self {
        match mutation {
            Mutation::Insert(_) => StoreOp::Insert,
            Mutation::Update { .. } => StoreOp::Update,
            Mutation::Upsert(_) => StoreOp::Upsert,
            Mutation::Delete { .. } => StoreOp::Delete,
        }
    }
}

/// Row store held in process memory.
///
/// Serves the demo mode when no database is configured and doubles as the
/// backend of the test suite: a `recording` store logs every call, and
/// failures can be injected per table and operation.
#[derive(Default)]
pub struct MemoryRowStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    failures: Mutex<HashSet<(Table, StoreOp)>>,
    offline: RwLock<bool>,
    recording: bool,
    calls: Mutex<Vec<(StoreOp, Table)>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps a log of every call for `calls`/`call_count`.
    pub fn recording() -> Self {
        MemoryRowStore { recording: true, ..Self::default() }
    }

    /// Replaces the contents of a table.
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        self.tables.write().insert(table, rows);
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables.read().get(&table).cloned().unwrap_or_default()
    }

    pub fn fail_on(&self, table: Table, op: StoreOp) {
        self.failures.lock().insert((table, op));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }

    pub fn calls(&self) -> Vec<(StoreOp, Table)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, op: StoreOp, table: Table) -> usize {
        self.calls.lock().iter().filter(|c| **c == (op, table)).count()
    }

    fn enter(&self, op: StoreOp, table: Table) -> Result<(), StoreError> {
        if self.recording {
            self.calls.lock().push((op, table));
        }
        if *self.offline.read() {
            return Err(StoreError::Unavailable("row store is offline".into()));
        }
        if self.failures.lock().contains(&(table, op)) {
            return Err(StoreError::Unavailable(format!("injected {:?} failure on {}", op, table)));
        }
        Ok(())
    }
}

fn key_of(table: Table, row: &Value) -> Option<&Value> {
    row.get(table.key_column())
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => row.get(column).unwrap_or(&Value::Null) == value,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Fills columns missing from a row with `null`, like a table insert would.
fn complete_row(table: Table, mut row: Value) -> Value {
    if let Some(object) = row.as_object_mut() {
        for column in table.columns() {
            object.entry(column.to_string()).or_insert(Value::Null);
        }
    }
    row
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn query(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.enter(StoreOp::Query, query.table)?;
        query.check()?;

        let mut rows: Vec<Value> = self
            .rows(query.table)
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.descending { ord.reverse() } else { ord }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn mutate(&self, table: Table, mutation: Mutation) -> Result<Vec<Value>, StoreError> {
        self.enter(StoreOp::from(&mutation), table)?;

        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();
        let key_column = table.key_column();

        match mutation {
            Mutation::Insert(new_rows) => {
                let mut seen: HashSet<String> = rows
                    .iter()
                    .filter_map(|r| key_of(table, r).map(Value::to_string))
                    .collect();
                for row in &new_rows {
                    check_row(table, row)?;
                    if let Some(key) = key_of(table, row) {
                        if table != Table::UserRoles && !seen.insert(key.to_string()) {
                            return Err(StoreError::Conflict(format!("duplicate {} in {}", key_column, table)));
                        }
                    }
                }
                let inserted: Vec<Value> = new_rows.into_iter().map(|r| complete_row(table, r)).collect();
                rows.extend(inserted.iter().cloned());
                Ok(inserted)
            }
            Mutation::Update { id, changes } => {
                check_row(table, &changes)?;
                let key = Value::String(id.to_string());
                let row = rows
                    .iter_mut()
                    .find(|r| key_of(table, r) == Some(&key))
                    .ok_or(StoreError::NotFound)?;
                if let (Some(target), Some(source)) = (row.as_object_mut(), changes.as_object()) {
                    for (column, value) in source {
                        if column != key_column {
                            target.insert(column.clone(), value.clone());
                        }
                    }
                }
                Ok(vec![row.clone()])
            }
            Mutation::Upsert(row) => {
                check_row(table, &row)?;
                let row = complete_row(table, row);
                let key = key_of(table, &row).cloned();
                match rows.iter_mut().find(|r| key.is_some() && key_of(table, r) == key.as_ref()) {
                    Some(existing) => *existing = row.clone(),
                    None => rows.push(row.clone()),
                }
                Ok(vec![row])
            }
            Mutation::Delete { id } => {
                let key = Value::String(id.to_string());
                let before = rows.len();
                let (removed, kept): (Vec<Value>, Vec<Value>) =
                    rows.drain(..).partition(|r| key_of(table, r) == Some(&key));
                *rows = kept;
                if rows.len() == before {
                    return Err(StoreError::NotFound);
                }
                Ok(removed)
            }
        }
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<i64, StoreError> {
        self.enter(StoreOp::Count, table)?;
        for filter in filters {
            table.check_column(filter.column())?;
        }
        let count = self
            .rows(table)
            .iter()
            .filter(|row| filters.iter().all(|f| matches(row, f)))
            .count();
        Ok(count as i64)
    }

    async fn is_admin(&self, user_id: Uuid) -> Result<bool, StoreError> {
        self.enter(StoreOp::Query, Table::UserRoles)?;
        let user = Value::String(user_id.to_string());
        Ok(self.rows(Table::UserRoles).iter().any(|row| {
            row.get("user_id") == Some(&user) && row.get("role").and_then(Value::as_str) == Some(ADMIN_ROLE)
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if *self.offline.read() {
            return Err(StoreError::Unavailable("row store is offline".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(id: Uuid, date: &str, tech: &[&str]) -> Value {
        json!({"id": id, "title": "P", "date": date, "technologies": tech})
    }

    #[tokio::test]
    async fn plain_store_keeps_no_call_log() {
        let store = MemoryRowStore::new();
        for _ in 0..3 {
            store.query(&Query::table(Table::Projects)).await.unwrap();
        }
        assert!(store.calls().is_empty());

        let recorded = MemoryRowStore::recording();
        recorded.query(&Query::table(Table::Projects)).await.unwrap();
        assert_eq!(recorded.call_count(StoreOp::Query, Table::Projects), 1);
    }

    #[tokio::test]
    async fn query_orders_and_limits() {
        let store = MemoryRowStore::recording();
        store.seed(Table::Projects, vec![
            project(Uuid::new_v4(), "2023-01-01", &["Rust"]),
            project(Uuid::new_v4(), "2025-01-01", &["Go", "Rust"]),
            project(Uuid::new_v4(), "2024-01-01", &["Go"]),
        ]);

        let rows = store
            .query(&Query::table(Table::Projects).newest_first())
            .await
            .unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r["date"].as_str().unwrap()).collect();
        assert_eq!(dates, vec!["2025-01-01", "2024-01-01", "2023-01-01"]);

        let limited = store.query(&Query::table(Table::Projects).newest_first().limit(1)).await.unwrap();
        assert_eq!(limited[0]["date"], "2025-01-01");
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = MemoryRowStore::recording();
        let missing = Uuid::new_v4();
        let update = Mutation::Update { id: missing, changes: json!({"title": "x"}) };
        assert_eq!(store.mutate(Table::Projects, update).await, Err(StoreError::NotFound));
        assert_eq!(
            store.mutate(Table::Projects, Mutation::Delete { id: missing }).await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids_and_unknown_columns() {
        let store = MemoryRowStore::recording();
        let id = Uuid::new_v4();
        let rows = vec![json!({"id": id, "name": "A"}), json!({"id": id, "name": "B"})];
        assert!(matches!(
            store.mutate(Table::Hackathons, Mutation::Insert(rows)).await,
            Err(StoreError::Conflict(_))
        ));
        let bad = vec![json!({"id": Uuid::new_v4(), "nickname": "A"})];
        assert!(matches!(
            store.mutate(Table::Hackathons, Mutation::Insert(bad)).await,
            Err(StoreError::Rejected(_))
        ));
        assert!(store.rows(Table::Hackathons).is_empty());
    }

    #[tokio::test]
    async fn upsert_creates_then_replaces() {
        let store = MemoryRowStore::recording();
        let id = Uuid::new_v4();
        store.mutate(Table::ProfileSettings, Mutation::Upsert(json!({"id": id, "name": "Ada"}))).await.unwrap();
        store.mutate(Table::ProfileSettings, Mutation::Upsert(json!({"id": id, "name": "Grace"}))).await.unwrap();
        let rows = store.rows(Table::ProfileSettings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Grace");
    }

    #[tokio::test]
    async fn injected_failures_and_call_log() {
        let store = MemoryRowStore::recording();
        store.fail_on(Table::Certificates, StoreOp::Query);
        assert!(store.query(&Query::table(Table::Certificates)).await.is_err());
        assert!(store.query(&Query::table(Table::Projects)).await.is_ok());
        assert_eq!(store.call_count(StoreOp::Query, Table::Certificates), 1);

        store.set_offline(true);
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn is_admin_reads_roles() {
        let store = MemoryRowStore::recording();
        let admin = Uuid::new_v4();
        store.seed(Table::UserRoles, vec![json!({"user_id": admin, "role": "admin"})]);
        assert!(store.is_admin(admin).await.unwrap());
        assert!(!store.is_admin(Uuid::new_v4()).await.unwrap());
    }
}
