use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::AppError, repositories::row_store::Table};

/// A persisted entity together with its immutable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<E> {
    pub id: Uuid,
    #[serde(flatten)]
    pub entity: E,
}

impl<E> Stored<E> {
    pub fn new(id: Uuid, entity: E) -> Self {
        Stored { id, entity }
    }
}

/// Entry of an admin working copy.
///
/// A `Draft` has never been written; its `key` becomes the row id when it is
/// inserted. `touched` lists the fields edited by hand since the draft was
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Record<E> {
    Draft {
        key: Uuid,
        entity: E,
        #[serde(default)]
        touched: Vec<String>,
    },
    Persisted {
        id: Uuid,
        entity: E,
    },
}

impl<E> Record<E> {
    pub fn draft(entity: E) -> Self {
        Record::Draft {
            key: Uuid::new_v4(),
            entity,
            touched: Vec::new(),
        }
    }

    /// Draft key or persisted id.
    pub fn key(&self) -> Uuid {
        match self {
            Record::Draft { key, .. } => *key,
            Record::Persisted { id, .. } => *id,
        }
    }

    pub fn entity(&self) -> &E {
        match self {
            Record::Draft { entity, .. } | Record::Persisted { entity, .. } => entity,
        }
    }

    pub fn entity_mut(&mut self) -> &mut E {
        match self {
            Record::Draft { entity, .. } | Record::Persisted { entity, .. } => entity,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Record::Draft { .. })
    }
}

impl<E> From<Stored<E>> for Record<E> {
    fn from(stored: Stored<E>) -> Self {
        Record::Persisted {
            id: stored.id,
            entity: stored.entity,
        }
    }
}

/// A content type owned by one table of the row store.
///
/// `Row` is the table's column shape; `from_row`/`to_row` are the only place
/// where column names and view-model field names meet.
pub trait ContentEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Row: Serialize + DeserializeOwned + Send;

    const TABLE: Table;
    const LABEL: &'static str;
    const CONFIRM_DELETE: bool = false;

    fn from_row(row: Self::Row) -> Stored<Self>;

    fn to_row(id: Uuid, entity: &Self) -> Self::Row;

    fn check(&self) -> Result<(), AppError>;

    /// Normalization applied right before a save.
    fn prepare(&mut self) {}

    /// Runs after a local field edit of a working-copy entry.
    fn after_edit(&mut self, _field: &str, _is_draft: bool, _touched: &[String]) {}
}

pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl<E: Dated> Dated for Stored<E> {
    fn date(&self) -> NaiveDate {
        self.entity.date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    #[test]
    fn record_wire_format_is_tagged() {
        let id = Uuid::new_v4();
        let record = Record::Persisted { id, entity: Note { text: "hi".into() } };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"state": "persisted", "id": id, "entity": {"text": "hi"}}));

        let draft: Record<Note> = serde_json::from_value(json!({
            "state": "draft",
            "key": id,
            "entity": {"text": "new"}
        }))
        .unwrap();
        assert!(draft.is_draft());
        assert_eq!(draft.key(), id);
    }

    #[test]
    fn stored_flattens_entity_fields() {
        let id = Uuid::new_v4();
        let stored = Stored::new(id, Note { text: "x".into() });
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["id"], json!(id));
        assert_eq!(value["text"], json!("x"));
    }
}
