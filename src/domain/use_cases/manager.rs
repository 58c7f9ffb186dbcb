use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    cache::content_cache::ContentCache,
    entities::record::{ContentEntity, Dated, Record, Stored},
    errors::{AppError, SaveError, SavePhase, StoreError},
    repositories::entity_repo::EntityRepository,
    use_cases::content::sort_newest_first,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub updated: usize,
    pub inserted: usize,
}

/// Working copy of one entity list in the admin area.
///
/// `add` and `edit` only touch the local list. `delete` goes to the store
/// immediately. `save_all` writes every entry: updates first, all at once,
/// then one batched insert of the drafts.
pub struct EntityManager<E: ContentEntity, R: EntityRepository<E>> {
    repo: R,
    cache: Arc<ContentCache>,
    records: Vec<Record<E>>,
}

impl<E, R> EntityManager<E, R>
where
    E: ContentEntity + Dated,
    R: EntityRepository<E>,
{
    /// Loads the persisted list, newest first.
    pub async fn load(repo: R, cache: Arc<ContentCache>) -> Result<Self, AppError> {
        let mut items = repo.list().await?;
        sort_newest_first(&mut items);
        Ok(EntityManager {
            repo,
            cache,
            records: items.into_iter().map(Record::from).collect(),
        })
    }
}

impl<E, R> EntityManager<E, R>
where
    E: ContentEntity,
    R: EntityRepository<E>,
{
    /// Wraps a working copy sent back by an admin client.
    pub fn with_records(repo: R, cache: Arc<ContentCache>, records: Vec<Record<E>>) -> Self {
        EntityManager { repo, cache, records }
    }

    pub fn records(&self) -> &[Record<E>] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record<E>> {
        self.records
    }

    pub fn add_entity(&mut self, entity: E) -> Uuid {
        let record = Record::draft(entity);
        let key = record.key();
        self.records.push(record);
        key
    }

    /// Sets one field of the entry at `index` from its JSON value.
    pub fn edit(&mut self, index: usize, field: &str, value: Value) -> Result<(), AppError> {
        let record = self
            .records
            .get_mut(index)
            .ok_or_else(|| AppError::InvalidInput(format!("No {} at index {}", E::LABEL, index)))?;

        let mut current = serde_json::to_value(record.entity())
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        let fields = current
            .as_object_mut()
            .ok_or_else(|| AppError::InternalError(format!("{} is not an object", E::LABEL)))?;
        if !fields.contains_key(field) {
            return Err(AppError::validation(field, format!("Unknown {} field", E::LABEL)));
        }
        fields.insert(field.to_string(), value);

        let updated: E = serde_json::from_value(current)
            .map_err(|e| AppError::validation(field, format!("Invalid value: {}", e)))?;

        let is_draft = record.is_draft();
        *record.entity_mut() = updated;
        if let Record::Draft { touched, .. } = &mut *record {
            if !touched.iter().any(|f| f == field) {
                touched.push(field.to_string());
            }
        }

        let touched = match &*record {
            Record::Draft { touched, .. } => touched.clone(),
            Record::Persisted { .. } => Vec::new(),
        };
        record.entity_mut().after_edit(field, is_draft, &touched);
        Ok(())
    }

    /// Removes an entry. Drafts only exist locally; persisted rows are deleted
    /// remotely right away and put back at their index if that fails.
    pub async fn delete(&mut self, key: Uuid, confirmed: bool) -> Result<(), AppError> {
        let index = self
            .records
            .iter()
            .position(|r| r.key() == key)
            .ok_or_else(|| AppError::NotFound(format!("{} {} is not in the list", E::LABEL, key)))?;

        if self.records[index].is_draft() {
            self.records.remove(index);
            return Ok(());
        }

        if E::CONFIRM_DELETE && !confirmed {
            return Err(AppError::ConfirmationRequired(format!(
                "Deleting a {} cannot be undone; confirm to proceed",
                E::LABEL
            )));
        }

        let removed = self.records.remove(index);
        match self.repo.delete(key).await {
            Ok(()) | Err(StoreError::NotFound) => {
                self.cache.invalidate(E::TABLE);
                info!(table = %E::TABLE, %key, "Deleted {}", E::LABEL);
                Ok(())
            }
            Err(e) => {
                warn!(table = %E::TABLE, %key, error = %e, "Delete failed, restoring {}", E::LABEL);
                self.records.insert(index, removed);
                Err(e.into())
            }
        }
    }

    pub async fn save_all(&mut self) -> Result<SaveReport, AppError> {
        // Validate everything before any network call.
        let mut prepared: Vec<Record<E>> = self.records.clone();
        for record in prepared.iter_mut() {
            record.entity_mut().prepare();
        }
        let mut problems = Vec::new();
        for (index, record) in prepared.iter().enumerate() {
            if let Err(AppError::ValidationError(errors)) = record.entity().check() {
                problems.extend(errors.into_iter().map(|mut e| {
                    e.field = format!("[{}].{}", index, e.field);
                    e
                }));
            }
        }
        if !problems.is_empty() {
            return Err(AppError::ValidationError(problems));
        }

        let repo = &self.repo;
        let updates = prepared.iter().filter_map(|record| match record {
            Record::Persisted { id, entity } => Some(async move { (id, repo.update(*id, entity).await) }),
            Record::Draft { .. } => None,
        });
        let results = join_all(updates).await;
        let updated = results.len();
        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(_) => None,
                Err(e) => Some(format!("{}: {}", id, e)),
            })
            .collect();
        if !failures.is_empty() {
            warn!(table = %E::TABLE, failed = failures.len(), "Update phase failed, nothing inserted");
            return Err(AppError::SaveFailed(SaveError { phase: SavePhase::Update, failures }));
        }

        let drafts: Vec<(Uuid, E)> = prepared
            .iter()
            .filter_map(|record| match record {
                Record::Draft { key, entity, .. } => Some((*key, entity.clone())),
                Record::Persisted { .. } => None,
            })
            .collect();
        let inserted = drafts.len();
        if !drafts.is_empty() {
            if let Err(e) = self.repo.insert_many(drafts).await {
                warn!(table = %E::TABLE, error = %e, "Insert phase failed");
                return Err(AppError::SaveFailed(SaveError {
                    phase: SavePhase::Insert,
                    failures: vec![e.to_string()],
                }));
            }
        }

        self.cache.invalidate(E::TABLE);
        self.records = prepared
            .into_iter()
            .map(|record| match record {
                Record::Draft { key, entity, .. } => Record::from(Stored::new(key, entity)),
                persisted => persisted,
            })
            .collect();

        info!(table = %E::TABLE, updated, inserted, "Saved {} list", E::LABEL);
        Ok(SaveReport { updated, inserted })
    }
}

impl<E, R> EntityManager<E, R>
where
    E: ContentEntity + Default,
    R: EntityRepository<E>,
{
    /// Appends a blank draft and returns its key.
    pub fn add(&mut self) -> Uuid {
        self.add_entity(E::default())
    }
}

/// Single-row settings (site profile, coding profile) read by the admin forms.
pub async fn load_singleton<E, R>(repo: &R) -> Result<Option<Stored<E>>, AppError>
where
    E: ContentEntity,
    R: EntityRepository<E>,
{
    Ok(repo.list().await?.into_iter().next())
}

/// Upserts a single-row setting. The row is created on first save.
pub async fn save_singleton<E, R>(repo: &R, cache: &ContentCache, mut entity: E) -> Result<Stored<E>, AppError>
where
    E: ContentEntity,
    R: EntityRepository<E>,
{
    entity.prepare();
    entity.check()?;

    let id = match load_singleton(repo).await? {
        Some(existing) => existing.id,
        None => Uuid::new_v4(),
    };
    let saved = repo.upsert(id, &entity).await?;
    cache.invalidate(E::TABLE);
    info!(table = %E::TABLE, %id, "Saved {}", E::LABEL);
    Ok(saved)
}
