use actix_web::{web, HttpResponse, Responder};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{
        coding_profile::CodingProfileSettings,
        profile::ProfileSettings,
        record::{ContentEntity, Dated, Record, Stored},
    },
    errors::AppError,
    repositories::row_store::Table,
    use_cases::{
        extractors::AdminSession,
        manager::{load_singleton, save_singleton, EntityManager, SaveReport},
    },
    utils::valid_uuid::valid_uuid,
    AppState,
};

/// Content types managed as lists in the dashboard.
pub trait ListEntity: ContentEntity + Dated + Default {}

impl<E: ContentEntity + Dated + Default> ListEntity for E {}

#[derive(Debug, Deserialize)]
pub struct WorkingCopy<E> {
    pub records: Vec<Record<E>>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest<E> {
    pub records: Vec<Record<E>>,
    pub index: usize,
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
struct RecordsResponse<'a, E> {
    entity: &'static str,
    records: &'a [Record<E>],
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<SaveReport>,
}

fn records_response<E: ContentEntity>(records: &[Record<E>], report: Option<SaveReport>) -> HttpResponse {
    HttpResponse::Ok().json(RecordsResponse { entity: E::LABEL, records, report })
}

#[derive(Debug, Deserialize)]
pub struct BulkEditRequest {
    pub raw: String,
}

#[instrument(skip(_admin, state))]
pub async fn list_records<E: ListEntity>(
    _admin: AdminSession,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let manager = EntityManager::load(state.repository::<E>(), state.cache.clone()).await?;
    Ok(records_response(manager.records(), None))
}

/// Blank draft for the "add" button.
pub async fn new_record<E: ListEntity>(_admin: AdminSession) -> impl Responder {
    HttpResponse::Ok().json(Record::draft(E::default()))
}

#[instrument(skip(_admin, state, body))]
pub async fn edit_record<E: ListEntity>(
    _admin: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<EditRequest<E>>,
) -> Result<impl Responder, AppError> {
    let EditRequest { records, index, field, value } = body.into_inner();
    let mut manager = EntityManager::with_records(state.repository::<E>(), state.cache.clone(), records);
    manager.edit(index, &field, value)?;
    Ok(records_response(manager.records(), None))
}

#[instrument(skip(admin, state, body), fields(admin = %admin.0.email))]
pub async fn save_records<E: ListEntity>(
    admin: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<WorkingCopy<E>>,
) -> Result<impl Responder, AppError> {
    let mut manager = EntityManager::with_records(state.repository::<E>(), state.cache.clone(), body.into_inner().records);
    let report = manager.save_all().await?;
    Ok(records_response(manager.records(), Some(report)))
}

#[instrument(skip(admin, state), fields(admin = %admin.0.email))]
pub async fn delete_record<E: ListEntity>(
    admin: AdminSession,
    record_id: web::Path<String>,
    query: web::Query<DeleteQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&record_id)?;
    let mut manager = EntityManager::load(state.repository::<E>(), state.cache.clone()).await?;
    manager.delete(id, query.confirm).await?;
    Ok(records_response(manager.records(), None))
}

#[derive(Debug, Serialize)]
struct SettingsResponse<E> {
    id: Option<Uuid>,
    settings: E,
    #[serde(skip_serializing_if = "Option::is_none")]
    editor: Option<String>,
}

impl<E: Default> From<Option<Stored<E>>> for SettingsResponse<E> {
    fn from(stored: Option<Stored<E>>) -> Self {
        match stored {
            Some(stored) => SettingsResponse { id: Some(stored.id), settings: stored.entity, editor: None },
            None => SettingsResponse { id: None, settings: E::default(), editor: None },
        }
    }
}

#[instrument(skip(_admin, state))]
pub async fn get_profile(
    _admin: AdminSession,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let stored = load_singleton(&state.repository::<ProfileSettings>()).await?;
    Ok(HttpResponse::Ok().json(SettingsResponse::from(stored)))
}

#[instrument(skip(admin, state, body), fields(admin = %admin.0.email))]
pub async fn put_profile(
    admin: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<ProfileSettings>,
) -> Result<impl Responder, AppError> {
    let saved = save_singleton(&state.repository::<ProfileSettings>(), &state.cache, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(saved))
}

#[instrument(skip(_admin, state))]
pub async fn get_coding_profile(
    _admin: AdminSession,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let stored = load_singleton(&state.repository::<CodingProfileSettings>()).await?;
    let mut response = SettingsResponse::from(stored);
    response.editor = serde_json::to_string_pretty(&response.settings.platforms()).ok();
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(admin, state, body), fields(admin = %admin.0.email))]
pub async fn put_coding_profile(
    admin: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<CodingProfileSettings>,
) -> Result<impl Responder, AppError> {
    let saved = save_singleton(&state.repository::<CodingProfileSettings>(), &state.cache, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(saved))
}

/// Raw JSON editor. Errors come back with the submitted text untouched.
#[instrument(skip(admin, state, body), fields(admin = %admin.0.email))]
pub async fn put_coding_profile_json(
    admin: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<BulkEditRequest>,
) -> Result<impl Responder, AppError> {
    let BulkEditRequest { raw } = body.into_inner();
    let repo = state.repository::<CodingProfileSettings>();
    let mut settings = load_singleton(&repo).await?.map(|s| s.entity).unwrap_or_default();

    if let Err(e) = settings.apply_json(&raw) {
        tracing::info!(error = %e, "Rejected coding profile JSON");
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": e.to_string(),
            "raw": raw
        })));
    }

    let saved = save_singleton(&repo, &state.cache, settings).await?;
    Ok(HttpResponse::Ok().json(saved))
}

const DASHBOARD_TABLES: [Table; 5] = [
    Table::Projects,
    Table::BlogPosts,
    Table::Certificates,
    Table::Hackathons,
    Table::ContactMessages,
];

/// Row counts per table. A failed count is reported next to the others.
#[instrument(skip(admin, state))]
pub async fn dashboard(
    admin: AdminSession,
    state: web::Data<AppState>,
) -> impl Responder {
    let counts = join_all(DASHBOARD_TABLES.iter().map(|table| {
        let store = state.store.clone();
        async move { (*table, store.count(*table, &[]).await) }
    }))
    .await;

    let mut totals = serde_json::Map::new();
    for (table, result) in counts {
        let entry = match result {
            Ok(count) => json!({"count": count}),
            Err(e) => {
                tracing::warn!(%table, error = %e, "Dashboard count failed");
                json!({"count": null, "error": e.to_string()})
            }
        };
        totals.insert(table.to_string(), entry);
    }

    HttpResponse::Ok().json(json!({
        "admin": admin.0.email,
        "counts": totals
    }))
}
