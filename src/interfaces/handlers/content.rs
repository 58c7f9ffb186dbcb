use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    errors::AppError,
    repositories::row_store::Table,
    use_cases::content::{Detail, PostFilter, ProjectFilter},
    utils::valid_uuid::valid_uuid,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Tables whose cached pages a visitor may reload.
const REFRESHABLE: [Table; 6] = [
    Table::Projects,
    Table::BlogPosts,
    Table::Certificates,
    Table::Hackathons,
    Table::CodingProfiles,
    Table::ProfileSettings,
];

#[instrument(skip(state))]
pub async fn home(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.content.home().await)
}

#[instrument(skip(state))]
pub async fn about(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.content.about().await)
}

#[instrument(skip(state))]
pub async fn profile(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.content.profile().await)
}

#[instrument(skip(state, query))]
pub async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<ProjectFilter>,
) -> Result<impl Responder, AppError> {
    let page = state.content.projects(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(state))]
pub async fn get_project(
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&project_id)?;
    match state.content.project(id).await {
        Detail::Found(page) => Ok(HttpResponse::Ok().json(page)),
        Detail::NotFound => Err(AppError::NotFound(format!("Project {} not found", id))),
    }
}

#[instrument(skip(state, query))]
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PostFilter>,
) -> impl Responder {
    HttpResponse::Ok().json(state.content.posts(&query).await)
}

#[instrument(skip(state))]
pub async fn get_post(
    slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    match state.content.post(&slug).await {
        Detail::Found(page) => Ok(HttpResponse::Ok().json(page)),
        Detail::NotFound => Err(AppError::NotFound(format!("Post '{}' not found", slug))),
    }
}

#[instrument(skip(state))]
pub async fn list_certificates(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(state.content.certificates(query.limit).await)
}

#[instrument(skip(state))]
pub async fn list_hackathons(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(state.content.hackathons(query.limit).await)
}

#[instrument(skip(state))]
pub async fn coding_profile(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.coding_profiles.widgets().await)
}

/// Retry after a failed load: drops the cached rows of one table.
#[instrument(skip(state))]
pub async fn refresh(
    table: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let table: Table = table.parse()?;
    if !REFRESHABLE.contains(&table) {
        return Err(AppError::InvalidInput(format!("{} cannot be refreshed", table)));
    }
    state.content.refresh(table);
    Ok(HttpResponse::NoContent().finish())
}
