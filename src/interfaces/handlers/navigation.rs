use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::{
    use_cases::{
        extractors::BearerToken,
        navigation::{Access, RouteGuard},
    },
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct NavigateQuery {
    pub path: String,
}

/// Decides what the client shows for a path. The caller's session, if any,
/// is checked for the admin role.
pub async fn navigate(
    request: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<NavigateQuery>,
) -> impl Responder {
    let access = match BearerToken::from_http(&request) {
        Some(BearerToken(token)) => match state.auth_handler.session(&token).await {
            Ok(user) => Access { authenticated: true, is_admin: user.is_admin },
            Err(e) => {
                tracing::debug!("Navigation with unusable session: {}", e);
                Access::default()
            }
        },
        None => Access::default(),
    };

    HttpResponse::Ok().json(RouteGuard::decide(&query.path, access))
}
