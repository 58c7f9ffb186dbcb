use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::entities::user::LoginUser;
use crate::handlers::json_error::too_many_requests;
use crate::use_cases::extractors::BearerToken;
use crate::utils::get_client_ip::get_client_ip;
use crate::AppState;

#[post("/login")]
#[instrument(skip(state, request, user), fields(client_ip = tracing::field::Empty))]
pub async fn login(
    request: HttpRequest,
    state: web::Data<AppState>,
    user: web::Json<LoginUser>
) -> impl Responder {
    let client_ip = get_client_ip(&request, state.config.trust_forwarded_for);
    tracing::Span::current().record("client_ip", client_ip.as_str());

    if let Err(retry_after) = state.login_limiter.check(&client_ip) {
        tracing::warn!("Sign-in attempts throttled");
        return too_many_requests(retry_after);
    }

    match state.auth_handler.authenticate(user.into_inner()).await {
        Ok(signed_in) => HttpResponse::Ok().json(signed_in),
        Err(e) => actix_web::ResponseError::error_response(&e),
    }
}

#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    token: BearerToken,
) -> impl Responder {
    HttpResponse::Ok().json(state.auth_handler.sign_out(&token.0))
}

#[get("/session")]
pub async fn session(
    state: web::Data<AppState>,
    token: BearerToken,
) -> impl Responder {
    match state.auth_handler.session(&token.0).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(e) => actix_web::ResponseError::error_response(&e),
    }
}
