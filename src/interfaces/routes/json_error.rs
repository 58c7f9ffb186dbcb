use actix_web::{
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    web,
};

use crate::handlers::json_error::json_error;

/// Extractor failures answer with the same `{error, details}` body as the
/// handlers do.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = json_error(payload_status(&err), "Invalid JSON body", &err.to_string());
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = json_error(StatusCode::BAD_REQUEST, "Invalid query string", &query_details(&err));
        InternalError::from_response(err, response).into()
    }));
}

fn payload_status(err: &JsonPayloadError) -> StatusCode {
    match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn query_details(err: &QueryPayloadError) -> String {
    match err {
        QueryPayloadError::Deserialize(e) => e.to_string(),
        other => other.to_string(),
    }
}
