use std::time::Duration;

use actix_web::{http::{header, StatusCode}, HttpResponse};

pub fn json_error(status: StatusCode, error: &str, details: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": error,
        "details": details
    }))
}

pub fn too_many_requests(retry_after: Duration) -> HttpResponse {
    let seconds = retry_after.as_secs().max(1);
    let mut response = json_error(
        StatusCode::TOO_MANY_REQUESTS,
        "Too many requests",
        &format!("Try again in {}", humantime::format_duration(Duration::from_secs(seconds))),
    );
    if let Ok(value) = header::HeaderValue::from_str(&seconds.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}
