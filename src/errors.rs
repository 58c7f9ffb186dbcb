use std::borrow::Cow;
use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use jsonwebtoken::errors::{ErrorKind, Error as JwtError};
use derive_more::Display;
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    InvalidInput(String),
    NotFound(String),
    Conflict(String),
    ConfirmationRequired(String),
    UnauthorizedAccess,
    ForbiddenAccess,
    RateLimited(String),
    RemoteFailure(String),
    SaveFailed(SaveError),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ConfirmationRequired(msg) => write!(f, "Confirmation required: {}", msg),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized access"),
            AppError::ForbiddenAccess => write!(f, "Forbidden access"),
            AppError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            AppError::RemoteFailure(msg) => write!(f, "Remote failure: {}", msg),
            AppError::SaveFailed(err) => write!(f, "{}", err),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            AppError::NotFound(msg) => {
                serde_json::json!({
                    "error": "not_found",
                    "message": msg
                })
            }
            AppError::SaveFailed(err) => {
                serde_json::json!({
                    "error": "Save failed",
                    "phase": err.phase,
                    "failures": err.failures
                })
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenAccess => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::RemoteFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::SaveFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Single-field validation failure.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn to_http_response(&self) -> HttpResponse {
        self.error_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors = Vec::new();
        collect_field_errors("", &errors, &mut field_errors);
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

// Nested structs and lists report as `parent.child` / `parent[0].child`.
fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => out.extend(errs.iter().map(|e| FieldError {
                field: path.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string()),
            })),
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Rejected(msg) => AppError::InvalidInput(msg),
            StoreError::Unavailable(msg) => AppError::RemoteFailure(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Failure reported by the hosted row store.
///
/// `NotFound` is the store's "zero rows" code: read paths treat it as an empty
/// result, write paths surface it.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum StoreError {
    #[display("no rows matched")]
    NotFound,

    #[display("conflict: {_0}")]
    Conflict(String),

    #[display("request rejected: {_0}")]
    Rejected(String),

    #[display("row store unavailable: {_0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23505")) => {
                StoreError::Conflict("Database conflict occurred".into())
            }
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23503")) => {
                StoreError::Conflict("Foreign key violation".into())
            }
            sqlx::Error::Database(e) => StoreError::Rejected(e.message().to_string()),
            _ => StoreError::Unavailable(format!("Database error: {}", err))
        }
    }
}

/// Which half of a batched save failed.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavePhase {
    #[display("update")]
    Update,

    #[display("insert")]
    Insert,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveError {
    pub phase: SavePhase,
    pub failures: Vec<String>,
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Save failed during {} phase: {}", self.phase, self.failures.join("; "))
    }
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum AuthError {
    #[display("Invalid token")]
    InvalidToken,

    #[display("Token expired")]
    TokenExpired,

    #[display("Missing credentials")]
    MissingCredentials,

    #[display("Token creation error")]
    TokenCreation,

    #[display("Authentication failed")]
    AuthenticationFailed,

    #[display("Access denied")]
    AccessDenied,

    #[display("Session revoked")]
    SessionRevoked,

    #[display("Authentication backend error: {_0}")]
    Backend(String),
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let error_message = match self {
            AuthError::TokenExpired => "Token has expired".to_string(),
            _ => self.to_string(),
        };
        let mut body = serde_json::json!({"error": error_message});
        if matches!(self, AuthError::AccessDenied) {
            body["redirect"] = serde_json::json!("/");
        }
        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            AuthError::AccessDenied => StatusCode::FORBIDDEN,
            AuthError::SessionRevoked => StatusCode::UNAUTHORIZED,
            AuthError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Backend(err.to_string())
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(_: ValidationErrors) -> Self {
        AuthError::MissingCredentials
    }
}

#[derive(Debug, Display)]
pub enum PasswordError {
    #[display("Invalid password parameters: {_0}")]
    InvalidParameters(String),

    #[display("Password hashing failed: {_0}")]
    HashingError(String),

    #[display("Invalid password hash format: {_0}")]
    InvalidHashFormat(String),

    #[display("Password verification failed: {_0}")]
    VerificationError(String),

    #[display("Password is too weak: {_0}")]
    TooWeak(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
