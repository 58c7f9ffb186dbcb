use actix_web::{dev::Payload, http::header, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{entities::token::Claims, errors::AuthError};

/// Claims of a session that passed the admin gate.
/// Returns 401 when the gate did not run for this request.
/// Usage: Add `admin: AdminSession` as a parameter to your handler function.
#[derive(Debug)]
pub struct AdminSession(pub Claims);

impl FromRequest for AdminSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AdminSession(claims.clone()))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}

/// Raw bearer token from the `Authorization` header.
#[derive(Debug)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn parse(value: &str) -> Option<String> {
        let mut parts = value.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token.to_string()),
            _ => None,
        }
    }

    pub fn from_http(req: &HttpRequest) -> Option<Self> {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(Self::parse)
            .map(BearerToken)
    }
}

impl FromRequest for BearerToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_http(req).ok_or_else(|| AuthError::MissingCredentials.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(BearerToken::parse("Bearer abc"), Some("abc".into()));
        assert_eq!(BearerToken::parse("bearer   abc"), Some("abc".into()));
        assert_eq!(BearerToken::parse("Basic abc"), None);
        assert_eq!(BearerToken::parse("Bearer a b"), None);
        assert_eq!(BearerToken::parse("Bearer"), None);
    }

    #[actix_rt::test]
    async fn admin_session_requires_gate_claims() {
        let req = TestRequest::default().to_http_request();
        assert!(AdminSession::extract(&req).await.is_err());

        let claims = Claims { sub: "1".into(), email: "a@b.dev".into(), jti: "j".into(), exp: 1, iat: 0 };
        req.extensions_mut().insert(claims);
        assert_eq!(AdminSession::extract(&req).await.unwrap().0.jti, "j");
    }
}
