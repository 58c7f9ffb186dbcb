use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};
use uuid::Uuid;

use crate::{
    entities::{token::Claims, user::User},
    errors::AuthError,
    repositories::token::TokenServiceRepository,
    settings::{AppConfig, JwtKeys},
};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

/// Issues HS512 session tokens and tracks revoked sessions by `jti`.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    access_expiration: Duration,
    // jti -> exp
    revoked: Arc<DashMap<String, usize>>,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            access_expiration: Duration::minutes(config.jwt_expiration_minutes),
            revoked: Arc::new(DashMap::new()),
        }
    }

    pub fn create_jwt(&self, user: &User) -> Result<(String, Claims), AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: (now + self.access_expiration).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|_| AuthError::TokenCreation)?;
        Ok((token, claims))
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}

impl TokenServiceRepository for JwtService {
    fn create_jwt(&self, user: &User) -> Result<(String, Claims), AuthError> {
        JwtService::create_jwt(self, user)
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        JwtService::decode_jwt(self, token)
    }

    fn revoke(&self, claims: &Claims) {
        self.revoked.insert(claims.jti.clone(), claims.exp);
    }

    fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    fn prune_revoked(&self) -> usize {
        let now = Utc::now().timestamp() as usize;
        let before = self.revoked.len();
        self.revoked.retain(|_, exp| *exp > now);
        before - self.revoked.len()
    }
}
