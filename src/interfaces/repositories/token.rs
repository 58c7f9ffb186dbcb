use jsonwebtoken::TokenData;

use crate::{
    entities::{token::Claims, user::User},
    errors::AuthError,
};

pub trait TokenServiceRepository: Send + Sync {
    /// Creates a signed session token for the user.
    fn create_jwt(&self, user: &User) -> Result<(String, Claims), AuthError>;

    /// Decodes a token and returns its claims.
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;

    /// Revokes the session until its natural expiry.
    fn revoke(&self, claims: &Claims);

    fn is_revoked(&self, jti: &str) -> bool;

    /// Drops revocations whose tokens have expired anyway. Returns how many.
    fn prune_revoked(&self) -> usize;
}
