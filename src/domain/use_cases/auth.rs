use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::entities::token::{Claims, Session, SignOutResponse};
use crate::entities::user::{AdminAccount, LoginUser, PublicUser, User, ADMIN_ROLE};
use crate::errors::{AppError, AuthError};
use crate::interfaces::repositories::user::UserRepository;
use crate::repositories::token::TokenServiceRepository;

pub struct AuthHandler<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub user_repo: R,
    pub token_service: T,
}

impl<R, T> AuthHandler<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub fn new(user_repo: R, token_service: T) -> Self {
        AuthHandler {
            user_repo,
            token_service,
        }
    }

    /// Signs in with email and password. Only admins get to keep a session.
    pub async fn authenticate(&self, request: LoginUser) -> Result<Session, AuthError> {
        request.validate().map_err(|_| AuthError::AuthenticationFailed)?;

        let user = self.user_repo.get_user_by_email(&request.email)
            .await?
            .ok_or(AuthError::AuthenticationFailed)?;

        let is_password_valid = verify_password(&request.password, &user.password_hash)
            .map_err(|e| {
                tracing::warn!(user_id = %user.id, "Password verification error: {}", e);
                AuthError::AuthenticationFailed
            })?;
        if !is_password_valid {
            return Err(AuthError::AuthenticationFailed);
        }

        let (access_token, claims) = self.token_service.create_jwt(&user)?;

        if !self.user_repo.is_admin(&user.id).await? {
            self.token_service.revoke(&claims);
            tracing::info!(user_id = %user.id, "Non-admin sign-in refused");
            return Err(AuthError::AccessDenied);
        }

        tracing::info!(user_id = %user.id, "Admin signed in");
        Ok(Session::new(access_token, claims.exp, public_user(&user, true)))
    }

    fn claims(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.token_service.decode_jwt(token)?.claims;
        if self.token_service.is_revoked(&claims.jti) {
            return Err(AuthError::SessionRevoked);
        }
        Ok(claims)
    }

    /// Checks the admin role of the session on every call. A session that
    /// lost the role is signed out.
    pub async fn verify_admin(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.claims(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        if !self.user_repo.is_admin(&user_id).await? {
            self.token_service.revoke(&claims);
            tracing::warn!(%user_id, "Session without admin role signed out");
            return Err(AuthError::AccessDenied);
        }
        Ok(claims)
    }

    /// Current user of a live session.
    pub async fn session(&self, token: &str) -> Result<PublicUser, AuthError> {
        let claims = self.claims(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let user = self.user_repo.get_user_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        let is_admin = self.user_repo.is_admin(&user_id).await?;
        Ok(public_user(&user, is_admin))
    }

    /// Revokes the session. Signing out twice is not an error.
    pub fn sign_out(&self, token: &str) -> SignOutResponse {
        match self.token_service.decode_jwt(token) {
            Ok(data) => {
                self.token_service.revoke(&data.claims);
                tracing::info!(user_id = %data.claims.sub, "Signed out");
            }
            Err(e) => tracing::debug!("Sign-out with unusable token: {}", e),
        }
        SignOutResponse::default()
    }

    /// Creates the configured admin account unless it already exists, and
    /// makes sure it holds the admin role.
    pub async fn bootstrap_admin(&self, account: AdminAccount) -> Result<Uuid, AppError> {
        account.validate()?;

        let user_id = match self.user_repo.get_user_by_email(&account.email).await? {
            Some(existing) => existing.id,
            None => {
                let hashed_password = hash_password(&account.password)?;
                self.user_repo.create_user(&User::new(&account.email, hashed_password)).await?
            }
        };
        self.user_repo.grant_role(&user_id, ADMIN_ROLE).await?;

        tracing::info!(%user_id, "Admin account ready");
        Ok(user_id)
    }
}

fn public_user(user: &User, is_admin: bool) -> PublicUser {
    PublicUser {
        id: user.id,
        email: user.email.clone(),
        is_admin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::JwtService,
        repositories::{memory_store::MemoryRowStore, row_store::Table, user::StoreUserRepo},
        settings::AppConfig,
    };
    use serde_json::json;
    use std::sync::Arc;

    const PASSWORD: &str = "Tr0ub4dor&3-Horse!Staple";

    async fn handler() -> (Arc<MemoryRowStore>, AuthHandler<StoreUserRepo, JwtService>) {
        let store = Arc::new(MemoryRowStore::new());
        let handler = AuthHandler::new(StoreUserRepo::new(store.clone()), JwtService::new(&AppConfig { jwt_secret: "k".repeat(64), ..AppConfig::default() }));
        (store, handler)
    }

    fn login(email: &str, password: &str) -> LoginUser {
        LoginUser { email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn admin_signs_in_and_passes_the_gate() {
        let (_, handler) = handler().await;
        handler
            .bootstrap_admin(AdminAccount { email: "admin@site.dev".into(), password: PASSWORD.into() })
            .await
            .unwrap();

        let session = handler.authenticate(login("Admin@Site.dev", PASSWORD)).await.unwrap();
        assert!(session.user.is_admin);
        assert!(handler.verify_admin(&session.access_token).await.is_ok());

        handler.sign_out(&session.access_token);
        assert_eq!(
            handler.verify_admin(&session.access_token).await.unwrap_err(),
            AuthError::SessionRevoked
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (_, handler) = handler().await;
        handler
            .bootstrap_admin(AdminAccount { email: "admin@site.dev".into(), password: PASSWORD.into() })
            .await
            .unwrap();

        let wrong = handler.authenticate(login("admin@site.dev", "nope")).await.unwrap_err();
        let unknown = handler.authenticate(login("ghost@site.dev", PASSWORD)).await.unwrap_err();
        let malformed = handler.authenticate(login("not-an-email", PASSWORD)).await.unwrap_err();
        assert_eq!(wrong, AuthError::AuthenticationFailed);
        assert_eq!(unknown, wrong);
        assert_eq!(malformed, wrong);
    }

    #[tokio::test]
    async fn non_admin_is_refused_a_session() {
        let (store, handler) = handler().await;
        let user = User::new("reader@site.dev", hash_password(PASSWORD).unwrap());
        handler.user_repo.create_user(&user).await.unwrap();

        assert_eq!(
            handler.authenticate(login("reader@site.dev", PASSWORD)).await.unwrap_err(),
            AuthError::AccessDenied
        );
        assert!(store.rows(Table::UserRoles).is_empty());
    }

    #[tokio::test]
    async fn losing_the_role_signs_the_session_out() {
        let (store, handler) = handler().await;
        let user_id = handler
            .bootstrap_admin(AdminAccount { email: "admin@site.dev".into(), password: PASSWORD.into() })
            .await
            .unwrap();
        let session = handler.authenticate(login("admin@site.dev", PASSWORD)).await.unwrap();

        store.seed(Table::UserRoles, vec![json!({"user_id": user_id, "role": "editor"})]);
        assert_eq!(handler.verify_admin(&session.access_token).await.unwrap_err(), AuthError::AccessDenied);

        store.seed(Table::UserRoles, vec![json!({"user_id": user_id, "role": "admin"})]);
        assert_eq!(
            handler.verify_admin(&session.access_token).await.unwrap_err(),
            AuthError::SessionRevoked
        );
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let (store, handler) = handler().await;
        let account = || AdminAccount { email: "admin@site.dev".into(), password: PASSWORD.into() };
        let first = handler.bootstrap_admin(account()).await.unwrap();
        let second = handler.bootstrap_admin(account()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.rows(Table::Users).len(), 1);
        assert_eq!(store.rows(Table::UserRoles).len(), 1);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let (_, handler) = handler().await;
        assert_eq!(handler.verify_admin("garbage").await.unwrap_err(), AuthError::InvalidToken);
        assert_eq!(handler.sign_out("garbage").redirect, "/");
    }
}
