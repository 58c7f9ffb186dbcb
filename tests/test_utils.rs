#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::NormalizePath,
    web, App, Error,
};
use async_trait::async_trait;

use portfolio_site::{
    entities::{contact_message::ContactForm, user::{AdminAccount, LoginUser}},
    http::{
        form_relay::FormRelay,
        stats_client::{GithubUser, LeetCodeStats, RemoteError, StatsClient},
    },
    repositories::memory_store::MemoryRowStore,
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    AppState,
};

pub const ADMIN_EMAIL: &str = "admin@portfolio.dev";
pub const ADMIN_PASSWORD: &str = "Tr0ub4dor&3-Horse!Staple";

/// Stats upstream that is always down.
pub struct OfflineStats;

#[async_trait]
impl StatsClient for OfflineStats {
    async fn leetcode_stats(&self, _username: &str) -> Result<LeetCodeStats, RemoteError> {
        Err(RemoteError::Network("connection refused".into()))
    }

    async fn github_user(&self, _username: &str) -> Result<GithubUser, RemoteError> {
        Err(RemoteError::Network("connection refused".into()))
    }
}

/// Relay that counts what it was asked to forward.
#[derive(Default)]
pub struct CountingRelay {
    pub submissions: AtomicUsize,
}

#[async_trait]
impl FormRelay for CountingRelay {
    async fn submit(&self, _endpoint: &str, _form: &ContactForm) -> Result<(), RemoteError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        jwt_secret: "integration_test_secret_that_is_long_enough_for_hs512".to_string(),
        contact_relay_url: Some("https://relay.example.com/f/portfolio".to_string()),
        ..Default::default()
    }
}

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryRowStore>,
    pub relay: Arc<CountingRelay>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryRowStore::recording());
        let relay = Arc::new(CountingRelay::default());
        let state = web::Data::new(AppState::new(
            &test_config(),
            store.clone(),
            Arc::new(OfflineStats),
            relay.clone(),
        ));

        state
            .auth_handler
            .bootstrap_admin(AdminAccount {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .expect("admin bootstrap");

        TestApp { state, store, relay }
    }
}

/// Router as `main` builds it, minus CORS and request logging.
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(NormalizePath::trim())
        .configure(configure_routes)
}

impl TestApp {
    /// Signs the bootstrapped admin in and returns the bearer token.
    pub async fn admin_token(&self) -> String {
        self.state
            .auth_handler
            .authenticate(LoginUser {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .expect("admin login")
            .access_token
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
