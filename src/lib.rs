use std::{sync::Arc, time::Duration};

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, password, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, cache, db, http, limiter, realtime, utils};

use auth::jwt::JwtService;
use cache::content_cache::ContentCache;
use constants::{LOGIN_ATTEMPTS, LOGIN_WINDOW};
use entities::record::ContentEntity;
use http::{form_relay::FormRelay, stats_client::StatsClient};
use limiter::rate_limiter::KeyedRateLimiter;
use repositories::{entity_repo::StoreRepository, row_store::RowStore, user::StoreUserRepo};
use settings::AppConfig;
use use_cases::{
    auth::AuthHandler,
    coding_stats::{CodingProfileService, DefaultUsernames},
    contact::ContactHandler,
    content::ContentRenderer,
};

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn RowStore>,
    pub cache: Arc<ContentCache>,
    pub content: ContentRenderer,
    pub auth_handler: AppAuthHandler,
    pub contact: ContactHandler,
    pub coding_profiles: CodingProfileService,
    pub login_limiter: KeyedRateLimiter,
}

pub type AppAuthHandler = AuthHandler<StoreUserRepo, JwtService>;

impl AppState {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn RowStore>,
        stats_client: Arc<dyn StatsClient>,
        relay: Arc<dyn FormRelay>,
    ) -> Self {
        let cache = Arc::new(ContentCache::new(Duration::from_secs(config.cache_ttl_secs)));
        let content = ContentRenderer::new(store.clone(), cache.clone());

        let auth_handler = AuthHandler::new(StoreUserRepo::new(store.clone()), JwtService::new(config));
        let contact = ContactHandler::new(
            store.clone(),
            content.clone(),
            relay,
            config.contact_limit_per_hour as usize,
            config.contact_relay_url.clone(),
        );
        let coding_profiles = CodingProfileService::new(content.clone(), stats_client, DefaultUsernames::from(config));

        AppState {
            config: config.clone(),
            store,
            cache,
            content,
            auth_handler,
            contact,
            coding_profiles,
            login_limiter: KeyedRateLimiter::new(LOGIN_ATTEMPTS, LOGIN_WINDOW),
        }
    }

    /// Repository of one content type over the shared row store.
    pub fn repository<E: ContentEntity>(&self) -> StoreRepository<E> {
        StoreRepository::new(self.store.clone())
    }
}
