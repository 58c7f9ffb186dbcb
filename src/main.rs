use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use tokio::sync::mpsc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use portfolio_site::{
    background_task::{run_invalidation_dispatcher, start_purge_task},
    db::postgres::{create_pool, run_migrations},
    entities::user::AdminAccount,
    graceful_shutdown::shutdown_signal,
    http::{form_relay::HttpFormRelay, stats_client::HttpStatsClient},
    realtime::listener::RealtimeSubscription,
    repositories::{memory_store::MemoryRowStore, pg_store::PgRowStore, row_store::RowStore},
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_cors(config: &AppConfig) -> Cors {
    let origins = config.cors_origins();
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);
    tracing::info!("Loaded configuration: {:?}", config);

    // Held for the lifetime of the server; dropping it stops the listener.
    let mut _subscription: Option<RealtimeSubscription> = None;
    let (change_tx, change_rx) = mpsc::channel(64);

    let store: Arc<dyn RowStore> = if config.uses_memory_store() {
        tracing::warn!("No DATABASE_URL configured, serving from the in-memory store");
        Arc::new(MemoryRowStore::new())
    } else {
        let pool = match create_pool(&config.database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Failed to create database connection pool: {}", e);
                std::process::exit(1);
            }
        };
        if config.run_migrations {
            if let Err(e) = run_migrations(&pool).await {
                tracing::error!("Migrations failed: {}", e);
                std::process::exit(1);
            }
        }
        match RealtimeSubscription::connect(&pool, change_tx.clone()).await {
            Ok(subscription) => _subscription = Some(subscription),
            Err(e) => tracing::warn!("Realtime updates disabled, relying on cache expiry: {}", e),
        }
        Arc::new(PgRowStore::new(pool))
    };
    drop(change_tx);

    let (stats_client, relay) = match (HttpStatsClient::new(&config), HttpFormRelay::new(&config)) {
        (Ok(stats), Ok(relay)) => (Arc::new(stats), Arc::new(relay)),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = web::Data::new(AppState::new(&config, store, stats_client, relay));

    if let (Some(email), Some(password)) = (config.admin_email.clone(), config.admin_password.clone()) {
        match app_state.auth_handler.bootstrap_admin(AdminAccount { email, password }).await {
            Ok(id) => tracing::info!(user_id = %id, "Admin account ready"),
            Err(e) => tracing::error!("Could not provision admin account: {}", e),
        }
    }

    tokio::spawn(run_invalidation_dispatcher(change_rx, app_state.cache.clone()));
    tokio::spawn(start_purge_task(app_state.clone()));

    let server_addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        "Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let cors_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(build_cors(&cors_config))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count.max(1))
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
