mod auth;
mod config;
mod db;
mod error;
mod extractors;
mod handlers;
mod leave;
mod middleware;
mod models;
mod openapi;
mod startup;

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use auth::{CognitoClient, JwksCache, SessionStore};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use handlers::MetricsState;

pub struct AppState {
    pub db: sqlx::PgPool,
    pub cognito: CognitoClient,
    pub jwks_cache: Arc<JwksCache>,
    pub sessions: SessionStore,
    pub config: AppConfig,
    pub metrics: Arc<MetricsState>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with conditional JSON/text output
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,leavedesk_axum=debug,tower_http=debug".into());

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    // Create database pool
    let db = db::create_pool(&config.database_url).await.map_err(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        e
    })?;

    tracing::info!("Database pool created successfully");

    // One-shot schema bootstrap
    db::ensure_schema(&db).await.map_err(|e| {
        tracing::error!("Schema bootstrap failed: {}", e);
        e
    })?;

    tracing::info!("Schema bootstrap complete");

    // Initialize metrics recorder
    let metrics_state = Arc::new(handlers::setup_metrics_recorder());
    tracing::info!("Metrics recorder initialized");

    // Cognito client and JWKS cache for the user pool
    let cognito = CognitoClient::new(config.cognito_endpoint(), config.cognito_client_id.clone());
    let jwks_cache = Arc::new(JwksCache::new(config.jwks_url()));

    // Session row cache (id → record) with 5-minute TTL; rows stay
    // authoritative in Postgres
    let session_cache = Cache::builder()
        .time_to_live(Duration::from_secs(300))
        .max_capacity(10_000)
        .build();
    let sessions = SessionStore::new(db.clone(), session_cache);

    let port = config.port;

    // Create application state
    let state = Arc::new(AppState {
        db,
        cognito,
        jwks_cache,
        sessions,
        config,
        metrics: metrics_state,
    });

    // Build router
    let app = startup::build_router(state);

    // Start server
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
