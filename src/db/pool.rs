use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Pool sized for a small internal service: a couple of warm connections,
/// headroom for bursts of dashboard queries, and a bounded lifetime so
/// long-idle connections get recycled.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .min_connections(2)
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}
