use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{
    config::Config,
    error::{FoodgramError, QueryError},
};

pub async fn establish_connection(config: &Config) -> Result<Pool<Postgres>, FoodgramError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;

    log::info!(
        "Connected to database with at most {} connections",
        config.database_max_connections
    );

    Ok(pool)
}

/// Applies the embedded migrations in `migrations/`.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), FoodgramError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        log::error!("Migration failed: {e}");
        FoodgramError::Store(QueryError::new(e.to_string()))
    })?;

    Ok(())
}
