use std::sync::Arc;

use anyhow::Context;
use safetyquiz_api::{
    config::Config,
    create_router,
    models::normalize::normalize_config,
    services::AppState,
    storage::{sqlite, SqliteContentStore, SqliteGroupDirectory, SqliteSessionStore},
};
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safetyquiz_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting safety quiz API");

    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to open the database")?;
    sqlite::init_schema(&pool)
        .await
        .context("Failed to initialize the database schema")?;
    tracing::info!("SQLite ready at {}", config.database_url);

    let content = SqliteContentStore::new(pool.clone(), &config.database_url);
    if let Some(seed_path) = &config.seed_path {
        seed_content(&content, seed_path).await?;
    }

    let app_state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(SqliteSessionStore::new(pool.clone())),
        Arc::new(content),
        Arc::new(SqliteGroupDirectory::new(pool)),
    ));

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server exited")?;
    Ok(())
}

/// Loads raw quiz content from disk and seeds an empty database.
/// Messy source fields are tolerated; normalization cleans them up.
async fn seed_content(content: &SqliteContentStore, seed_path: &str) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(seed_path)
        .await
        .with_context(|| format!("Failed to read seed file {seed_path}"))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Seed file is not valid JSON")?;
    let config = normalize_config(&value).context("Seed content failed validation")?;

    if content.seed_if_empty(&config).await? {
        tracing::info!("Seeded quiz content from {}", seed_path);
    } else {
        tracing::info!("Quiz content already present; seed file ignored");
    }
    Ok(())
}
