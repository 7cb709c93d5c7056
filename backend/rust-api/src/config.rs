use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Activity cutoff for the dashboard, in milliseconds.
    pub dashboard_timeout_ms: i64,
    /// Optional JSON file with quiz content to seed an empty database.
    pub seed_path: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let database_url = settings
            .get_string("database.url")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "sqlite://safetyquiz.db?mode=rwc".to_string());

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let dashboard_timeout_ms = settings
            .get_int("dashboard.timeout_ms")
            .ok()
            .or_else(|| {
                env::var("DASHBOARD_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(60_000);

        let seed_path = settings
            .get_string("content.seed_path")
            .ok()
            .or_else(|| env::var("QUIZ_SEED_PATH").ok());

        Ok(Config {
            database_url,
            bind_addr,
            dashboard_timeout_ms,
            seed_path,
        })
    }
}
