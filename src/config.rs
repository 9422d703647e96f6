use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_DB_URL: &str = "sqlite://popmachine.db?mode=rwc";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub app_name: String,
    pub deployment: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available

        // A full URL wins, then the DB_* parts, then a local SQLite file
        let db_url = env::var("DB_URL").ok().or_else(|| {
            let host = env::var("DB_HOST").ok()?;
            Some(format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
                env::var("DB_PASSWORD").unwrap_or_default(),
                host,
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").unwrap_or_else(|_| "popmachine".to_string()),
            ))
        });

        Config {
            db_url: db_url.unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "popmachine".to_string()),
            deployment: env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }

    pub fn for_tests() -> Self {
        Config {
            db_url: "sqlite::memory:".to_string(),
            app_name: "popmachine-test".to_string(),
            deployment: "test".to_string(),
            // An in-memory SQLite database lives and dies with its connection
            max_connections: 1,
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.db_url.starts_with("sqlite:")
    }
}

/// Open a connection pool for `config`, running migrations when `migrate` is set.
pub async fn connect(config: &Config, migrate: bool) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.db_url.clone());
    options
        .max_connections(if config.is_sqlite() {
            1
        } else {
            config.max_connections
        })
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    tracing::debug!(deployment = %config.deployment, "connected to {}", config.db_url);

    if migrate {
        Migrator::up(&db, None).await?;
        tracing::info!("database migrations complete");
    }

    Ok(db)
}
