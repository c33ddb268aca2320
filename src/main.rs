//! bankline service entry point
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌──────────┐
//! │  Config  │───▶│ Postgres │───▶│ TransferCore │───▶│ Gateway  │
//! │  (YAML)  │    │  (pool)  │    │ (engine/...) │    │  (axum)  │
//! └──────────┘    └──────────┘    └──────────────┘    └──────────┘
//! ```

use std::sync::Arc;

use bankline::account::Database;
use bankline::config::AppConfig;
use bankline::gateway::{self, AppState};
use bankline::logging::init_logging;
use bankline::transfer::TransferEngine;
use bankline::user_auth::UserAuthService;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);

    let _guard = init_logging(&config);
    tracing::info!(
        env = %env,
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        "starting bankline"
    );

    let db = Database::connect(&config.postgres_url).await?;
    db.health_check().await?;
    let pool = db.pool().clone();

    let engine = TransferEngine::new(pool.clone());
    let auth = UserAuthService::new(
        pool.clone(),
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl_hours,
    );

    let state = Arc::new(AppState::new(engine, auth, pool));

    gateway::serve(&config.gateway, state).await
}
