use std::sync::Arc;

use anyhow::Context;

mod app;
mod auth;
mod config;
mod db;
mod doc;
mod dto;
mod error;
mod favorites;
mod ingredients;
mod policy;
mod recipes;
mod state;
#[cfg(test)]
mod testing;
mod users;
mod validation;

use crate::{app::build_app, config::AppConfig, db::PgStore, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealmatch=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let store = PgStore::connect(&config.database_url).await?;
    sqlx::migrate!("./migrations")
        .run(store.pool())
        .await
        .context("run migrations")?;

    if config.google.is_none() {
        tracing::info!("google sign-in disabled: GOOGLE_* settings incomplete");
    }

    let app_state = AppState::from_store(config, Arc::new(store))?;
    let config = app_state.config.clone();
    app::serve(build_app(app_state), &config).await
}
