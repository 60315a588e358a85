// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mys_social_api::api;
use mys_social_api::config::Config;
use mys_social_api::db::init_database;
use mys_social_api::identity::HttpIdentityProvider;
use mys_social_api::metrics::Metrics;
use mys_social_api::state::AppState;
use mys_social_api::storage::HttpObjectStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,mys_social_api=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::get();
    info!("Initialized configuration");

    // Initialize database and run migrations
    let db = Arc::new(init_database().await?);
    info!("Connected to database");

    // Wire up external collaborators
    let identity = Arc::new(HttpIdentityProvider::new(config.identity.url.clone()));
    let storage = Arc::new(HttpObjectStorage::new(
        config.storage.url.clone(),
        config.storage.service_key.clone(),
    ));
    let metrics = Arc::new(Metrics::new()?);

    let state = AppState::new(db, identity, storage, metrics);

    // Start API server; runs until a shutdown signal arrives
    api::start_api_server(state).await?;

    info!("MySocial API shutdown complete");
    Ok(())
}
