// This is the entry point of the Google Drive app for Mattermost.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Google and Mattermost HTTP APIs, stores)
// - `mattermost/` = The Apps framework adapter (HTTP routes, JWT, bindings)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve the app over HTTP until Ctrl-C

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "mattermost/mattermost_layer.rs"]
mod mattermost;

mod app_config;

use std::sync::Arc;

use anyhow::Context;

use crate::app_config::AppConfig;
use crate::core::google::GoogleApi;
use crate::core::kv::KvStore;
use crate::core::mattermost::MattermostApi;
use crate::core::oauth::OAuthService;
use crate::core::upload::UploadService;
use crate::infra::google::GoogleApiClient;
use crate::infra::mattermost::MattermostRestClient;
use crate::mattermost::{router, AppState};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to read configuration")?;
    tracing::info!(?config, "Loaded configuration");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let google: Arc<dyn GoogleApi> = Arc::new(GoogleApiClient::new(config.google.clone()));
    // The same client serves the REST API and the Apps KV/OAuth2 storage, so
    // OAuth2 records land where the host reads them back into call contexts.
    let rest = Arc::new(MattermostRestClient::new());
    let mattermost: Arc<dyn MattermostApi> = rest.clone();
    let kv: Arc<dyn KvStore> = rest;

    let oauth = OAuthService::new(google.clone(), mattermost.clone(), kv.clone());
    let upload = UploadService::new(google, mattermost);

    let bind_addr = config.bind_addr;
    let state = Arc::new(AppState {
        config,
        oauth,
        upload,
        kv,
    });

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Google Drive app listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}
