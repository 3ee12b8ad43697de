//! Folio HTTP backend: serves categories and article pages as JSON.

mod handlers;
mod request_context;
mod routes;
mod state;

use std::env;

use anyhow::{Context, Result};
use folio_runtime::{init_tracing, LoggingOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_tracing(&LoggingOptions::from_env("backend.log"))?;

    // Load environment variables
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());

    tracing::info!("Starting Folio backend server");
    let app_state = state::AppState::from_env().await?;
    let app = routes::create_router(app_state);

    let addr = format!("{}:{}", bind_addr, port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
