//! Levelcraft · level authoring backend for the kids' learning game
//!
//! - Axum HTTP API over subjects, sections and levels
//! - WebSocket wizard sessions (one socket = one authoring wizard)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                   : u16 (default 3000)
//!   LEVELCRAFT_CONFIG_PATH : path to TOML config (store snapshot, subject seeds)
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod catalog;
mod validator;
mod sections;
mod builder;
mod store;
mod wizard;
mod config;
mod seeds;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    // Open the document store and make sure every subject document exists.
    let state = Arc::new(AppState::from_env().await?);

    let app = build_router(state.clone());

    let addr: SocketAddr = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

    let listener = TcpListener::bind(addr).await?;
    info!(target: "levelcraft", %addr, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
