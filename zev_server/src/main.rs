use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zev_core::ZebraConfig;

mod route;

static ENV_PORT: &str = "PORT";
const DEFAULT_PORT: u16 = 10000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ZebraConfig::from_env().context("invalid CRM configuration")?;
    if let Err(err) = config.credentials() {
        warn!("{err} Every page view will fail until they are set.");
    }
    let port = port_from(std::env::var(ENV_PORT).ok())?;

    let app = Router::new()
        .route("/", get(route::events::handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("server failed")?;
    Ok(())
}

fn port_from(value: Option<String>) -> Result<u16> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(value) => value
            .parse()
            .with_context(|| format!("'{value}' is not a valid {ENV_PORT}")),
    }
}
