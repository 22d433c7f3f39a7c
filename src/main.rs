//! Shorts Channel Analyzer - Binary Entrypoint
//! Boots the Axum HTTP server with the configured provider, the search
//! session, the static UI and the Prometheus endpoint.

use shorts_channel_analyzer::{api, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shorts_channel_analyzer=info,warn"));

    // The runtime may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in production.
    let _ = dotenvy::dotenv();

    init_tracing();

    let state = api::AppState::from_env()?;
    info!(provider = state.search.provider_name(), "provider ready");

    let mut router = api::router(state);
    match Metrics::init() {
        Ok(metrics) => router = router.merge(metrics.router()),
        Err(e) => warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
