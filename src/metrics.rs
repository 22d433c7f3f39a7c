use anyhow::Context;
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use axum::{routing::get, Router};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Only one per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("search_requests_total", "Search requests received.");
        describe_counter!(
            "search_failures_total",
            "Searches rejected (empty keyword) or failed at the provider."
        );
        describe_counter!(
            "search_superseded_total",
            "Provider responses dropped because a newer search started."
        );
        describe_counter!(
            "normalize_repairs_total",
            "Repairs applied to raw provider records."
        );
        describe_counter!("provider_errors_total", "Provider fetch/parse errors.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
