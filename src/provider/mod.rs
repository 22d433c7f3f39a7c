// src/provider/mod.rs
//! Data sources for raw channel records.
//!
//! A provider returns untrusted JSON; everything it yields goes through the
//! normalizer before reaching the UI.

pub mod gemini;
pub mod mock;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::provider::{ProviderConfig, ProviderKind};

pub use gemini::GeminiProvider;
pub use mock::MockProvider;

#[async_trait::async_trait]
pub trait ChannelProvider: Send + Sync {
    /// Fetch raw channel records for a (non-empty) keyword.
    async fn fetch(&self, keyword: &str) -> Result<Vec<Value>>;
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn ChannelProvider>;

/// Unwrap a top-level JSON array; anything else is a provider failure.
pub fn records_from_json(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(anyhow!(
            "analysis data is not an array (got {})",
            json_kind(&other)
        )),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Factory: pick the provider from config and environment.
///
/// * `PROVIDER_MODE=mock` always yields the mock provider.
/// * Otherwise `config.provider` decides. A live provider without an API key
///   is still built; its fetches fail with a clear error.
pub fn build_provider(config: &ProviderConfig) -> DynProvider {
    let forced_mock = std::env::var("PROVIDER_MODE")
        .map(|v| v.eq_ignore_ascii_case("mock"))
        .unwrap_or(false);

    if forced_mock {
        info!("PROVIDER_MODE=mock, using mock provider");
        return Arc::new(MockProvider::new());
    }

    match config.provider {
        ProviderKind::Mock => Arc::new(MockProvider::new()),
        ProviderKind::Gemini => {
            if config.api_key.is_empty() {
                warn!("gemini provider selected but no API key configured; searches will fail");
            }
            match GeminiProvider::new(config.clone()) {
                Ok(p) => Arc::new(p),
                Err(e) => {
                    warn!(error = ?e, "failed to build gemini provider, falling back to mock");
                    Arc::new(MockProvider::new())
                }
            }
        }
    }
}
