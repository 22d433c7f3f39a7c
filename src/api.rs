use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::analysis::ChannelAnalysis;
use crate::chart::{ChartLayout, PlottableSeries};
use crate::config::ProviderConfig;
use crate::normalize::Normalizer;
use crate::provider::{build_provider, DynProvider};
use crate::search::{SearchError, SearchOutcome, SearchSession, SearchSnapshot, SearchStatus};

/// Directory holding the single-page UI.
pub const UI_DIR: &str = "ui";

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchSession>,
    pub chart: ChartLayout,
}

impl AppState {
    pub fn new(provider: DynProvider) -> Self {
        Self {
            search: Arc::new(SearchSession::new(provider, Normalizer::new())),
            chart: ChartLayout::default(),
        }
    }

    /// Provider from `config/provider.json` (or `$PROVIDER_CONFIG_PATH`) and env.
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = ProviderConfig::load_default()?;
        Ok(Self::new(build_provider(&cfg)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/search", post(search))
        .route("/search/latest", get(latest))
        .fallback_service(ServeDir::new(UI_DIR))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SearchReq {
    #[serde(default)]
    keyword: String,
}

/// One result card: the analysis plus its projected trend chart.
#[derive(Serialize)]
struct ChannelCard {
    #[serde(flatten)]
    analysis: ChannelAnalysis,
    chart: Option<PlottableSeries>,
    #[serde(rename = "chartPath")]
    chart_path: Option<String>,
}

#[derive(Serialize)]
struct SearchResp {
    status: SearchStatus,
    keyword: String,
    results: Vec<ChannelCard>,
}

#[derive(Serialize)]
struct LatestResp {
    ticket: u64,
    keyword: Option<String>,
    status: SearchStatus,
    error: Option<String>,
    updated_at: String,
    results: Vec<ChannelCard>,
}

#[derive(Serialize)]
struct ErrorResp {
    error: String,
}

fn cards(layout: &ChartLayout, results: Vec<ChannelAnalysis>) -> Vec<ChannelCard> {
    results
        .into_iter()
        .map(|analysis| {
            let chart = layout.project(&analysis.views_history);
            let chart_path = chart.as_ref().map(PlottableSeries::path);
            ChannelCard {
                analysis,
                chart,
                chart_path,
            }
        })
        .collect()
}

async fn search(State(state): State<AppState>, Json(body): Json<SearchReq>) -> Response {
    let provider = state.search.provider_name();
    let keyword = body.keyword.trim().to_string();

    let (code, payload) = match state.search.search(&body.keyword).await {
        Ok(SearchOutcome::Results(results)) => (
            StatusCode::OK,
            Json(SearchResp {
                status: SearchStatus::Ready,
                keyword,
                results: cards(&state.chart, results),
            })
            .into_response(),
        ),
        Ok(SearchOutcome::NoResults) => (
            StatusCode::OK,
            Json(SearchResp {
                status: SearchStatus::NoResults,
                keyword,
                results: Vec::new(),
            })
            .into_response(),
        ),
        Err(e) => {
            let code = match e {
                SearchError::KeywordRequired => StatusCode::BAD_REQUEST,
                SearchError::Provider(_) => StatusCode::BAD_GATEWAY,
                SearchError::Superseded => StatusCode::CONFLICT,
            };
            (
                code,
                Json(ErrorResp {
                    error: e.to_string(),
                })
                .into_response(),
            )
        }
    };

    (code, [("x-provider", provider)], payload).into_response()
}

async fn latest(State(state): State<AppState>) -> Json<LatestResp> {
    let SearchSnapshot {
        ticket,
        keyword,
        status,
        error,
        results,
        updated_at,
    } = state.search.snapshot();

    Json(LatestResp {
        ticket,
        keyword,
        status,
        error,
        updated_at: updated_at.to_rfc3339(),
        results: cards(&state.chart, results),
    })
}
