// src/search.rs
//! Search session: one keyword search at a time, results held in memory
//! until the next search.
//!
//! Every call takes a ticket from a monotonic counter. A response whose
//! ticket is no longer the latest when it arrives is dropped, so a slow
//! provider call can never overwrite the state of a newer search.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::ChannelAnalysis;
use crate::normalize::Normalizer;
use crate::provider::DynProvider;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<ChannelAnalysis>),
    /// The provider answered successfully but returned no records.
    NoResults,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("keyword required")]
    KeywordRequired,
    #[error("analysis failed: {0}")]
    Provider(String),
    #[error("search superseded")]
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Idle,
    Loading,
    Ready,
    NoResults,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSnapshot {
    pub ticket: u64,
    pub keyword: Option<String>,
    pub status: SearchStatus,
    pub error: Option<String>,
    pub results: Vec<ChannelAnalysis>,
    pub updated_at: DateTime<Utc>,
}

impl SearchSnapshot {
    fn idle() -> Self {
        Self {
            ticket: 0,
            keyword: None,
            status: SearchStatus::Idle,
            error: None,
            results: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

pub struct SearchSession {
    provider: DynProvider,
    normalizer: Normalizer,
    latest: AtomicU64,
    state: RwLock<SearchSnapshot>,
}

impl SearchSession {
    pub fn new(provider: DynProvider, normalizer: Normalizer) -> Self {
        Self {
            provider,
            normalizer,
            latest: AtomicU64::new(0),
            state: RwLock::new(SearchSnapshot::idle()),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        match self.state.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Run one search. Empty keywords are rejected before the provider is called.
    pub async fn search(&self, keyword: &str) -> Result<SearchOutcome, SearchError> {
        counter!("search_requests_total").increment(1);
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let keyword = keyword.trim();

        if keyword.is_empty() {
            let err = SearchError::KeywordRequired;
            self.publish(ticket, None, SearchStatus::Failed, Some(err.to_string()), Vec::new());
            counter!("search_failures_total").increment(1);
            return Err(err);
        }

        // previous results are cleared as soon as a new search starts
        self.publish(
            ticket,
            Some(keyword),
            SearchStatus::Loading,
            None,
            Vec::new(),
        );

        let fetched = self.provider.fetch(keyword).await;
        if !self.is_current(ticket) {
            return Err(self.superseded(ticket, keyword));
        }

        let (status, error, results, outcome) = match fetched {
            Err(e) => {
                warn!(error = ?e, provider = self.provider.name(), keyword, "provider error");
                counter!("provider_errors_total").increment(1);
                counter!("search_failures_total").increment(1);
                let err = SearchError::Provider(format!("{e:#}"));
                (SearchStatus::Failed, Some(err.to_string()), Vec::new(), Err(err))
            }
            Ok(raws) => {
                let results = self.normalizer.normalize_batch(&raws);
                if results.is_empty() {
                    (SearchStatus::NoResults, None, Vec::new(), Ok(SearchOutcome::NoResults))
                } else {
                    let outcome = Ok(SearchOutcome::Results(results.clone()));
                    (SearchStatus::Ready, None, results, outcome)
                }
            }
        };

        let count = results.len();
        if !self.publish(ticket, Some(keyword), status, error, results) {
            return Err(self.superseded(ticket, keyword));
        }
        info!(
            target: "search",
            ticket,
            keyword,
            provider = self.provider.name(),
            ?status,
            results = count,
            "search finished"
        );
        outcome
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    fn superseded(&self, ticket: u64, keyword: &str) -> SearchError {
        counter!("search_superseded_total").increment(1);
        info!(target: "search", ticket, keyword, "dropping stale search response");
        SearchError::Superseded
    }

    /// Replace the snapshot unless a newer search has started. The ticket is
    /// re-checked under the write lock.
    fn publish(
        &self,
        ticket: u64,
        keyword: Option<&str>,
        status: SearchStatus,
        error: Option<String>,
        results: Vec<ChannelAnalysis>,
    ) -> bool {
        let mut guard = match self.state.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !self.is_current(ticket) {
            return false;
        }
        *guard = SearchSnapshot {
            ticket,
            keyword: keyword.map(str::to_owned),
            status,
            error,
            results,
            updated_at: Utc::now(),
        };
        true
    }
}
