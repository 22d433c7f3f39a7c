// tests/search_flow.rs
//
// Search session contract:
// - empty keyword → validation error, no provider call, empty results
// - provider failure → single user-facing error, results cleared
// - empty batch → NoResults (not an error)
// - a response from a superseded search never overwrites newer state

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tokio::sync::Notify;

use shorts_channel_analyzer::normalize::SequentialIds;
use shorts_channel_analyzer::provider::records_from_json;
use shorts_channel_analyzer::search::{SearchSnapshot, SearchStatus};
use shorts_channel_analyzer::{
    ChannelProvider, Normalizer, SearchError, SearchOutcome, SearchSession,
};

#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ChannelProvider for CountingProvider {
    async fn fetch(&self, keyword: &str) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![json!({ "id": keyword, "videoCount": 2, "totalViews": 20 })])
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

struct FailingProvider;

#[async_trait::async_trait]
impl ChannelProvider for FailingProvider {
    async fn fetch(&self, _keyword: &str) -> Result<Vec<Value>> {
        // what a live provider reports for `{ "channels": [...] }`
        records_from_json(json!({ "channels": [] }))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Blocks searches for "slow" until released.
#[derive(Default)]
struct GatedProvider {
    entered: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl ChannelProvider for GatedProvider {
    async fn fetch(&self, keyword: &str) -> Result<Vec<Value>> {
        if keyword == "slow" {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if keyword == "boom" {
            return Err(anyhow!("upstream timeout"));
        }
        Ok(vec![json!({ "id": keyword })])
    }
    fn name(&self) -> &'static str {
        "gated"
    }
}

fn session_with(provider: Arc<dyn ChannelProvider>) -> SearchSession {
    SearchSession::new(
        provider,
        Normalizer::with_id_generator(Arc::new(SequentialIds::new("flow"))),
    )
}

fn ids(snap: &SearchSnapshot) -> Vec<&str> {
    snap.results.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn empty_keyword_never_reaches_provider() {
    let provider = Arc::new(CountingProvider::default());
    let session = session_with(provider.clone());

    for blank in ["", "   ", "\t\n"] {
        assert_eq!(session.search(blank).await, Err(SearchError::KeywordRequired));
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

    let snap = session.snapshot();
    assert_eq!(snap.status, SearchStatus::Failed);
    assert!(snap.results.is_empty());
}

#[tokio::test]
async fn non_array_response_is_a_provider_error() {
    let session = session_with(Arc::new(FailingProvider));
    let err = session.search("cats").await.unwrap_err();
    assert!(matches!(err, SearchError::Provider(_)));
    assert!(err.to_string().starts_with("analysis failed:"));
    assert!(err.to_string().contains("not an array"));

    let snap = session.snapshot();
    assert_eq!(snap.status, SearchStatus::Failed);
    assert_eq!(snap.error, Some(err.to_string()));
    assert!(snap.results.is_empty());
}

#[tokio::test]
async fn provider_error_discards_previous_results() {
    let session = session_with(Arc::new(GatedProvider::default()));
    assert!(matches!(
        session.search("fast").await,
        Ok(SearchOutcome::Results(_))
    ));
    assert_eq!(ids(&session.snapshot()), vec!["fast"]);

    let err = session.search("boom").await.unwrap_err();
    assert_eq!(err, SearchError::Provider("upstream timeout".into()));
    assert!(session.snapshot().results.is_empty());
}

#[tokio::test]
async fn stale_response_is_dropped() {
    let provider = Arc::new(GatedProvider::default());
    let session = Arc::new(session_with(provider.clone()));

    let slow = {
        let session = session.clone();
        tokio::spawn(async move { session.search("slow").await })
    };
    provider.entered.notified().await;

    let fresh = session.search("fast").await;
    assert!(matches!(fresh, Ok(SearchOutcome::Results(ref r)) if r[0].id == "fast"));

    provider.release.notify_one();
    let stale = slow.await.expect("join");
    assert_eq!(stale, Err(SearchError::Superseded));

    let snap = session.snapshot();
    assert_eq!(snap.keyword.as_deref(), Some("fast"));
    assert_eq!(snap.status, SearchStatus::Ready);
    assert_eq!(ids(&snap), vec!["fast"]);
}

#[tokio::test]
async fn blank_keyword_also_supersedes_in_flight_search() {
    let provider = Arc::new(GatedProvider::default());
    let session = Arc::new(session_with(provider.clone()));

    let slow = {
        let session = session.clone();
        tokio::spawn(async move { session.search("slow").await })
    };
    provider.entered.notified().await;

    assert_eq!(session.search("").await, Err(SearchError::KeywordRequired));
    provider.release.notify_one();
    assert_eq!(slow.await.expect("join"), Err(SearchError::Superseded));

    let snap = session.snapshot();
    assert_eq!(snap.status, SearchStatus::Failed);
    assert!(snap.results.is_empty());
}
