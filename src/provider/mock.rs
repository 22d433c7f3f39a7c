// src/provider/mock.rs
//! Static demo data. Records are intentionally imperfect (string counters,
//! a stale final sample, a missing history) so the normalizer has work to do.

use anyhow::{Context, Result};
use serde_json::Value;

use super::{records_from_json, ChannelProvider};

const FIXTURE: &str = include_str!("../../fixtures/mock_channels.json");
const KEYWORD_SLOT: &str = "{keyword}";

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    records: Option<Vec<Value>>,
}

impl MockProvider {
    /// Provider backed by the embedded fixture.
    pub fn new() -> Self {
        Self { records: None }
    }

    /// Provider returning exactly `records` (keyword slots still substituted).
    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            records: Some(records),
        }
    }

    fn base_records(&self) -> Result<Vec<Value>> {
        match &self.records {
            Some(r) => Ok(r.clone()),
            None => {
                let v: Value =
                    serde_json::from_str(FIXTURE).context("parsing embedded mock fixture")?;
                records_from_json(v)
            }
        }
    }
}

#[async_trait::async_trait]
impl ChannelProvider for MockProvider {
    async fn fetch(&self, keyword: &str) -> Result<Vec<Value>> {
        let mut records = self.base_records()?;
        for r in &mut records {
            fill_keyword(r, keyword);
        }
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn fill_keyword(value: &mut Value, keyword: &str) {
    match value {
        Value::String(s) if s.contains(KEYWORD_SLOT) => {
            *s = s.replace(KEYWORD_SLOT, keyword);
        }
        Value::Array(items) => items.iter_mut().for_each(|v| fill_keyword(v, keyword)),
        Value::Object(map) => map.values_mut().for_each(|v| fill_keyword(v, keyword)),
        _ => {}
    }
}
