// src/provider/gemini.rs
//! Live provider backed by the Gemini REST API: a text model produces the
//! channel records as JSON, an image model renders one thumbnail per record.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{records_from_json, ChannelProvider};
use crate::config::provider::ProviderConfig;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const THUMBNAIL_FIELD: &str = "mostViewedShortThumbnailUrl";
const THUMBNAIL_PROMPT_FIELD: &str = "mostViewedShortThumbnailDescription";

#[derive(Debug, Default, Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PredictResp {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

pub struct GeminiProvider {
    http: reqwest::Client,
    cfg: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(cfg: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("shorts-channel-analyzer/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, cfg })
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": self.cfg.temperature,
            }
        });

        let url = format!("{API_BASE}/models/{}:generateContent", self.cfg.text_model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .context("text model request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            bail!("text model returned HTTP {status}: {}", truncate(&detail, 200));
        }

        let parsed: GenerateResp = resp.json().await.context("decoding text model response")?;
        response_text(parsed)
    }

    async fn request_thumbnail(&self, description: &str) -> Result<Option<String>> {
        let body = json!({
            "instances": [{ "prompt": description }],
            "parameters": { "sampleCount": 1, "outputMimeType": "image/jpeg" }
        });
        let url = format!("{API_BASE}/models/{}:predict", self.cfg.image_model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .context("image model request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("image model returned HTTP {status}");
        }
        let parsed: PredictResp = resp.json().await.context("decoding image model response")?;
        Ok(thumbnail_data_url(parsed))
    }

    /// Thumbnail failures never fail the search; the field is left absent.
    async fn thumbnail(&self, description: &str) -> Option<String> {
        match self.request_thumbnail(description).await {
            Ok(Some(url)) => {
                debug!(bytes = url.len(), "thumbnail generated");
                Some(url)
            }
            Ok(None) => {
                warn!(description, "image response carried no image bytes");
                None
            }
            Err(e) => {
                warn!(error = ?e, "thumbnail generation failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl ChannelProvider for GeminiProvider {
    async fn fetch(&self, keyword: &str) -> Result<Vec<Value>> {
        if self.cfg.api_key.is_empty() {
            bail!("API key not configured");
        }

        let text = self
            .generate_text(&build_prompt(keyword, &self.cfg.language))
            .await?;
        let array = extract_json_array(&text)?;
        let value: Value =
            serde_json::from_str(array).context("model response is not valid JSON")?;
        let mut records = records_from_json(value)?;

        if self.cfg.generate_thumbnails {
            // one image request per record, all in flight together
            let pending = records.iter().map(|record| async move {
                match thumbnail_description(record) {
                    Some(description) => self.thumbnail(description).await,
                    None => None,
                }
            });
            let urls = join_all(pending).await;
            for (record, url) in records.iter_mut().zip(urls) {
                if let Some(url) = url {
                    attach_thumbnail(record, url);
                }
            }
        }

        Ok(records)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Concatenated text of every candidate part.
fn response_text(resp: GenerateResp) -> Result<String> {
    let text: String = resp
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();
    if text.trim().is_empty() {
        bail!("model response contained no text");
    }
    Ok(text)
}

fn thumbnail_data_url(resp: PredictResp) -> Option<String> {
    resp.predictions
        .into_iter()
        .find_map(|p| p.bytes_base64_encoded)
        .filter(|b| !b.is_empty())
        .map(|b| format!("data:image/jpeg;base64,{b}"))
}

fn thumbnail_description(record: &Value) -> Option<&str> {
    record
        .get(THUMBNAIL_PROMPT_FIELD)
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
}

fn attach_thumbnail(record: &mut Value, url: String) {
    if let Some(obj) = record.as_object_mut() {
        obj.insert(THUMBNAIL_FIELD.to_string(), Value::String(url));
    }
}

fn fence_regex() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").expect("fence regex"))
}

/// Recover the JSON array from model output: strip a Markdown fence, then
/// fall back to the outermost `[...]` span when there is surrounding prose.
pub fn extract_json_array(text: &str) -> Result<&str> {
    let mut s = text.trim();
    if let Some(inner) = fence_regex().captures(s).and_then(|c| c.get(2)) {
        let inner = inner.as_str().trim();
        if !inner.is_empty() {
            s = inner;
        }
    }

    if s.starts_with('[') && s.ends_with(']') {
        return Ok(s);
    }

    warn!(preview = %truncate(s, 120), "non-array model output, extracting array span");
    match (s.find('['), s.rfind(']')) {
        (Some(start), Some(end)) if start < end => Ok(&s[start..=end]),
        _ => bail!("response is not a JSON array; the model returned unexpected text"),
    }
}

/// Prompt asking for 3–5 simulated channels as a bare JSON array.
pub fn build_prompt(keyword: &str, language: &str) -> String {
    format!(
        r#"You simulate YouTube Shorts channel data for a keyword.
For the keyword "{keyword}", invent 3 to 5 fictional YouTube Shorts videos and the fictional channels that posted them.

Return a JSON array where each element has exactly these fields:
[
  {{
    "id": "unique id, e.g. 'channel-1'",
    "shortTitle": "a typical Shorts title from this channel, related to the keyword",
    "channelName": "fictional channel name",
    "channelAddress": "handle starting with '@', e.g. '@FunnyShortsTV'",
    "creationDate": "YYYY-MM-DD",
    "videoCount": 120,
    "totalViews": 2500000,
    "firstUploadDate": "YYYY-MM-DD",
    "latestShortUploadDate": "YYYY-MM-DD",
    "contributionAnalysis": "1-2 sentences on how this channel contributes to '{keyword}'",
    "channelTheme": "main theme or category",
    "mostViewedShortTitle": "title of the channel's most viewed Short",
    "mostViewedShortThumbnailDescription": "1-2 sentence visual description of that Short's thumbnail, usable as an image prompt",
    "viewsHistory": [
      {{ "videos": 10, "views": 50000, "date": "YYYY-MM-DD" }},
      {{ "videos": 120, "views": 2500000, "date": "YYYY-MM-DD" }}
    ]
  }}
]

Rules:
- Write every text value in {language}.
- Dates are realistic past dates; creationDate <= firstUploadDate <= latestShortUploadDate.
- videoCount and totalViews are non-negative integers.
- viewsHistory has 3 to 5 points with ascending cumulative "videos" and growing "views".
- The last viewsHistory point equals videoCount and totalViews, dated at latestShortUploadDate.
- channelAddress has no spaces. Every id is unique.
- Respond with the JSON array only, no Markdown code fences."#
    )
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
