// src/normalize.rs
//! Normalizer: turns an untrusted provider record into a consistent
//! [`ChannelAnalysis`].
//!
//! Never fails. Missing or malformed fields get defaults, counters are
//! coerced to non-negative integers, earnings are recomputed and the views
//! history is repaired so that it is sorted by `videos` and ends exactly at
//! `(videoCount, totalViews)`. Every repair is logged and returned to the
//! caller; normalizing an already normalized record is a no-op.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::counter;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::warn;

use crate::analysis::{
    earnings_bounds, ChannelAnalysis, ViewsHistoryPoint, PLACEHOLDER, PLACEHOLDER_HANDLE,
    PLACEHOLDER_THUMBNAIL_DESCRIPTION,
};

/// Source of ids for records that arrive without one.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// `channel-` followed by 9 random base-36 characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> String {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut rng = rand::rng();
        let suffix: String = (0..9)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        format!("channel-{suffix}")
    }
}

/// Deterministic `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

/// A fix the normalizer had to apply to a raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    /// `id` was missing, empty, or already taken in the batch.
    IdGenerated { id: String },
    /// `viewsHistory` was absent, empty or not an array; two points were synthesized.
    HistorySynthesized,
    /// A non-final sample claimed more videos than the channel has.
    SampleDropped { videos: u64, views: u64 },
    /// The final sample did not match `(videoCount, totalViews)`.
    LastSampleOverwritten { videos: u64, views: u64 },
    /// Samples were not ascending by `videos`.
    HistoryReordered,
}

impl Repair {
    pub fn touches_history(&self) -> bool {
        !matches!(self, Repair::IdGenerated { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub analysis: ChannelAnalysis,
    pub repairs: Vec<Repair>,
}

impl Normalized {
    pub fn history_repaired(&self) -> bool {
        self.repairs.iter().any(Repair::touches_history)
    }
}

#[derive(Clone)]
pub struct Normalizer {
    ids: Arc<dyn IdGenerator>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(RandomIds))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Normalize one raw record. A non-object value is treated as `{}`.
    pub fn normalize(&self, raw: &Value) -> Normalized {
        let empty = Map::new();
        let obj = raw.as_object().unwrap_or(&empty);
        let mut repairs = Vec::new();

        let video_count = coerce_count(obj.get("videoCount"));
        let total_views = coerce_count(obj.get("totalViews"));
        let (estimated_min_earnings, estimated_max_earnings) = earnings_bounds(total_views);

        let first_upload = date_field(obj, "firstUploadDate");
        let latest_upload = date_field(obj, "latestShortUploadDate");

        let views_history = repair_history(
            obj.get("viewsHistory"),
            video_count,
            total_views,
            first_upload.as_deref(),
            latest_upload.as_deref(),
            &mut repairs,
        );
        let latest_upload = latest_upload.or_else(|| first_upload.clone());

        let id = match text_field(obj, "id") {
            Some(id) => id,
            None => {
                let id = self.ids.next_id();
                repairs.push(Repair::IdGenerated { id: id.clone() });
                id
            }
        };

        let analysis = ChannelAnalysis {
            id,
            short_title: text_or(obj, "shortTitle", PLACEHOLDER),
            channel_name: text_or(obj, "channelName", PLACEHOLDER),
            channel_address: text_or(obj, "channelAddress", PLACEHOLDER_HANDLE),
            creation_date: text_or(obj, "creationDate", PLACEHOLDER),
            video_count,
            total_views,
            first_upload_date: first_upload.unwrap_or_else(|| PLACEHOLDER.to_string()),
            latest_short_upload_date: latest_upload.unwrap_or_else(|| PLACEHOLDER.to_string()),
            contribution_analysis: text_or(obj, "contributionAnalysis", PLACEHOLDER),
            channel_theme: text_or(obj, "channelTheme", PLACEHOLDER),
            estimated_min_earnings,
            estimated_max_earnings,
            most_viewed_short_title: text_or(obj, "mostViewedShortTitle", PLACEHOLDER),
            most_viewed_short_thumbnail_description: text_or(
                obj,
                "mostViewedShortThumbnailDescription",
                PLACEHOLDER_THUMBNAIL_DESCRIPTION,
            ),
            most_viewed_short_thumbnail_url: text_field(obj, "mostViewedShortThumbnailUrl"),
            views_history,
        };

        for repair in &repairs {
            warn!(
                target: "normalize",
                id = %analysis.id,
                channel = %analysis.channel_name,
                ?repair,
                "repaired channel record"
            );
        }
        if !repairs.is_empty() {
            counter!("normalize_repairs_total").increment(repairs.len() as u64);
        }

        Normalized { analysis, repairs }
    }

    /// Normalize a provider batch, keeping ids unique within it.
    pub fn normalize_batch(&self, raws: &[Value]) -> Vec<ChannelAnalysis> {
        let mut seen: HashSet<String> = HashSet::with_capacity(raws.len());
        raws.iter()
            .map(|raw| {
                let mut analysis = self.normalize(raw).analysis;
                while !seen.insert(analysis.id.clone()) {
                    let fresh = self.ids.next_id();
                    warn!(
                        target: "normalize",
                        duplicate = %analysis.id,
                        id = %fresh,
                        "duplicate channel id in batch, regenerated"
                    );
                    counter!("normalize_repairs_total").increment(1);
                    analysis.id = fresh;
                }
                analysis
            })
            .collect()
    }
}

/// Coerce a numeric-looking JSON value to a non-negative integer.
///
/// Numbers and numeric strings are floored and clamped at zero; everything
/// else (null, bool, containers, garbage strings, NaN/inf) becomes 0.
pub fn coerce_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .unwrap_or_else(|| n.as_f64().map(float_to_count).unwrap_or(0)),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(float_to_count).unwrap_or(0),
        _ => 0,
    }
}

fn float_to_count(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.floor() as u64
    } else {
        0
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_or(obj: &Map<String, Value>, key: &str, fallback: &str) -> String {
    text_field(obj, key).unwrap_or_else(|| fallback.to_string())
}

// The placeholder counts as absent so a normalized record re-normalizes unchanged.
fn date_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    text_field(obj, key).filter(|d| d != PLACEHOLDER)
}

fn coerce_sample(sample: &Value) -> ViewsHistoryPoint {
    let date = sample
        .get("date")
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
        .map(str::to_owned);
    ViewsHistoryPoint::new(
        coerce_count(sample.get("videos")),
        coerce_count(sample.get("views")),
        date,
    )
}

fn repair_history(
    raw: Option<&Value>,
    video_count: u64,
    total_views: u64,
    first_upload: Option<&str>,
    latest_upload: Option<&str>,
    repairs: &mut Vec<Repair>,
) -> Vec<ViewsHistoryPoint> {
    let samples = match raw {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => {
            repairs.push(Repair::HistorySynthesized);
            // min() keeps the pair ascending for a zero-video channel
            let half_videos = (video_count / 2).max(1).min(video_count);
            return vec![
                ViewsHistoryPoint::new(half_videos, total_views / 2, first_upload.map(str::to_owned)),
                ViewsHistoryPoint::new(
                    video_count,
                    total_views,
                    latest_upload.or(first_upload).map(str::to_owned),
                ),
            ];
        }
    };

    let mut points: Vec<ViewsHistoryPoint> = samples.iter().map(coerce_sample).collect();
    let Some(last) = points.pop() else {
        return points;
    };

    points.retain(|p| {
        if p.videos > video_count {
            repairs.push(Repair::SampleDropped {
                videos: p.videos,
                views: p.views,
            });
            false
        } else {
            true
        }
    });

    if last.videos != video_count || last.views != total_views {
        repairs.push(Repair::LastSampleOverwritten {
            videos: last.videos,
            views: last.views,
        });
    }
    // latest upload, then the sample's own date, then the first upload
    let date = latest_upload
        .map(str::to_owned)
        .or(last.date)
        .or_else(|| first_upload.map(str::to_owned));
    points.push(ViewsHistoryPoint::new(video_count, total_views, date));

    if !points.windows(2).all(|w| w[0].videos <= w[1].videos) {
        // stable: ties keep provider order, and the forced point stays last
        points.sort_by_key(|p| p.videos);
        repairs.push(Repair::HistoryReordered);
    }

    points
}
