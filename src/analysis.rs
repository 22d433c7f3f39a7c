// src/analysis.rs
//! Channel analysis record as handed to the UI.
//!
//! Field names serialize in camelCase so a normalized record can be fed back
//! through the normalizer unchanged.

use serde::{Deserialize, Serialize};

/// Placeholder for descriptive strings the provider left out.
pub const PLACEHOLDER: &str = "N/A";
/// Placeholder channel handle.
pub const PLACEHOLDER_HANDLE: &str = "@unknown";
/// Placeholder for a missing thumbnail description.
pub const PLACEHOLDER_THUMBNAIL_DESCRIPTION: &str = "No description";

/// Multipliers applied to `totalViews` for the earnings bounds.
pub const MIN_EARNINGS_PER_VIEW: f64 = 0.1;
pub const MAX_EARNINGS_PER_VIEW: f64 = 0.5;

/// One `(cumulative videos, cumulative views)` sample of a channel's growth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewsHistoryPoint {
    pub videos: u64,
    pub views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ViewsHistoryPoint {
    pub fn new(videos: u64, views: u64, date: Option<String>) -> Self {
        Self {
            videos,
            views,
            date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAnalysis {
    pub id: String,
    pub short_title: String,
    pub channel_name: String,
    pub channel_address: String,
    pub creation_date: String,
    pub video_count: u64,
    pub total_views: u64,
    pub first_upload_date: String,
    pub latest_short_upload_date: String,
    pub contribution_analysis: String,
    pub channel_theme: String,

    // derived from total_views, never taken from the provider
    pub estimated_min_earnings: f64,
    pub estimated_max_earnings: f64,

    pub most_viewed_short_title: String,
    pub most_viewed_short_thumbnail_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_viewed_short_thumbnail_url: Option<String>,

    pub views_history: Vec<ViewsHistoryPoint>,
}

/// Lower and upper earnings estimate for a view count.
pub fn earnings_bounds(total_views: u64) -> (f64, f64) {
    let views = total_views as f64;
    (views * MIN_EARNINGS_PER_VIEW, views * MAX_EARNINGS_PER_VIEW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earnings_are_fixed_multiples() {
        let (lo, hi) = earnings_bounds(2_500_000);
        assert!((lo - 250_000.0).abs() < 1e-6);
        assert!((hi - 1_250_000.0).abs() < 1e-6);
        assert!(lo <= hi);
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_thumbnail() {
        let point = ViewsHistoryPoint::new(3, 40, None);
        let v = serde_json::to_value(&point).unwrap();
        assert!(v.get("date").is_none());

        let a = ChannelAnalysis {
            id: "c1".into(),
            short_title: "t".into(),
            channel_name: "n".into(),
            channel_address: "@h".into(),
            creation_date: "2022-01-01".into(),
            video_count: 3,
            total_views: 40,
            first_upload_date: "2022-01-02".into(),
            latest_short_upload_date: "2022-03-01".into(),
            contribution_analysis: "x".into(),
            channel_theme: "y".into(),
            estimated_min_earnings: 4.0,
            estimated_max_earnings: 20.0,
            most_viewed_short_title: "m".into(),
            most_viewed_short_thumbnail_description: "d".into(),
            most_viewed_short_thumbnail_url: None,
            views_history: vec![point],
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["videoCount"], 3);
        assert_eq!(v["latestShortUploadDate"], "2022-03-01");
        assert!(v.get("mostViewedShortThumbnailUrl").is_none());
    }
}
