// src/chart.rs
//! Chart projection for the views trend line.
//!
//! Maps `(cumulative videos, cumulative views)` samples into plot-space
//! coordinates (origin top-left, growth drawn upward) plus axis ticks. Pure
//! geometry; drawing is left to the UI.

use serde::Serialize;

use crate::analysis::ViewsHistoryPoint;

/// Canvas margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    /// Number of intervals on the vertical axis (`y_ticks + 1` labels).
    pub y_ticks: usize,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 220.0,
            margin: Margin {
                top: 20.0,
                right: 20.0,
                bottom: 50.0,
                left: 50.0,
            },
            y_ticks: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub videos: u64,
    pub views: u64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisTick {
    /// Pixel offset along the axis (x for horizontal ticks, y for vertical).
    pub position: f64,
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlottableSeries {
    pub plot_width: f64,
    pub plot_height: f64,
    pub points: Vec<PlotPoint>,
    pub x_ticks: Vec<AxisTick>,
    pub y_ticks: Vec<AxisTick>,
}

impl PlottableSeries {
    /// Line path in SVG `d` syntax, relative to the plot origin.
    pub fn path(&self) -> String {
        let coords: Vec<String> = self
            .points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect();
        format!("M {}", coords.join(" L "))
    }
}

impl ChartLayout {
    pub fn plot_width(&self) -> f64 {
        (self.width - self.margin.left - self.margin.right).max(0.0)
    }

    pub fn plot_height(&self) -> f64 {
        (self.height - self.margin.top - self.margin.bottom).max(0.0)
    }

    /// Project samples into plot space. Fewer than two samples yield `None`.
    pub fn project(&self, samples: &[ViewsHistoryPoint]) -> Option<PlottableSeries> {
        if samples.len() < 2 {
            return None;
        }

        let w = self.plot_width();
        let h = self.plot_height();
        // a zero maximum would divide by zero; scale against 1 instead
        let max_videos = samples.iter().map(|s| s.videos).max().unwrap_or(0).max(1) as f64;
        let max_views = samples.iter().map(|s| s.views).max().unwrap_or(0).max(1) as f64;

        let x_of = |videos: f64| videos / max_videos * w;
        let y_of = |views: f64| h - views / max_views * h;

        let points = samples
            .iter()
            .map(|s| PlotPoint {
                x: x_of(s.videos as f64),
                y: y_of(s.views as f64),
                videos: s.videos,
                views: s.views,
                tooltip: tooltip(s),
            })
            .collect();

        let n = self.y_ticks.max(1);
        let y_ticks = (0..=n)
            .map(|i| {
                let value = max_views / n as f64 * i as f64;
                AxisTick {
                    position: y_of(value),
                    value,
                    label: format_compact(value),
                }
            })
            .collect();

        let len = samples.len();
        let x_ticks = samples
            .iter()
            .enumerate()
            .filter(|(i, _)| *i == 0 || *i == len - 1 || (len > 3 && *i == len / 2))
            .map(|(_, s)| AxisTick {
                position: x_of(s.videos as f64),
                value: s.videos as f64,
                label: format!("{} videos", s.videos),
            })
            .collect();

        Some(PlottableSeries {
            plot_width: w,
            plot_height: h,
            points,
            x_ticks,
            y_ticks,
        })
    }
}

/// Project with the default layout.
pub fn project(samples: &[ViewsHistoryPoint]) -> Option<PlottableSeries> {
    ChartLayout::default().project(samples)
}

/// `2.5M`, `750.0K`, `500`.
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value.round() as i64)
    }
}

/// Integer with comma thousands separators: `2,500,000`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn tooltip(s: &ViewsHistoryPoint) -> String {
    let base = format!("{} videos, {} views", s.videos, format_thousands(s.views));
    match &s.date {
        Some(d) => format!("{base} ({d})"),
        None => base,
    }
}
