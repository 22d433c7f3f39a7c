// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analysis;
pub mod api;
pub mod chart;
pub mod config;
pub mod metrics;
pub mod normalize;
pub mod provider;
pub mod search;

// ---- Re-exports for stable public API ----
pub use crate::analysis::{ChannelAnalysis, ViewsHistoryPoint};
pub use crate::api::router;
pub use crate::chart::{format_compact, project, ChartLayout, PlottableSeries};
pub use crate::normalize::{Normalized, Normalizer, Repair};
pub use crate::provider::{ChannelProvider, DynProvider};
pub use crate::search::{SearchError, SearchOutcome, SearchSession};
