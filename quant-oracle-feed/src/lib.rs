//! Quant Oracle Feed - data layer of the Quant Oracle dashboard
//!
//! This library provides everything the terminal dashboard reads:
//! - Typed payloads of the Quant Oracle API
//! - An HTTP feed source over the metrics, posts and sentiment timeline feeds
//! - A refresh orchestrator that fetches the periodic feeds concurrently and
//!   publishes whole [`DashboardState`] snapshots
//! - One-shot loaders for the signal distribution and subreddit stats
//! - A reconnecting client for the live `/ws` ticker
pub mod config;
pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod source;
pub mod ticker;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use config::{ApplyPolicy, DashboardConfig};
pub use error::{FeedError, FeedKind};
pub use loader::{DistributionSlice, LoadState};
pub use orchestrator::{CycleOutcome, DashboardState, RefreshOrchestrator};
pub use source::{FeedSource, HttpFeedSource};
pub use ticker::{ConnectionStatus, LiveTicker, TickerConfig};
pub use types::{
    ChainSignal, DistributionRow, MetricsSnapshot, Post, SentimentTone, SubredditStats,
    TickerUpdate, TimelineSample,
};
