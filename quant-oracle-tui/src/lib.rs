//! Quant Oracle TUI - terminal dashboard over the Quant Oracle feeds
//!
//! The library holds everything the `quant-oracle` binary draws:
//! - Application state: selected view, post filters, key handling
//! - The sentiment chart and the manager that owns its surface lifecycle
//! - Ratatui panels for the header, metric cards, post feed, signal
//!   distribution and trending subreddits
pub mod app;
pub mod chart;
pub mod ui;

pub use app::{Action, App, FeedHandles, PostFilter, TickerHandles, View};
pub use chart::{ChartSurfaceManager, LineChartFactory};
