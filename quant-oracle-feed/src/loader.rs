//! One-shot snapshot loaders.
//!
//! Unlike the periodic dashboard feeds these are fetched once on activation.
//! A failed load is logged and yields an empty snapshot; the caller renders
//! an empty chart or table rather than an error.

use std::{future::Future, sync::Arc};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    error::{FeedError, FeedKind},
    source::FeedSource,
    types::{ChainSignal, DistributionRow, SubredditStats},
};

/// Load progress of a one-shot snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Pending,
    Ready(Arc<[T]>),
}

impl<T> LoadState<T> {
    /// Loaded items, empty while pending.
    pub fn items(&self) -> &[T] {
        match self {
            LoadState::Pending => &[],
            LoadState::Ready(items) => items,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }
}

/// One slice of the chain signal pie.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSlice {
    pub signal: ChainSignal,
    pub count: u64,
    /// Share of the total in [0, 1]
    pub fraction: f64,
}

impl DistributionSlice {
    pub fn label(&self) -> &'static str {
        self.signal.as_str()
    }

    /// Whole percentage as shown on the chart label.
    pub fn percent(&self) -> u32 {
        (self.fraction * 100.0).round() as u32
    }
}

/// Convert distribution rows into pie slices.
///
/// Rows whose labels fold into the same [`ChainSignal`] (`null` and `"N/A"`)
/// are merged into one slice at the position of the first such row.
pub fn to_slices(rows: Vec<DistributionRow>) -> Vec<DistributionSlice> {
    let merged = rows.into_iter().fold(Vec::<(ChainSignal, u64)>::new(), |mut merged, row| {
        match merged.iter_mut().find(|(signal, _)| *signal == row.chain_signal) {
            Some((_, count)) => *count += row.count,
            None => merged.push((row.chain_signal, row.count)),
        }
        merged
    });
    let total: u64 = merged.iter().map(|(_, count)| count).sum();

    merged
        .into_iter()
        .map(|(signal, count)| DistributionSlice {
            signal,
            count,
            fraction: if total > 0 {
                count as f64 / total as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// Fetch the chain signal distribution once; empty on failure.
pub async fn load_distribution<S>(source: &S) -> Vec<DistributionSlice>
where
    S: FeedSource + ?Sized,
{
    settle(
        FeedKind::Distribution,
        source.fetch_distribution().await.map(to_slices),
    )
}

/// Fetch the per-subreddit stats once; empty on failure.
pub async fn load_subreddit_stats<S>(source: &S) -> Vec<SubredditStats>
where
    S: FeedSource + ?Sized,
{
    settle(FeedKind::SubredditStats, source.fetch_subreddit_stats().await)
}

/// Spawn [`load_distribution`] and publish the result.
pub fn spawn_distribution_loader<S>(source: Arc<S>) -> watch::Receiver<LoadState<DistributionSlice>>
where
    S: FeedSource,
{
    spawn_snapshot(async move { load_distribution(source.as_ref()).await })
}

/// Spawn [`load_subreddit_stats`] and publish the result.
pub fn spawn_subreddit_stats_loader<S>(source: Arc<S>) -> watch::Receiver<LoadState<SubredditStats>>
where
    S: FeedSource,
{
    spawn_snapshot(async move { load_subreddit_stats(source.as_ref()).await })
}

fn settle<T>(feed: FeedKind, result: Result<Vec<T>, FeedError>) -> Vec<T> {
    match result {
        Ok(items) => {
            info!(%feed, count = items.len(), "snapshot loaded");
            items
        }
        Err(error) => {
            warn!(%feed, %error, "snapshot load failed, rendering empty");
            Vec::new()
        }
    }
}

fn spawn_snapshot<T, Fut>(load: Fut) -> watch::Receiver<LoadState<T>>
where
    T: Send + Sync + 'static,
    Fut: Future<Output = Vec<T>> + Send + 'static,
{
    let (tx, rx) = watch::channel(LoadState::Pending);
    tokio::spawn(async move {
        let items = load.await;
        let _ = tx.send(LoadState::Ready(Arc::from(items)));
    });
    rx
}
