use derive_more::Display;
use thiserror::Error;

/// Identifies which feed a request or log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FeedKind {
    #[display("metrics")]
    Metrics,
    #[display("posts")]
    Posts,
    #[display("sentiment-timeline")]
    Timeline,
    #[display("signal-distribution")]
    Distribution,
    #[display("subreddit-stats")]
    SubredditStats,
    #[display("ticker")]
    Ticker,
}

/// All errors generated while retrieving a feed.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FeedError {
    #[error("invalid feed url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("transport failure requesting {url}: {message}")]
    Transport { url: String, message: String },

    #[error("{url} responded with non-success status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed payload from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FeedError {
    /// Determine if the error is likely to clear up on its own by the next cycle.
    ///
    /// Transport failures and 5xx statuses are transient; a malformed payload or
    /// a 4xx will keep failing until something upstream changes.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Transport { .. } => true,
            FeedError::Status { status, .. } => *status >= 500 || *status == 429,
            FeedError::InvalidUrl(_) | FeedError::Decode { .. } => false,
        }
    }
}
