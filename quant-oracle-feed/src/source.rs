//! Feed retrieval.
//!
//! [`FeedSource`] is the seam between the orchestrator/loaders and the remote
//! API; [`HttpFeedSource`] is the reqwest implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{
    config::DashboardConfig,
    error::FeedError,
    types::{
        DistributionResponse, DistributionRow, MetricsSnapshot, Post, PostsResponse,
        SubredditStats, SubredditStatsResponse, TimelineResponse, TimelineSample,
    },
};

/// Read-only access to the Quant Oracle feeds.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    async fn fetch_metrics(&self) -> Result<MetricsSnapshot, FeedError>;

    /// Most recent posts first, at most `limit`.
    async fn fetch_posts(&self, limit: usize) -> Result<Vec<Post>, FeedError>;

    /// Sentiment samples in no guaranteed order, at most `limit`.
    async fn fetch_timeline(&self, limit: usize) -> Result<Vec<TimelineSample>, FeedError>;

    async fn fetch_distribution(&self) -> Result<Vec<DistributionRow>, FeedError>;

    async fn fetch_subreddit_stats(&self) -> Result<Vec<SubredditStats>, FeedError>;
}

/// HTTP client for the Quant Oracle API
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
    base_url: Url,
}

impl HttpFeedSource {
    /// Create a client with the configured base URL and request timeout.
    pub fn new(config: &DashboardConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| FeedError::Transport {
                url: config.api_url.to_string(),
                message: error.to_string(),
            })?;

        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Create a source from an existing reqwest client.
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url: normalise_base(base_url),
        }
    }

    async fn get_json<T>(&self, path: &str, limit: Option<usize>) -> Result<T, FeedError>
    where
        T: DeserializeOwned,
    {
        let url = endpoint_url(&self.base_url, path, limit)?;
        debug!(%url, "requesting feed");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| FeedError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| FeedError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            })?;

        decode_payload(&url, &body)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_metrics(&self) -> Result<MetricsSnapshot, FeedError> {
        self.get_json("api/metrics", None).await
    }

    async fn fetch_posts(&self, limit: usize) -> Result<Vec<Post>, FeedError> {
        self.get_json::<PostsResponse>("api/posts", Some(limit))
            .await
            .map(|response| response.posts)
    }

    async fn fetch_timeline(&self, limit: usize) -> Result<Vec<TimelineSample>, FeedError> {
        self.get_json::<TimelineResponse>("api/sentiment-timeline", Some(limit))
            .await
            .map(|response| response.timeline)
    }

    async fn fetch_distribution(&self) -> Result<Vec<DistributionRow>, FeedError> {
        self.get_json::<DistributionResponse>("api/signal-distribution", None)
            .await
            .map(|response| response.distribution)
    }

    async fn fetch_subreddit_stats(&self) -> Result<Vec<SubredditStats>, FeedError> {
        self.get_json::<SubredditStatsResponse>("api/subreddit-stats", None)
            .await
            .map(|response| response.subreddit_stats)
    }
}

/// Ensure the base path ends with `/` so relative endpoint joins keep any prefix.
fn normalise_base(mut base_url: Url) -> Url {
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
}

/// Build the URL for an endpoint, appending `?limit=N` when requested.
pub fn endpoint_url(base_url: &Url, path: &str, limit: Option<usize>) -> Result<Url, FeedError> {
    let mut url = base_url.join(path)?;
    if let Some(limit) = limit {
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
    }
    Ok(url)
}

/// Decode a JSON response body, mapping failures to [`FeedError::Decode`].
pub fn decode_payload<T>(url: &Url, body: &[u8]) -> Result<T, FeedError>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|error| FeedError::Decode {
        url: url.to_string(),
        message: error.to_string(),
    })
}
