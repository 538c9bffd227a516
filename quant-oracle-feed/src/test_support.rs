//! In-memory feed source and fixtures shared by the unit tests.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::Mutex;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use url::Url;

use crate::{
    error::{FeedError, FeedKind},
    source::FeedSource,
    types::{
        ChainSignal, DistributionRow, MetricsSnapshot, Post, SubredditStats, TimelineSample,
    },
};

pub fn metrics(total_posts: u64) -> MetricsSnapshot {
    MetricsSnapshot {
        total_posts,
        avg_sentiment: 0.1234,
        bullish_count: total_posts / 3,
        bearish_count: total_posts / 5,
        bullish_percentage: 33.3,
        bearish_percentage: 20.0,
        whale_alerts: 2,
        low_gas_count: 1,
    }
}

pub fn post(id: &str, sentiment: f64) -> Post {
    Post {
        id: id.to_string(),
        subreddit: "ethereum".to_string(),
        title: format!("post {id}"),
        score: 42,
        sentiment,
        chain_signal: ChainSignal::Normal,
        timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
    }
}

pub fn sample(millis: i64, sentiment: f64) -> TimelineSample {
    TimelineSample {
        timestamp: DateTime::from_timestamp_millis(millis).unwrap(),
        sentiment,
    }
}

fn unavailable(feed: FeedKind) -> FeedError {
    FeedError::Status {
        url: format!("http://localhost:8000/api/{feed}"),
        status: 503,
    }
}

struct Script {
    metrics: Result<MetricsSnapshot, FeedError>,
    posts: Result<Vec<Post>, FeedError>,
    timeline: Result<Vec<TimelineSample>, FeedError>,
    distribution: Result<Vec<DistributionRow>, FeedError>,
    subreddit_stats: Result<Vec<SubredditStats>, FeedError>,
    metrics_delay: Duration,
    timeline_delay: Duration,
    metrics_calls: usize,
    posts_limits: Vec<usize>,
    timeline_limits: Vec<usize>,
}

/// [`FeedSource`] returning whatever was last scripted for each feed.
///
/// Responses and delays are read when a fetch starts, so a slow fetch keeps
/// the value that was scripted when it was issued.
pub struct ScriptedSource {
    script: Mutex<Script>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                metrics: Ok(metrics(10)),
                posts: Ok(vec![post("default", 0.0)]),
                timeline: Ok(vec![sample(1_000, 0.0)]),
                distribution: Ok(Vec::new()),
                subreddit_stats: Ok(Vec::new()),
                metrics_delay: Duration::ZERO,
                timeline_delay: Duration::ZERO,
                metrics_calls: 0,
                posts_limits: Vec::new(),
                timeline_limits: Vec::new(),
            }),
        }
    }

    pub fn set_metrics(&self, metrics: Result<MetricsSnapshot, FeedError>) {
        self.script.lock().metrics = metrics;
    }

    pub fn set_posts(&self, posts: Result<Vec<Post>, FeedError>) {
        self.script.lock().posts = posts;
    }

    pub fn set_timeline(&self, timeline: Result<Vec<TimelineSample>, FeedError>) {
        self.script.lock().timeline = timeline;
    }

    pub fn set_distribution(&self, distribution: Result<Vec<DistributionRow>, FeedError>) {
        self.script.lock().distribution = distribution;
    }

    pub fn set_subreddit_stats(&self, stats: Result<Vec<SubredditStats>, FeedError>) {
        self.script.lock().subreddit_stats = stats;
    }

    pub fn set_metrics_delay(&self, delay: Duration) {
        self.script.lock().metrics_delay = delay;
    }

    pub fn set_timeline_delay(&self, delay: Duration) {
        self.script.lock().timeline_delay = delay;
    }

    /// Make one feed answer with a 503.
    pub fn fail(&self, feed: FeedKind) {
        let error = unavailable(feed);
        let mut script = self.script.lock();
        match feed {
            FeedKind::Metrics => script.metrics = Err(error),
            FeedKind::Posts => script.posts = Err(error),
            FeedKind::Timeline => script.timeline = Err(error),
            FeedKind::Distribution => script.distribution = Err(error),
            FeedKind::SubredditStats => script.subreddit_stats = Err(error),
            FeedKind::Ticker => {}
        }
    }

    pub fn metrics_calls(&self) -> usize {
        self.script.lock().metrics_calls
    }

    pub fn posts_limits(&self) -> Vec<usize> {
        self.script.lock().posts_limits.clone()
    }

    pub fn timeline_limits(&self) -> Vec<usize> {
        self.script.lock().timeline_limits.clone()
    }
}

async fn after(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch_metrics(&self) -> Result<MetricsSnapshot, FeedError> {
        let (response, delay) = {
            let mut script = self.script.lock();
            script.metrics_calls += 1;
            (script.metrics.clone(), script.metrics_delay)
        };
        after(delay).await;
        response
    }

    async fn fetch_posts(&self, limit: usize) -> Result<Vec<Post>, FeedError> {
        let mut script = self.script.lock();
        script.posts_limits.push(limit);
        script.posts.clone()
    }

    async fn fetch_timeline(&self, limit: usize) -> Result<Vec<TimelineSample>, FeedError> {
        let (response, delay) = {
            let mut script = self.script.lock();
            script.timeline_limits.push(limit);
            (script.timeline.clone(), script.timeline_delay)
        };
        after(delay).await;
        response
    }

    async fn fetch_distribution(&self) -> Result<Vec<DistributionRow>, FeedError> {
        self.script.lock().distribution.clone()
    }

    async fn fetch_subreddit_stats(&self) -> Result<Vec<SubredditStats>, FeedError> {
        self.script.lock().subreddit_stats.clone()
    }
}

/// Serve HTTP/1.1 on a loopback port until the test runtime shuts down.
///
/// `respond` maps each request target (path and query) to a status and
/// body. `None` closes the connection without writing a response.
pub async fn serve_http<F>(respond: F) -> Url
where
    F: Fn(&str) -> Option<(u16, String)> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let respond = Arc::clone(&respond);
            tokio::spawn(async move {
                answer(stream, respond.as_ref()).await;
            });
        }
    });

    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn answer<F>(mut stream: TcpStream, respond: &F)
where
    F: Fn(&str) -> Option<(u16, String)>,
{
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(read) => request.extend_from_slice(&buf[..read]),
        }
    }

    // Request line: "GET /api/posts?limit=50 HTTP/1.1"
    let head = String::from_utf8_lossy(&request);
    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();

    let Some((status, body)) = respond(&target) else {
        return;
    };

    let response = format!(
        "HTTP/1.1 {status} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        if status == 200 { "OK" } else { "Error" },
        body.len(),
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
