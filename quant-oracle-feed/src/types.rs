//! Core data types for the Quant Oracle feeds.
//!
//! These types match the JSON payloads served by the Quant Oracle API
//! (`/api/metrics`, `/api/posts`, `/api/sentiment-timeline`, ...).

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Aggregate counters computed upstream over every stored post.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsSnapshot {
    pub total_posts: u64,
    /// Mean sentiment score (signed)
    pub avg_sentiment: f64,
    pub bullish_count: u64,
    pub bearish_count: u64,
    pub bullish_percentage: f64,
    pub bearish_percentage: f64,
    pub whale_alerts: u64,
    #[serde(default)]
    pub low_gas_count: u64,
}

/// Categorical tag classifying a post's on-chain relevance.
///
/// Any label outside the known set (including `"N/A"` and `null`) maps to
/// [`ChainSignal::Unknown`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Deserialize, Serialize,
)]
#[serde(from = "Option<String>", into = "String")]
pub enum ChainSignal {
    #[display("LOW_GAS")]
    LowGas,
    #[display("NORMAL")]
    Normal,
    #[display("WHALE_ALERT")]
    WhaleAlert,
    #[default]
    #[display("N/A")]
    Unknown,
}

impl ChainSignal {
    /// Every signal, in display order.
    pub const ALL: [ChainSignal; 4] = [
        ChainSignal::LowGas,
        ChainSignal::Normal,
        ChainSignal::WhaleAlert,
        ChainSignal::Unknown,
    ];

    /// Wire label (e.g. "WHALE_ALERT")
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainSignal::LowGas => "LOW_GAS",
            ChainSignal::Normal => "NORMAL",
            ChainSignal::WhaleAlert => "WHALE_ALERT",
            ChainSignal::Unknown => "N/A",
        }
    }

    /// Short human label used on feed badges
    pub fn badge(&self) -> &'static str {
        match self {
            ChainSignal::LowGas => "Low Gas",
            ChainSignal::Normal => "Normal",
            ChainSignal::WhaleAlert => "Whale",
            ChainSignal::Unknown => "N/A",
        }
    }
}

impl From<Option<String>> for ChainSignal {
    fn from(label: Option<String>) -> Self {
        match label.as_deref().map(str::trim) {
            Some("LOW_GAS") => ChainSignal::LowGas,
            Some("NORMAL") => ChainSignal::Normal,
            Some("WHALE_ALERT") => ChainSignal::WhaleAlert,
            _ => ChainSignal::Unknown,
        }
    }
}

impl From<ChainSignal> for String {
    fn from(signal: ChainSignal) -> Self {
        signal.as_str().to_string()
    }
}

/// One observed post.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Post {
    pub id: String,
    /// Nullable upstream columns below decode as empty / zero
    #[serde(default, deserialize_with = "de_null_default")]
    pub subreddit: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub score: i64,
    /// Sentiment score, roughly within [-1, 1] but not clamped upstream
    #[serde(default, deserialize_with = "de_null_default")]
    pub sentiment: f64,
    #[serde(default)]
    pub chain_signal: ChainSignal,
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Sentiment tone of a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentTone {
    Positive,
    Neutral,
    Negative,
}

impl SentimentTone {
    /// Scores above 0.5 are positive, below -0.5 negative.
    pub fn of(sentiment: f64) -> Self {
        if sentiment > 0.5 {
            SentimentTone::Positive
        } else if sentiment < -0.5 {
            SentimentTone::Negative
        } else {
            SentimentTone::Neutral
        }
    }
}

/// A (timestamp, sentiment) sample from the sentiment timeline feed.
///
/// The feed returns these in no particular order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimelineSample {
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub sentiment: f64,
}

/// One row of the chain signal distribution feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DistributionRow {
    #[serde(default)]
    pub chain_signal: ChainSignal,
    pub count: u64,
}

/// Per-subreddit aggregate from `/api/subreddit-stats`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubredditStats {
    pub subreddit: String,
    pub post_count: u64,
    pub avg_sentiment: f64,
    pub max_sentiment: f64,
    pub min_sentiment: f64,
}

/// Live update pushed by the `/ws` ticker socket.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TickerUpdate {
    pub avg_sentiment: f64,
    #[serde(default)]
    pub latest_post: Option<Post>,
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/posts` envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

/// `GET /api/sentiment-timeline` envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimelineResponse {
    pub timeline: Vec<TimelineSample>,
}

/// `GET /api/signal-distribution` envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistributionResponse {
    pub distribution: Vec<DistributionRow>,
}

/// `GET /api/subreddit-stats` envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubredditStatsResponse {
    pub subreddit_stats: Vec<SubredditStats>,
}

/// Parse a timestamp as sent by the API.
///
/// Accepts RFC 3339, or naive ISO-8601 with a `T` or space separator and
/// optional fractional seconds. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Deserialize a timestamp given as text (see [`parse_timestamp`]) or epoch milliseconds.
pub fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(millis) => DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}"))),
        RawTimestamp::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| D::Error::custom(format!("unrecognised timestamp: {text}"))),
    }
}

/// Deserialize `null` as the type's default.
pub fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
