//! Dashboard configuration.
//!
//! Every field can be overridden through an environment variable, falling back
//! to the defaults below when the variable is unset or unparseable.

use std::{path::PathBuf, str::FromStr, time::Duration};

use tracing::warn;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_POSTS_LIMIT: usize = 50;
pub const DEFAULT_TIMELINE_LIMIT: usize = 100;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_TICKER_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_LOG_FILE: &str = "quant-oracle.log";

/// How a completed refresh cycle is reconciled with cycles that overlap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyPolicy {
    /// Apply a cycle only if it was dispatched after the last applied one.
    #[default]
    Sequenced,
    /// Whichever cycle completes last overwrites the whole state.
    LastWriterWins,
}

impl FromStr for ApplyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequenced" => Ok(ApplyPolicy::Sequenced),
            "last-writer-wins" | "last_writer_wins" | "lww" => Ok(ApplyPolicy::LastWriterWins),
            other => Err(format!("unknown apply policy: {other}")),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the Quant Oracle API
    pub api_url: Url,
    /// Live ticker socket, `None` disables the ticker
    pub ws_url: Option<Url>,
    /// Period between scheduled refresh cycles
    pub refresh_interval: Duration,
    /// `limit` sent to `/api/posts`
    pub posts_limit: usize,
    /// `limit` sent to `/api/sentiment-timeline`
    pub timeline_limit: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Delay before the ticker reconnects
    pub ticker_reconnect_delay: Duration,
    pub apply_policy: ApplyPolicy,
    pub log_file: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let api_url = Url::parse(DEFAULT_API_URL).expect("default api url is valid");
        Self {
            ws_url: derive_ws_url(&api_url),
            api_url,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            posts_limit: DEFAULT_POSTS_LIMIT,
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ticker_reconnect_delay: DEFAULT_TICKER_RECONNECT_DELAY,
            apply_policy: ApplyPolicy::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration against a custom API base URL.
    ///
    /// The ticker socket URL is derived from it.
    pub fn new(api_url: Url) -> Self {
        Self {
            ws_url: derive_ws_url(&api_url),
            api_url,
            ..Default::default()
        }
    }

    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = parse_or(&lookup, "ORACLE_API_URL", defaults.api_url);
        let ws_url = match lookup("ORACLE_WS_URL") {
            Some(raw) => match Url::parse(raw.trim()) {
                Ok(url) => Some(url),
                Err(error) => {
                    warn!(key = "ORACLE_WS_URL", value = %raw, %error, "invalid url, deriving from api url");
                    derive_ws_url(&api_url)
                }
            },
            None => derive_ws_url(&api_url),
        };
        let ws_url = parse_or(&lookup, "ORACLE_LIVE_TICKER", true)
            .then_some(ws_url)
            .flatten();

        let refresh_ms = parse_or(
            &lookup,
            "REFRESH_INTERVAL_MS",
            DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
        );
        let timeout_ms = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
        );

        Self {
            api_url,
            ws_url,
            posts_limit: parse_or(&lookup, "POSTS_LIMIT", defaults.posts_limit),
            timeline_limit: parse_or(&lookup, "TIMELINE_LIMIT", defaults.timeline_limit),
            apply_policy: parse_or(&lookup, "ORACLE_APPLY_POLICY", defaults.apply_policy),
            log_file: lookup("ORACLE_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            ..defaults
        }
        .with_refresh_interval(Duration::from_millis(refresh_ms))
        .with_request_timeout(Duration::from_millis(timeout_ms))
    }

    /// Set the refresh period. A zero period is ignored.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!("refresh interval must be non-zero, keeping {:?}", self.refresh_interval);
        } else {
            self.refresh_interval = interval;
        }
        self
    }

    /// Set the per-request timeout. A zero timeout is ignored.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            warn!("request timeout must be non-zero, keeping {:?}", self.request_timeout);
        } else {
            self.request_timeout = timeout;
        }
        self
    }

    /// Set the posts and timeline request caps
    pub fn with_limits(mut self, posts_limit: usize, timeline_limit: usize) -> Self {
        self.posts_limit = posts_limit;
        self.timeline_limit = timeline_limit;
        self
    }

    /// Set how overlapping refresh cycles are reconciled
    pub fn with_apply_policy(mut self, policy: ApplyPolicy) -> Self {
        self.apply_policy = policy;
        self
    }

    /// Set or disable the live ticker socket
    pub fn with_ws_url(mut self, ws_url: Option<Url>) -> Self {
        self.ws_url = ws_url;
        self
    }
}

/// Derive the ticker socket URL (`ws[s]://host:port/ws`) from the API base URL.
pub fn derive_ws_url(api_url: &Url) -> Option<Url> {
    let scheme = match api_url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let mut ws_url = api_url.join("/ws").ok()?;
    ws_url.set_scheme(scheme).ok()?;
    Some(ws_url)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparseable config value, using default");
            default
        }),
    }
}
