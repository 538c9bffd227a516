//! WebSocket client for the live `/ws` ticker
//!
//! Provides automatic reconnection and heartbeat. Updates never touch the
//! dashboard state; they are published on their own watch channel.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{config::DashboardConfig, error::FeedKind, types::TickerUpdate};

/// Ticker client configuration
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// WebSocket server URL
    pub url: Url,
    /// Ping interval to keep connection alive
    pub ping_interval: Duration,
    /// Reconnection delay after disconnect
    pub reconnect_delay: Duration,
}

impl TickerConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
        }
    }

    /// Ticker configuration from the dashboard configuration, `None` when disabled
    pub fn from_dashboard(config: &DashboardConfig) -> Option<Self> {
        config
            .ws_url
            .clone()
            .map(|url| Self::new(url).with_reconnect_delay(config.ticker_reconnect_delay))
    }

    /// Set ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Connection status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// Messages pushed by the ticker socket
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TickerMessage {
    #[serde(rename = "metrics_update")]
    MetricsUpdate { data: TickerUpdate },
    #[serde(other)]
    Other,
}

/// Parse one text frame; `None` for other message types or unparseable text.
pub fn parse_ticker_message(text: &str) -> Option<TickerUpdate> {
    match serde_json::from_str::<TickerMessage>(text) {
        Ok(TickerMessage::MetricsUpdate { data }) => Some(data),
        Ok(TickerMessage::Other) => None,
        Err(error) => {
            let head: String = text.chars().take(100).collect();
            debug!(feed = %FeedKind::Ticker, %error, frame = %head, "unparseable ticker frame");
            None
        }
    }
}

/// Handles to a running ticker client
pub struct LiveTicker {
    pub updates: watch::Receiver<Option<TickerUpdate>>,
    pub status: watch::Receiver<ConnectionStatus>,
    task: JoinHandle<()>,
}

impl LiveTicker {
    /// Start the ticker connection loop
    pub fn spawn(config: TickerConfig) -> Self {
        let (update_tx, updates) = watch::channel(None);
        let (status_tx, status) = watch::channel(ConnectionStatus::Disconnected);

        let task = tokio::spawn(async move {
            run_ticker_loop(config, update_tx, status_tx).await;
        });

        Self {
            updates,
            status,
            task,
        }
    }
}

impl Drop for LiveTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Keep a ticker connection open, reconnecting after `reconnect_delay` whenever it drops.
///
/// Returns once nobody holds the update receiver any more.
async fn run_ticker_loop(
    config: TickerConfig,
    update_tx: watch::Sender<Option<TickerUpdate>>,
    status_tx: watch::Sender<ConnectionStatus>,
) {
    let feed = FeedKind::Ticker;
    info!(%feed, url = %config.url, "starting live ticker");

    loop {
        let _ = status_tx.send(ConnectionStatus::Reconnecting);

        match connect_async(config.url.as_str()).await {
            Ok((ws_stream, _)) => {
                info!(%feed, url = %config.url, "live ticker connected");
                let _ = status_tx.send(ConnectionStatus::Connected);

                let (mut sink, mut frames) = ws_stream.split();

                // Keepalive pings run beside the frame reader until told to stop
                let ping_interval = config.ping_interval;
                let (keepalive_stop_tx, mut keepalive_stop_rx) = mpsc::channel::<()>(1);

                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(ping_interval);
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                                    debug!(%feed, "keepalive ping failed");
                                    break;
                                }
                            }
                            _ = keepalive_stop_rx.recv() => break,
                        }
                    }
                });

                let mut received = 0u64;
                while let Some(frame) = frames.next().await {
                    match frame {
                        Ok(Message::Text(text)) => {
                            let Some(update) = parse_ticker_message(&text) else {
                                continue;
                            };
                            received += 1;
                            if update_tx.send(Some(update)).is_err() {
                                info!(%feed, "no ticker subscribers left, stopping");
                                let _ = keepalive_stop_tx.send(()).await;
                                return;
                            }
                        }
                        Ok(Message::Close(frame)) => {
                            info!(%feed, ?frame, "ticker socket closed by server");
                            break;
                        }
                        Err(error) => {
                            error!(%feed, %error, "ticker socket error");
                            break;
                        }
                        // Pongs are answered by tungstenite; binary frames are not part of the feed
                        Ok(_) => {}
                    }
                }

                let _ = keepalive_stop_tx.send(()).await;
                let _ = status_tx.send(ConnectionStatus::Disconnected);
                warn!(%feed, received, "live ticker disconnected");
            }
            Err(error) => {
                error!(%feed, url = %config.url, %error, "live ticker connect failed");
                let _ = status_tx.send(ConnectionStatus::Disconnected);
            }
        }

        debug!(%feed, delay = ?config.reconnect_delay, "ticker reconnect scheduled");
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TickerConfig::new(Url::parse("ws://localhost:8000/ws").unwrap())
            .with_ping_interval(Duration::from_secs(15))
            .with_reconnect_delay(Duration::from_secs(1));

        assert_eq!(config.url.as_str(), "ws://localhost:8000/ws");
        assert_eq!(config.ping_interval, Duration::from_secs(15));
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_config_from_dashboard() {
        let dashboard = DashboardConfig::default();
        let config = TickerConfig::from_dashboard(&dashboard).unwrap();
        assert_eq!(config.url.as_str(), "ws://localhost:8000/ws");
        assert_eq!(config.reconnect_delay, dashboard.ticker_reconnect_delay);

        assert!(TickerConfig::from_dashboard(&dashboard.with_ws_url(None)).is_none());
    }

    #[test]
    fn test_parse_metrics_update() {
        let text = r#"{
            "type": "metrics_update",
            "data": {
                "avg_sentiment": 0.0815,
                "latest_post": {
                    "id": "t3_xyz",
                    "subreddit": "bitcoin",
                    "title": "Bitcoin dips below 30k, hodl strong",
                    "score": 120,
                    "sentiment": -0.2,
                    "chain_signal": "WHALE_ALERT",
                    "timestamp": "2024-03-01 09:15:00"
                },
                "timestamp": "2024-03-01T09:15:04.123456"
            }
        }"#;

        let update = parse_ticker_message(text).unwrap();
        assert_eq!(update.avg_sentiment, 0.0815);
        assert_eq!(
            update.latest_post.map(|post| post.subreddit),
            Some("bitcoin".to_string())
        );
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert!(parse_ticker_message(r#"{"type": "welcome"}"#).is_none());
        assert!(parse_ticker_message("not json").is_none());
        assert!(parse_ticker_message(r#"{"type": "metrics_update", "data": {}}"#).is_none());
    }

    #[test]
    fn test_parse_update_without_latest_post() {
        let text = r#"{"type": "metrics_update", "data": {"avg_sentiment": 0, "latest_post": null, "timestamp": "2024-03-01T09:15:04"}}"#;
        let update = parse_ticker_message(text).unwrap();
        assert!(update.latest_post.is_none());
    }
}
