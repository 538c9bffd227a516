//! Header ticker and sidebar navigation.

use quant_oracle_feed::{ConnectionStatus, MetricsSnapshot};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::theme::{signed_color, C_ACCENT, C_DIM, C_NEGATIVE, C_PANEL, C_POSITIVE, C_TEXT, C_WARN};
use crate::app::{TickerSnapshot, View};

/// `0.0000` when no metrics are available yet.
pub fn format_avg_sentiment(metrics: Option<&MetricsSnapshot>) -> String {
    format!("{:.4}", metrics.map_or(0.0, |metrics| metrics.avg_sentiment))
}

pub fn render_header(
    f: &mut Frame,
    area: Rect,
    metrics: Option<&MetricsSnapshot>,
    ticker: &TickerSnapshot,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_PANEL));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let avg = metrics.map_or(0.0, |metrics| metrics.avg_sentiment);
    let posts = metrics.map_or(0, |metrics| metrics.total_posts);
    let bullish = metrics
        .map(|metrics| format!("{:.1}%", metrics.bullish_percentage))
        .unwrap_or_else(|| "--".to_string());

    let mut spans = vec![
        Span::styled(
            " QUANT ORACLE ",
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ Avg Sentiment ", Style::default().fg(C_DIM)),
        Span::styled(
            format_avg_sentiment(metrics),
            Style::default()
                .fg(signed_color(avg))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Posts ", Style::default().fg(C_DIM)),
        Span::styled(posts.to_string(), Style::default().fg(C_TEXT)),
        Span::styled("  Bullish ", Style::default().fg(C_DIM)),
        Span::styled(bullish, Style::default().fg(C_POSITIVE)),
        Span::styled("  │ ", Style::default().fg(C_DIM)),
    ];
    spans.extend(ticker_spans(ticker));

    let hints = Line::from(Span::styled(
        " [r] refresh  [tab/1-4] view  [+/-] min sentiment  [f] signal  [q] quit",
        Style::default().fg(C_DIM),
    ));

    f.render_widget(Paragraph::new(vec![Line::from(spans), hints]), inner);
}

fn ticker_spans(ticker: &TickerSnapshot) -> Vec<Span<'static>> {
    let TickerSnapshot::Live { status, update } = ticker else {
        return vec![Span::styled("ticker off", Style::default().fg(C_DIM))];
    };

    match status {
        ConnectionStatus::Connected => {
            let mut spans = vec![Span::styled("● LIVE ", Style::default().fg(C_POSITIVE))];
            if let Some(update) = update {
                spans.push(Span::styled(
                    format!("{:.4}", update.avg_sentiment),
                    Style::default().fg(signed_color(update.avg_sentiment)),
                ));
                if let Some(post) = &update.latest_post {
                    spans.push(Span::styled(
                        format!("  r/{}: {}", post.subreddit, post.title),
                        Style::default().fg(C_TEXT),
                    ));
                }
            }
            spans
        }
        ConnectionStatus::Reconnecting => {
            vec![Span::styled("◌ reconnecting", Style::default().fg(C_WARN))]
        }
        ConnectionStatus::Disconnected => {
            vec![Span::styled("○ offline", Style::default().fg(C_NEGATIVE))]
        }
    }
}

pub fn render_sidebar(f: &mut Frame, area: Rect, selected: View) {
    let items = View::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| {
            let (marker, style) = if *view == selected {
                (
                    "▶",
                    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                )
            } else {
                (" ", Style::default().fg(C_TEXT))
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker} {} ", index + 1), Style::default().fg(C_DIM)),
                Span::styled(view.title(), style),
            ]))
        })
        .collect::<Vec<_>>();

    let list = List::new(items).block(
        Block::default()
            .title(" VIEWS ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL)),
    );
    f.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_avg_sentiment() {
        assert_eq!(format_avg_sentiment(None), "0.0000");

        let metrics = MetricsSnapshot {
            total_posts: 10,
            avg_sentiment: -0.123456,
            bullish_count: 1,
            bearish_count: 2,
            bullish_percentage: 10.0,
            bearish_percentage: 20.0,
            whale_alerts: 0,
            low_gas_count: 0,
        };
        assert_eq!(format_avg_sentiment(Some(&metrics)), "-0.1235");
    }
}
