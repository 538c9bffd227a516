//! Metric cards.

use quant_oracle_feed::MetricsSnapshot;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{C_ACCENT, C_DIM, C_NEGATIVE, C_PANEL, C_POSITIVE, C_TEXT, C_WARN};

/// Whale alert count above which the card flags high activity.
pub const HIGH_WHALE_ACTIVITY: u64 = 3;

struct Card {
    label: &'static str,
    value: String,
    detail: Option<String>,
    color: Color,
}

fn cards(metrics: Option<&MetricsSnapshot>) -> [Card; 4] {
    let value = |pick: fn(&MetricsSnapshot) -> u64| {
        metrics
            .map(|metrics| pick(metrics).to_string())
            .unwrap_or_else(|| "--".to_string())
    };
    let percent = |pick: fn(&MetricsSnapshot) -> f64| metrics.map(|metrics| format!("{:.1}%", pick(metrics)));

    [
        Card {
            label: "Total Posts",
            value: value(|m| m.total_posts),
            detail: None,
            color: C_ACCENT,
        },
        Card {
            label: "Bullish Signals",
            value: value(|m| m.bullish_count),
            detail: percent(|m| m.bullish_percentage),
            color: C_POSITIVE,
        },
        Card {
            label: "Bearish Signals",
            value: value(|m| m.bearish_count),
            detail: percent(|m| m.bearish_percentage),
            color: C_NEGATIVE,
        },
        Card {
            label: "Whale Alerts",
            value: value(|m| m.whale_alerts),
            detail: metrics
                .filter(|metrics| metrics.whale_alerts > HIGH_WHALE_ACTIVITY)
                .map(|_| "High Activity".to_string()),
            color: C_WARN,
        },
    ]
}

pub fn render_cards(f: &mut Frame, area: Rect, metrics: Option<&MetricsSnapshot>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (card, chunk) in cards(metrics).into_iter().zip(chunks.iter()) {
        let block = Block::default()
            .title(format!(" {} ", card.label))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL))
            .title_style(Style::default().fg(C_DIM));

        let mut lines = vec![Line::from(Span::styled(
            card.value,
            Style::default().fg(C_TEXT).add_modifier(Modifier::BOLD),
        ))];
        if let Some(detail) = card.detail {
            lines.push(Line::from(Span::styled(detail, Style::default().fg(card.color))));
        }

        f.render_widget(Paragraph::new(lines).block(block), *chunk);
    }
}
