//! Chain signal distribution and subreddit trending panels.

use itertools::Itertools;
use quant_oracle_feed::{DistributionSlice, LoadState, MetricsSnapshot, SubredditStats};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use super::theme::{signal_color, signed_color, C_DIM, C_PANEL, C_TEXT, C_WARN};

/// Proportional bar for a fraction in [0, 1].
pub fn slice_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_PANEL))
        .title_style(Style::default().fg(C_TEXT))
}

fn placeholder(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(C_DIM)))
}

pub fn render_distribution(
    f: &mut Frame,
    area: Rect,
    distribution: &LoadState<DistributionSlice>,
    metrics: Option<&MetricsSnapshot>,
) {
    let block = panel(" SIGNAL DISTRIBUTION ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let bar_width = (inner.width as usize).saturating_sub(20).max(10);

    let mut lines = match distribution {
        LoadState::Pending => vec![placeholder("Loading signal distribution...")],
        LoadState::Ready(slices) if slices.is_empty() => vec![placeholder("No signal data")],
        LoadState::Ready(slices) => slices
            .iter()
            .map(|slice| {
                let color = signal_color(slice.signal);
                Line::from(vec![
                    Span::styled(
                        format!("{:<12}{:>3}% ", slice.label(), slice.percent()),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(slice_bar(slice.fraction, bar_width), Style::default().fg(color)),
                ])
            })
            .collect(),
    };

    if let Some(metrics) = metrics {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Whale alerts ", Style::default().fg(C_DIM)),
            Span::styled(metrics.whale_alerts.to_string(), Style::default().fg(C_WARN)),
            Span::styled("   Low gas ", Style::default().fg(C_DIM)),
            Span::styled(metrics.low_gas_count.to_string(), Style::default().fg(C_TEXT)),
        ]));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

pub fn render_trending(f: &mut Frame, area: Rect, subreddits: &LoadState<SubredditStats>) {
    let block = panel(" TRENDING SUBREDDITS ");

    let stats = match subreddits {
        LoadState::Pending => {
            f.render_widget(Paragraph::new(placeholder("Loading subreddit stats...")).block(block), area);
            return;
        }
        LoadState::Ready(stats) if stats.is_empty() => {
            f.render_widget(Paragraph::new(placeholder("No subreddit data")).block(block), area);
            return;
        }
        LoadState::Ready(stats) => stats,
    };

    let header = Row::new(["Subreddit", "Posts", "Avg", "Max", "Min"])
        .style(Style::default().fg(C_DIM).add_modifier(Modifier::BOLD));

    let rows = stats
        .iter()
        .sorted_by(|a, b| b.post_count.cmp(&a.post_count))
        .map(|stat| {
            Row::new(vec![
                Span::styled(format!("r/{}", stat.subreddit), Style::default().fg(C_TEXT)),
                Span::styled(stat.post_count.to_string(), Style::default().fg(C_TEXT)),
                Span::styled(
                    format!("{:.3}", stat.avg_sentiment),
                    Style::default().fg(signed_color(stat.avg_sentiment)),
                ),
                Span::styled(format!("{:.3}", stat.max_sentiment), Style::default().fg(C_DIM)),
                Span::styled(format!("{:.3}", stat.min_sentiment), Style::default().fg(C_DIM)),
            ])
        })
        .collect::<Vec<_>>();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}
