//! Live post feed.

use chrono::Local;
use quant_oracle_feed::{Post, SentimentTone};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use super::theme::{signal_color, tone_color, C_BG, C_DIM, C_PANEL, C_TEXT};
use crate::app::{showing_caption, PostFilter};

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn post_item(post: &Post) -> ListItem<'_> {
    let tone = SentimentTone::of(post.sentiment);
    let badge = post.chain_signal;

    let header = Line::from(vec![
        Span::styled(format!("r/{}", or_placeholder(&post.subreddit, "unknown")), Style::default().fg(C_DIM)),
        Span::raw(" "),
        Span::styled(
            format!(" {} ", badge.badge()),
            Style::default().fg(C_BG).bg(signal_color(badge)),
        ),
        Span::raw(" "),
        Span::styled(or_placeholder(&post.title, "(untitled)"), Style::default().fg(C_TEXT).add_modifier(Modifier::BOLD)),
    ]);

    let footer = Line::from(vec![
        Span::styled(format!("  ↑ {}", post.score), Style::default().fg(C_DIM)),
        Span::styled(
            format!("  Sentiment: {:.3}", post.sentiment),
            Style::default().fg(tone_color(tone)),
        ),
        Span::styled(
            format!("  {}", post.timestamp.with_timezone(&Local).format("%H:%M:%S")),
            Style::default().fg(C_DIM),
        ),
    ]);

    ListItem::new(vec![header, footer])
}

pub fn render_posts(f: &mut Frame, area: Rect, posts: &[Post], filter: &PostFilter) {
    let shown = filter.apply(posts);

    let mut title = format!(" LIVE FEED ─ {} ", showing_caption(shown.len(), posts.len()));
    if filter.is_active() {
        title.push_str(&format!("({}) ", filter.describe()));
    }

    let items = shown.into_iter().map(post_item).collect::<Vec<_>>();
    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL))
            .title_style(Style::default().fg(C_TEXT)),
    );
    f.render_widget(list, area);
}
