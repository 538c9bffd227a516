//! Dashboard rendering.
//!
//! Each frame takes one [`FrameData`] copy of the feeds, lays out the screen
//! for the selected view, and mounts or unmounts the chart region to match.
pub mod cards;
pub mod header;
pub mod posts;
pub mod signals;
pub mod theme;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::{
    app::{App, FrameData, View},
    chart::{ChartRegion, RegionId, SurfaceFactory, CHART_HEIGHT},
};
use theme::{C_ACCENT, C_BG, C_DIM};

pub const LOADING_TEXT: &str = "Loading Quant Oracle...";

const HEADER_HEIGHT: u16 = 4;
const SIDEBAR_WIDTH: u16 = 16;
const CARDS_HEIGHT: u16 = 4;

pub fn render<F>(f: &mut Frame, app: &mut App<F>)
where
    F: SurfaceFactory,
{
    let data = app.frame_data();
    app.chart.observe(&data.state.timeline);

    f.render_widget(Block::default().style(Style::default().bg(C_BG)), f.area());

    if data.state.loading {
        app.chart.unmount();
        render_loading(f, f.area());
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .split(f.area());
    header::render_header(f, rows[0], data.state.metrics.as_ref(), &data.ticker);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(rows[1]);
    header::render_sidebar(f, body[0], app.view);

    let main = body[1];
    match app.view {
        View::Overview => render_overview(f, main, app, &data),
        View::Sentiment => render_sentiment(f, main, app, &data),
        View::Trending => {
            app.chart.unmount();
            signals::render_trending(f, main, &data.subreddits);
        }
        View::Signals => {
            app.chart.unmount();
            signals::render_distribution(f, main, &data.distribution, data.state.metrics.as_ref());
        }
    }
}

fn render_overview<F>(f: &mut Frame, area: Rect, app: &mut App<F>, data: &FrameData)
where
    F: SurfaceFactory,
{
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(CARDS_HEIGHT),
            Constraint::Length(CHART_HEIGHT),
            Constraint::Min(0),
        ])
        .split(area);
    cards::render_cards(f, rows[0], data.state.metrics.as_ref());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);
    render_chart(f, middle[0], app, RegionId::OverviewChart);
    signals::render_distribution(f, middle[1], &data.distribution, None);

    posts::render_posts(f, rows[2], &data.state.posts, &app.filter);
}

fn render_sentiment<F>(f: &mut Frame, area: Rect, app: &mut App<F>, data: &FrameData)
where
    F: SurfaceFactory,
{
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(CHART_HEIGHT), Constraint::Min(0)])
        .split(area);

    render_chart(f, rows[0], app, RegionId::SentimentChart);
    posts::render_posts(f, rows[1], &data.state.posts, &app.filter);
}

fn render_chart<F>(f: &mut Frame, area: Rect, app: &mut App<F>, id: RegionId)
where
    F: SurfaceFactory,
{
    app.chart.mount(ChartRegion { id, area });
    if app.chart.has_surface() {
        app.chart.draw(area, f.buffer_mut());
    } else {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Waiting for sentiment data...",
            Style::default().fg(C_DIM),
        )))
        .alignment(Alignment::Center)
        .block(Block::bordered().border_style(Style::default().fg(theme::C_PANEL)));
        f.render_widget(waiting, area);
    }
}

fn render_loading(f: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let text = Paragraph::new(Line::from(Span::styled(
        LOADING_TEXT,
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(text, rows[1]);
}
