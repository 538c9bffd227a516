//! Rendering surfaces for the sentiment chart.

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget},
};

use super::series::RenderSeries;

/// Rows a chart surface occupies.
pub const CHART_HEIGHT: u16 = 14;

/// Fixed chart colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartTheme {
    pub background: Color,
    pub text: Color,
    pub grid: Color,
    pub series: Color,
    /// Terminal stand-in for line width: braille is thin, block is heavy
    pub marker: Marker,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(0x1e, 0x22, 0x2d),
            text: Color::Rgb(0xd1, 0xd4, 0xdc),
            grid: Color::Rgb(0x2b, 0x2f, 0x3a),
            series: Color::Rgb(0x29, 0x62, 0xff),
            marker: Marker::Braille,
        }
    }
}

/// Options a surface is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceOptions {
    pub width: u16,
    pub height: u16,
    pub theme: ChartTheme,
}

/// A stateful chart bound to one region.
pub trait RenderSurface {
    /// Replace the whole series.
    fn replace_series(&mut self, series: &RenderSeries);

    /// Re-apply the region width. The series is left alone.
    fn apply_width(&mut self, width: u16);

    fn draw(&self, area: Rect, buf: &mut Buffer);

    /// Release the surface. Called exactly once.
    fn destroy(self: Box<Self>);
}

/// Creates surfaces for the chart manager.
pub trait SurfaceFactory {
    fn create(&mut self, options: SurfaceOptions) -> Box<dyn RenderSurface>;
}

/// ratatui line chart of sentiment over time.
#[derive(Debug, Clone)]
pub struct LineChartSurface {
    options: SurfaceOptions,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_labels: Vec<String>,
}

impl LineChartSurface {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            options,
            points: Vec::new(),
            x_bounds: [0.0, 1.0],
            y_bounds: [-1.0, 1.0],
            x_labels: Vec::new(),
        }
    }

    pub fn width(&self) -> u16 {
        self.options.width
    }
}

impl RenderSurface for LineChartSurface {
    fn replace_series(&mut self, series: &RenderSeries) {
        self.points = series.chart_points();

        if let Some((first, last)) = series.time_bounds() {
            self.x_bounds = if first == last {
                [first as f64 - 1.0, last as f64 + 1.0]
            } else {
                [first as f64, last as f64]
            };
            self.x_labels = vec![clock_label(first), clock_label(last)];
        }

        if let Some((min, max)) = series.value_bounds() {
            self.y_bounds = [min.min(-1.0), max.max(1.0)];
        }
    }

    fn apply_width(&mut self, width: u16) {
        self.options.width = width;
    }

    fn draw(&self, area: Rect, buf: &mut Buffer) {
        let area = Rect {
            width: area.width.min(self.options.width),
            height: area.height.min(self.options.height),
            ..area
        };
        let theme = self.options.theme;
        let text = Style::default().fg(theme.text);

        let dataset = Dataset::default()
            .name("sentiment")
            .marker(theme.marker)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.series))
            .data(&self.points);

        let y_labels = [self.y_bounds[0], 0.0, self.y_bounds[1]]
            .into_iter()
            .map(|value| Span::styled(format!("{value:.1}"), text))
            .collect::<Vec<_>>();

        Chart::new(vec![dataset])
            .style(Style::default().bg(theme.background))
            .block(
                Block::default()
                    .title(" SENTIMENT TIMELINE ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.grid))
                    .title_style(text),
            )
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(theme.grid))
                    .bounds(self.x_bounds)
                    .labels(self.x_labels.iter().map(|label| Span::styled(label.clone(), text))),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(theme.grid))
                    .bounds(self.y_bounds)
                    .labels(y_labels),
            )
            .render(area, buf);
    }

    fn destroy(self: Box<Self>) {}
}

/// Production factory creating [`LineChartSurface`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineChartFactory;

impl SurfaceFactory for LineChartFactory {
    fn create(&mut self, options: SurfaceOptions) -> Box<dyn RenderSurface> {
        Box::new(LineChartSurface::new(options))
    }
}

fn clock_label(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|time| time.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}
