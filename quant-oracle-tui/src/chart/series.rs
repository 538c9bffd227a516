//! Sentiment timeline to chart series conversion.

use itertools::{Itertools, MinMaxResult};
use quant_oracle_feed::TimelineSample;

/// One chart point: whole epoch seconds and sentiment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: i64,
    pub value: f64,
}

/// Time-ordered sentiment series handed to a rendering surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSeries {
    points: Vec<SeriesPoint>,
}

impl RenderSeries {
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last time, `None` when empty.
    pub fn time_bounds(&self) -> Option<(i64, i64)> {
        Some((self.points.first()?.time, self.points.last()?.time))
    }

    /// Lowest and highest sentiment, `None` when empty.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        match self.points.iter().map(|point| point.value).minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(value) => Some((value, value)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }

    /// Points as `(x, y)` pairs for ratatui datasets.
    pub fn chart_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|point| (point.time as f64, point.value))
            .collect()
    }
}

/// Map samples to whole epoch seconds and sort ascending by time.
///
/// The sort is stable, so samples sharing a second keep their feed order.
pub fn to_render_series(samples: &[TimelineSample]) -> RenderSeries {
    let mut points = samples
        .iter()
        .map(|sample| SeriesPoint {
            time: sample.timestamp.timestamp(),
            value: sample.sentiment,
        })
        .collect::<Vec<_>>();

    points.sort_by_key(|point| point.time);

    RenderSeries { points }
}
