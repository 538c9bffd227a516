//! Lifecycle of the sentiment chart surface.
//!
//! The [`ChartSurfaceManager`] owns at most one surface at a time. A surface is
//! created lazily once a region is mounted and data is available, receives
//! whole-series replacements afterwards, and is destroyed exactly once when its
//! region goes away. The surface and its resize listener live in one
//! [`SurfaceLease`] so they are always released together.

use std::sync::Arc;

use quant_oracle_feed::TimelineSample;
use ratatui::{buffer::Buffer, layout::Rect};
use tracing::debug;

use super::{
    resize::{ResizeListener, ResizeSignal},
    series::{to_render_series, RenderSeries},
    surface::{ChartTheme, RenderSurface, SurfaceFactory, SurfaceOptions, CHART_HEIGHT},
};

/// Layout slots that can host the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionId {
    OverviewChart,
    SentimentChart,
}

/// A mounted region: which slot, and where it currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRegion {
    pub id: RegionId,
    pub area: Rect,
}

/// Lifecycle phase of the current (or last) surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    Uninitialized,
    Created,
    Updated,
    Destroyed,
}

/// A live surface together with its resize registration.
///
/// Dropping the lease destroys the surface and deregisters the listener.
pub struct SurfaceLease {
    region: RegionId,
    surface: Option<Box<dyn RenderSurface>>,
    listener: ResizeListener,
}

impl SurfaceLease {
    pub fn region(&self) -> RegionId {
        self.region
    }

    fn surface_mut(&mut self) -> Option<&mut (dyn RenderSurface + 'static)> {
        self.surface.as_deref_mut()
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            debug!(region = ?self.region, "destroying chart surface");
            surface.destroy();
        }
    }
}

/// Owns the chart surface for whichever region is mounted.
pub struct ChartSurfaceManager<F> {
    factory: F,
    theme: ChartTheme,
    height: u16,
    resize: ResizeSignal,
    region: Option<RegionId>,
    samples: Option<Arc<[TimelineSample]>>,
    series: RenderSeries,
    lease: Option<SurfaceLease>,
    phase: SurfacePhase,
}

impl<F> ChartSurfaceManager<F>
where
    F: SurfaceFactory,
{
    pub fn new(factory: F) -> Self {
        Self::with_theme(factory, ChartTheme::default())
    }

    pub fn with_theme(factory: F, theme: ChartTheme) -> Self {
        Self {
            factory,
            theme,
            height: CHART_HEIGHT,
            resize: ResizeSignal::new(0),
            region: None,
            samples: None,
            series: RenderSeries::default(),
            lease: None,
            phase: SurfacePhase::Uninitialized,
        }
    }

    /// Mount a region, replacing any other region first.
    ///
    /// Re-mounting the current region only publishes its width.
    pub fn mount(&mut self, region: ChartRegion) {
        if self.region == Some(region.id) {
            self.resize.notify(region.area.width);
            self.poll_resize();
            return;
        }

        self.release();
        debug!(region = ?region.id, width = region.area.width, "mounting chart region");
        self.region = Some(region.id);
        self.resize.notify(region.area.width);

        if !self.series.is_empty() {
            self.establish(region.id);
        }
    }

    /// Dispose of the current region, destroying its surface.
    pub fn unmount(&mut self) {
        self.release();
        self.region = None;
    }

    /// Feed the latest timeline.
    ///
    /// A new list (by reference or value) replaces the series wholesale. An
    /// empty list leaves the current series and surface untouched.
    pub fn observe(&mut self, samples: &Arc<[TimelineSample]>) {
        if let Some(previous) = &self.samples {
            if Arc::ptr_eq(previous, samples) {
                return;
            }
        }
        self.samples = Some(Arc::clone(samples));

        let series = to_render_series(samples);
        if series.is_empty() {
            return;
        }
        self.series = series;

        let Some(region) = self.region else {
            return;
        };
        match self.lease.as_mut().and_then(SurfaceLease::surface_mut) {
            Some(surface) => {
                surface.replace_series(&self.series);
                self.phase = SurfacePhase::Updated;
            }
            None => self.establish(region),
        }
    }

    /// Apply a pending width change to the live surface.
    pub fn poll_resize(&mut self) {
        let Some(lease) = self.lease.as_mut() else {
            return;
        };
        if let Some(width) = lease.listener.poll() {
            if let Some(surface) = lease.surface_mut() {
                surface.apply_width(width);
            }
        }
    }

    pub fn draw(&self, area: Rect, buf: &mut Buffer) {
        if let Some(surface) = self.lease.as_ref().and_then(|lease| lease.surface.as_deref()) {
            surface.draw(area, buf);
        }
    }

    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    pub fn series(&self) -> &RenderSeries {
        &self.series
    }

    pub fn has_surface(&self) -> bool {
        self.lease.is_some()
    }

    pub fn resize_listeners(&self) -> usize {
        self.resize.listener_count()
    }

    fn establish(&mut self, region: RegionId) {
        self.release();

        let mut surface = self.factory.create(SurfaceOptions {
            width: self.resize.width(),
            height: self.height,
            theme: self.theme,
        });
        surface.replace_series(&self.series);

        debug!(?region, points = self.series.len(), "chart surface created");
        self.lease = Some(SurfaceLease {
            region,
            surface: Some(surface),
            listener: self.resize.listen(),
        });
        self.phase = SurfacePhase::Created;
    }

    fn release(&mut self) {
        if self.lease.take().is_some() {
            self.phase = SurfacePhase::Destroyed;
        }
    }
}
