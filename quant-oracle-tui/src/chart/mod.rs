//! Sentiment chart: series conversion, rendering surfaces and their lifecycle.
pub mod manager;
pub mod resize;
pub mod series;
pub mod surface;

pub use manager::{ChartRegion, ChartSurfaceManager, RegionId, SurfaceLease, SurfacePhase};
pub use resize::{ResizeListener, ResizeSignal};
pub use series::{to_render_series, RenderSeries, SeriesPoint};
pub use surface::{
    ChartTheme, LineChartFactory, LineChartSurface, RenderSurface, SurfaceFactory, SurfaceOptions,
    CHART_HEIGHT,
};
