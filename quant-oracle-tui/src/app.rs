//! Dashboard application state: view selection, post filters and key handling.

use std::sync::Arc;

use crossterm::event::KeyCode;
use quant_oracle_feed::{
    ChainSignal, ConnectionStatus, DashboardState, DistributionSlice, LoadState, Post,
    SubredditStats, TickerUpdate,
};
use tokio::sync::watch;

use crate::chart::{ChartSurfaceManager, RegionId, SurfaceFactory};

/// Sidebar views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Overview,
    Sentiment,
    Trending,
    Signals,
}

impl View {
    pub const ALL: [View; 4] = [View::Overview, View::Sentiment, View::Trending, View::Signals];

    pub fn title(self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Sentiment => "Sentiment",
            View::Trending => "Trending",
            View::Signals => "Signals",
        }
    }

    pub fn next(self) -> View {
        match self {
            View::Overview => View::Sentiment,
            View::Sentiment => View::Trending,
            View::Trending => View::Signals,
            View::Signals => View::Overview,
        }
    }

    /// `1`..`4` select a view.
    pub fn from_digit(key: char) -> Option<View> {
        let index = key.to_digit(10)?.checked_sub(1)?;
        View::ALL.get(index as usize).copied()
    }

    /// Chart region this view hosts, if any.
    pub fn chart_region(self) -> Option<RegionId> {
        match self {
            View::Overview => Some(RegionId::OverviewChart),
            View::Sentiment => Some(RegionId::SentimentChart),
            View::Trending | View::Signals => None,
        }
    }
}

const MIN_SENTIMENT_STEPS: i8 = -10;
const MAX_SENTIMENT_STEPS: i8 = 10;

/// Client-side post feed filter. Never touches the dashboard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    /// Minimum sentiment in tenths; the lowest step disables the bound
    min_steps: i8,
    signal: Option<ChainSignal>,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            min_steps: MIN_SENTIMENT_STEPS,
            signal: None,
        }
    }
}

impl PostFilter {
    /// Minimum sentiment, `None` when unbounded.
    pub fn min_sentiment(&self) -> Option<f64> {
        (self.min_steps > MIN_SENTIMENT_STEPS).then(|| f64::from(self.min_steps) / 10.0)
    }

    pub fn signal(&self) -> Option<ChainSignal> {
        self.signal
    }

    pub fn raise_min_sentiment(&mut self) {
        self.min_steps = (self.min_steps + 1).min(MAX_SENTIMENT_STEPS);
    }

    pub fn lower_min_sentiment(&mut self) {
        self.min_steps = (self.min_steps - 1).max(MIN_SENTIMENT_STEPS);
    }

    /// All -> LOW_GAS -> NORMAL -> WHALE_ALERT -> N/A -> All
    pub fn cycle_signal(&mut self) {
        self.signal = match self.signal {
            None => Some(ChainSignal::ALL[0]),
            Some(current) => ChainSignal::ALL
                .iter()
                .position(|signal| *signal == current)
                .and_then(|index| ChainSignal::ALL.get(index + 1))
                .copied(),
        };
    }

    pub fn is_active(&self) -> bool {
        self.min_sentiment().is_some() || self.signal.is_some()
    }

    pub fn matches(&self, post: &Post) -> bool {
        let sentiment_ok = self
            .min_sentiment()
            .is_none_or(|min| post.sentiment >= min - f64::EPSILON);
        let signal_ok = self.signal.is_none_or(|signal| post.chain_signal == signal);
        sentiment_ok && signal_ok
    }

    pub fn apply<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        posts.iter().filter(|post| self.matches(post)).collect()
    }

    pub fn describe(&self) -> String {
        let min = self
            .min_sentiment()
            .map(|min| format!("{min:+.1}"))
            .unwrap_or_else(|| "any".to_string());
        let signal = self.signal.map(|signal| signal.as_str()).unwrap_or("All");
        format!("min sentiment {min} | signal {signal}")
    }
}

pub fn showing_caption(shown: usize, total: usize) -> String {
    format!("Showing {shown} of {total} posts")
}

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
}

/// Receivers for the live ticker.
#[derive(Debug, Clone)]
pub struct TickerHandles {
    pub updates: watch::Receiver<Option<TickerUpdate>>,
    pub status: watch::Receiver<ConnectionStatus>,
}

/// Everything the dashboard reads.
#[derive(Debug, Clone)]
pub struct FeedHandles {
    pub state: watch::Receiver<Arc<DashboardState>>,
    pub distribution: watch::Receiver<LoadState<DistributionSlice>>,
    pub subreddits: watch::Receiver<LoadState<SubredditStats>>,
    pub ticker: Option<TickerHandles>,
}

/// Live ticker view at draw time.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerSnapshot {
    Disabled,
    Live {
        status: ConnectionStatus,
        update: Option<TickerUpdate>,
    },
}

/// Consistent copy of every feed, taken once per frame.
#[derive(Debug, Clone)]
pub struct FrameData {
    pub state: Arc<DashboardState>,
    pub distribution: LoadState<DistributionSlice>,
    pub subreddits: LoadState<SubredditStats>,
    pub ticker: TickerSnapshot,
}

pub struct App<F> {
    pub view: View,
    pub filter: PostFilter,
    pub chart: ChartSurfaceManager<F>,
    feeds: FeedHandles,
}

impl<F> App<F>
where
    F: SurfaceFactory,
{
    pub fn new(feeds: FeedHandles, factory: F) -> Self {
        Self {
            view: View::default(),
            filter: PostFilter::default(),
            chart: ChartSurfaceManager::new(factory),
            feeds,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.filter.raise_min_sentiment(),
            KeyCode::Char('-') => self.filter.lower_min_sentiment(),
            KeyCode::Char('f') => self.filter.cycle_signal(),
            KeyCode::Char(key) => {
                if let Some(view) = View::from_digit(key) {
                    self.view = view;
                }
            }
            _ => {}
        }
        Action::None
    }

    pub fn frame_data(&self) -> FrameData {
        let ticker = match &self.feeds.ticker {
            None => TickerSnapshot::Disabled,
            Some(handles) => TickerSnapshot::Live {
                status: *handles.status.borrow(),
                update: handles.updates.borrow().clone(),
            },
        };

        FrameData {
            state: Arc::clone(&self.feeds.state.borrow()),
            distribution: self.feeds.distribution.borrow().clone(),
            subreddits: self.feeds.subreddits.borrow().clone(),
            ticker,
        }
    }
}
