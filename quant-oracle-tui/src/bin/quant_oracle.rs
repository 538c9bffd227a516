/// Quant Oracle terminal dashboard
///
/// Polls the Quant Oracle API every refresh interval, shows the live ticker
/// in the header, and draws the sentiment chart, post feed, signal
/// distribution and trending subreddits.
use std::{error::Error, fs::File, io, sync::Arc, time::Duration};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use quant_oracle_feed::{
    loader::{spawn_distribution_loader, spawn_subreddit_stats_loader},
    DashboardConfig, HttpFeedSource, LiveTicker, RefreshOrchestrator, TickerConfig,
};
use quant_oracle_tui::{ui, Action, App, FeedHandles, LineChartFactory, TickerHandles};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

/// Input poll timeout, which also bounds how stale a frame can be
const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = DashboardConfig::from_env();
    init_logging(&config)?;

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let source = Arc::new(HttpFeedSource::new(&config)?);
    let orchestrator = RefreshOrchestrator::new(Arc::clone(&source), &config);
    orchestrator.activate();

    let ticker = TickerConfig::from_dashboard(&config).map(LiveTicker::spawn);
    let feeds = FeedHandles {
        state: orchestrator.subscribe(),
        distribution: spawn_distribution_loader(Arc::clone(&source)),
        subreddits: spawn_subreddit_stats_loader(Arc::clone(&source)),
        ticker: ticker.as_ref().map(|ticker| TickerHandles {
            updates: ticker.updates.clone(),
            status: ticker.status.clone(),
        }),
    };
    let mut app = App::new(feeds, LineChartFactory);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &orchestrator);

    orchestrator.deactivate();
    // Release the chart surface before the terminal goes away
    app.chart.unmount();
    drop(ticker);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("quant oracle dashboard closed");
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<LineChartFactory>,
    orchestrator: &RefreshOrchestrator<HttpFeedSource>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_key(key.code) {
                    Action::Quit => return Ok(()),
                    Action::Refresh => {
                        orchestrator.manual_refresh();
                    }
                    Action::None => {}
                }
            }
        }
    }
}

/// Initialize logging to the configured file so the alternate screen stays clean
fn init_logging(config: &DashboardConfig) -> Result<(), Box<dyn Error>> {
    let file = File::create(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    info!(api_url = %config.api_url, log_file = %config.log_file.display(), "logging initialised");
    Ok(())
}
