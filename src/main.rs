//! upwatch - terminal uptime monitor for HTTP endpoints.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::Event;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use upwatch::app::App;
use upwatch::config;
use upwatch::events;
use upwatch::monitor::{Alert, Orchestrator, ProbeEvent};
use upwatch::ui;

/// How often the 10-minute-window reports are refreshed.
const MEDIUM_REFRESH: Duration = Duration::from_secs(10);
/// How often the 1-hour-window reports are refreshed.
const LONG_REFRESH: Duration = Duration::from_secs(60);
/// Total monitoring session length.
const RUN_FOR: Duration = Duration::from_secs(30 * 60);
/// Terminal event poll timeout; also paces alert draining.
const EVENT_POLL: Duration = Duration::from_millis(100);
/// Alert channel capacity; overflow is dropped with a log line.
const ALERT_BUFFER: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "upwatch")]
#[command(about = "Terminal uptime monitor probing HTTP endpoints")]
struct Args {
    /// Config file listing endpoints, one URL[,INTERVAL_MS] per line
    #[arg(long = "cfg", default_value = "./config.sample")]
    cfg: PathBuf,

    /// Where to write the debug log
    #[arg(long, default_value = "upwatch.log")]
    log: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log)?;

    let endpoints = config::load(&args.cfg)
        .with_context(|| format!("failed to load config from {}", args.cfg.display()))?;
    tracing::info!(count = endpoints.len(), "loaded endpoint config");

    let runtime = tokio::runtime::Runtime::new()?;
    let (probe_tx, probe_rx) = mpsc::channel::<ProbeEvent>(1);
    let (alert_tx, alert_rx) = mpsc::channel::<Alert>(ALERT_BUFFER);
    let orchestrator = {
        let _guard = runtime.enter();
        Orchestrator::new(probe_tx, probe_rx, alert_tx)
    };

    let mut urls = Vec::with_capacity(endpoints.len());
    for endpoint in &endpoints {
        match orchestrator.register(endpoint) {
            Ok(()) => urls.push(endpoint.url.clone()),
            Err(err) => tracing::error!(%err, "skipping endpoint"),
        }
    }
    if let Err(err) = orchestrator.start_all() {
        tracing::error!(%err, "failed to start monitoring");
    }

    let result = run_tui(&orchestrator, urls, alert_rx);

    // wind the probers down before tearing the runtime down
    if let Err(err) = orchestrator.pause_all() {
        tracing::error!(%err, "failed to pause monitoring on shutdown");
    }
    if let Err(err) = orchestrator.unregister_all() {
        tracing::error!(%err, "failed to unregister endpoints on shutdown");
    }
    runtime.shutdown_timeout(Duration::from_secs(1));

    result
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("upwatch=info".parse()?),
        )
        .with_writer(file)
        .with_ansi(false)
        .init();
    Ok(())
}

/// Set the terminal up, run the monitor loop, and restore the terminal
/// even when the loop panics.
fn run_tui(
    orchestrator: &std::sync::Arc<Orchestrator>,
    urls: Vec<String>,
    mut alert_rx: mpsc::Receiver<Alert>,
) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(orchestrator.clone(), urls);
    let result = run_app(&mut terminal, &mut app, &mut alert_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    alert_rx: &mut mpsc::Receiver<Alert>,
) -> Result<()> {
    let mut last_medium = Instant::now();
    let mut last_long = Instant::now();

    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(event) = events::poll_event(EVENT_POLL)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Resize(_, _) => {
                    // redrawn with the new size on the next iteration
                }
                _ => {}
            }
        }

        // drain alerts eagerly so the orchestrator never backs up
        while let Ok(alert) = alert_rx.try_recv() {
            app.push_alert(alert);
        }

        if last_medium.elapsed() >= MEDIUM_REFRESH {
            app.refresh_medium();
            last_medium = Instant::now();
        }
        if last_long.elapsed() >= LONG_REFRESH {
            app.refresh_long();
            last_long = Instant::now();
        }
        if app.started_at.elapsed() >= RUN_FOR {
            app.quit();
        }
    }

    Ok(())
}
