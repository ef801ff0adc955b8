/// Live Stock Ticker
///
/// Scrolls a colour-coded tape of equity quotes across the terminal and refreshes it from Yahoo
/// Finance once per scroll cycle (or every `REFRESH_SECS`).
///
/// Keys: `q`/`Esc` quit, `r` refresh now.
/// Logs go to `TICKER_LOG_FILE` when set (`RUST_LOG`, default `info`). Otherwise only errors
/// reach stderr, so warnings do not land on top of the tape.
use std::{
    error::Error,
    fs::OpenOptions,
    io,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use ticker_tape::{QuoteProvider, TerminalSink, TickerApp, TickerConfig, YahooProvider};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging(std::env::var("TICKER_LOG_FILE").ok())?;

    let config = TickerConfig::from_env()?;
    let provider: Arc<dyn QuoteProvider> =
        Arc::new(YahooProvider::new(config.base_url.clone(), config.fetch_timeout)?);
    info!(
        "Starting ticker for {} instruments, tick {:?}, step {}",
        config.instruments.len(),
        config.tick_period,
        config.scroll_step
    );

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut sink = TerminalSink::new(Terminal::new(backend)?);

    let mut app = TickerApp::new(&config, provider);
    app.start();

    let result = run(&mut app, &mut sink, config.tick_period).await;

    disable_raw_mode()?;
    execute!(sink.terminal_mut().backend_mut(), LeaveAlternateScreen)?;
    sink.terminal_mut().show_cursor()?;
    result
}

async fn run(
    app: &mut TickerApp,
    sink: &mut TerminalSink<CrosstermBackend<io::Stdout>>,
    tick_period: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut last_tick: Option<Instant> = None;

    loop {
        if last_tick.is_none_or(|t| t.elapsed() >= tick_period) {
            app.on_tick(sink)?;
            last_tick = Some(Instant::now());
        }

        let timeout = Duration::from_millis(5).min(tick_period);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            if !app.force_refresh() {
                                info!("Refresh already in flight");
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Default `EnvFilter` directive: a log file takes everything from INFO, stderr shares the
/// terminal with the tape and only takes errors
fn default_log_filter(to_file: bool) -> &'static str {
    if to_file { "info" } else { "error" }
}

fn env_filter(to_file: bool) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_filter(to_file)))
}

/// Initialise a `Subscriber` for `Tracing` logs, appending to `log_file` or writing to stderr
fn init_logging(log_file: Option<String>) -> io::Result<()> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(true))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(false))
                .with_writer(io::stderr)
                .with_ansi(false)
                .init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_logging_only_takes_errors() {
        assert_eq!(default_log_filter(false), "error");
        assert_eq!(default_log_filter(true), "info");
    }
}
