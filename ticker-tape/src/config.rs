/// Ticker configuration
///
/// Constructor-time constants for the tape: instrument list, animation cadence, window width and
/// refresh policy. Read from environment variables by the binary.
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, TickerError};
use crate::provider::DEFAULT_YAHOO_BASE_URL;
use crate::types::Instrument;

/// Default instrument list: large-cap US equities
pub const DEFAULT_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "BRK-B", "JPM", "JNJ", "V", "XOM", "WMT",
    "PG", "MA", "UNH", "HD", "BAC", "CVX", "KO", "PEP", "TMO", "LLY", "AVGO", "COST", "ABT",
    "PFE", "ADBE", "NKE", "MCD", "CRM", "VZ", "DIS", "ORCL", "NFLX", "CMCSA", "SBUX", "AMD",
    "INTC", "PYPL", "TXN", "AMAT", "QCOM", "GILD", "ADP", "FIS", "MDLZ", "BKNG", "CHTR", "SCHW",
    "FDX",
];

/// When a new refresh cycle starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Once per full traversal of the tape
    ScrollCycle,
    /// Fixed wall-clock interval, independent of scroll speed
    Interval(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerConfig {
    /// Instruments in display order
    pub instruments: Vec<Instrument>,
    /// Animation tick period
    pub tick_period: Duration,
    /// Fractional characters advanced per tick
    pub scroll_step: f64,
    /// Characters visible at once
    pub visible_width: usize,
    pub refresh_policy: RefreshPolicy,
    /// Upper bound on a single provider call
    pub fetch_timeout: Duration,
    /// Yahoo Finance chart endpoint
    pub base_url: String,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            instruments: DEFAULT_TICKERS.iter().copied().map(Instrument::from).collect(),
            tick_period: Duration::from_millis(50),
            scroll_step: 0.25,
            visible_width: 100,
            refresh_policy: RefreshPolicy::ScrollCycle,
            fetch_timeout: Duration::from_secs(10),
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
        }
    }
}

impl TickerConfig {
    /// Create a configuration for the given instruments
    pub fn new<I, S>(instruments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            instruments: instruments.into_iter().map(Instrument::new).collect(),
            ..Default::default()
        }
    }

    /// Read overrides from the environment
    ///
    /// `TICKERS` (comma separated), `TICK_MS`, `SCROLL_STEP`, `VISIBLE_WIDTH`, `REFRESH_SECS`
    /// (unset or 0 = refresh once per scroll cycle), `FETCH_TIMEOUT_SECS`, `YAHOO_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TickerConfig::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(tickers) = lookup("TICKERS") {
            config.instruments = parse_tickers(&tickers);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "TICK_MS")? {
            config.tick_period = Duration::from_millis(ms);
        }
        if let Some(step) = parse_var::<f64>(&lookup, "SCROLL_STEP")? {
            config.scroll_step = step;
        }
        if let Some(width) = parse_var::<usize>(&lookup, "VISIBLE_WIDTH")? {
            config.visible_width = width;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "REFRESH_SECS")? {
            config.refresh_policy = match secs {
                0 => RefreshPolicy::ScrollCycle,
                secs => RefreshPolicy::Interval(Duration::from_secs(secs)),
            };
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "FETCH_TIMEOUT_SECS")? {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = lookup("YAHOO_BASE_URL") {
            config.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn with_scroll_step(mut self, step: f64) -> Self {
        self.scroll_step = step;
        self
    }

    pub fn with_visible_width(mut self, width: usize) -> Self {
        self.visible_width = width;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(TickerError::Config("no instruments configured".to_string()));
        }
        let mut seen = HashSet::with_capacity(self.instruments.len());
        if let Some(duplicate) = self.instruments.iter().find(|i| !seen.insert(*i)) {
            return Err(TickerError::Config(format!(
                "instrument {} configured more than once",
                duplicate
            )));
        }
        if !self.scroll_step.is_finite() || self.scroll_step <= 0.0 {
            return Err(TickerError::Config(format!(
                "scroll step must be positive, got {}",
                self.scroll_step
            )));
        }
        if self.visible_width == 0 {
            return Err(TickerError::Config("visible width must be non-zero".to_string()));
        }
        if self.tick_period.is_zero() {
            return Err(TickerError::Config("tick period must be non-zero".to_string()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(TickerError::Config("fetch timeout must be non-zero".to_string()));
        }
        if let RefreshPolicy::Interval(interval) = self.refresh_policy {
            if interval.is_zero() {
                return Err(TickerError::Config("refresh interval must be non-zero".to_string()));
            }
        }
        Ok(())
    }
}

/// Split a comma separated ticker list, upper-casing and dropping blanks and duplicates
pub fn parse_tickers(raw: &str) -> Vec<Instrument> {
    let mut instruments: Vec<Instrument> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if symbol.is_empty() {
            continue;
        }
        let instrument = Instrument::from(symbol);
        if instruments.contains(&instrument) {
            warn!("Duplicate ticker {} ignored", instrument);
            continue;
        }
        instruments.push(instrument);
    }
    instruments
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| TickerError::Config(format!("{} is not a valid value: {:?}", key, raw))),
    }
}
