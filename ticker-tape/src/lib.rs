/// Ticker Tape - Scrolling Quote Ticker
///
/// Renders a continuously scrolling, colour-coded line of equity quotes in the terminal and
/// refreshes it from Yahoo Finance once per scroll cycle without stalling the animation.
///
/// The library includes:
/// - Quote snapshot builder and tape compositor
/// - Scroll engine with wrap-around windowing
/// - Single-flight refresh coordinator
/// - Ratatui rendering sink
pub mod app;
pub mod compositor;
pub mod config;
pub mod error;
pub mod provider;
pub mod refresh;
pub mod scroll;
pub mod sink;
pub mod snapshot;
pub mod types;
pub mod widget;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use app::{TickerApp, LOADING_PLACEHOLDER};
pub use compositor::{compose, DisplayBuffer, StyledRun};
pub use config::{RefreshPolicy, TickerConfig};
pub use error::{Result, TickerError};
pub use provider::{QuoteProvider, YahooProvider};
pub use refresh::RefreshCoordinator;
pub use scroll::{ScrollEngine, ScrollTick, VisibleWindow};
pub use sink::{RenderSink, TerminalSink, TickerStatus};
pub use snapshot::{ProviderResponse, QuoteSnapshot, SnapshotStatus};
pub use types::{ColorTag, Direction, Instrument, PricePoint, Quote};
