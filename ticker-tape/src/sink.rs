/// Rendering sink for the scrolling tape
///
/// The app hands each visible window (or the loading placeholder) to a [`RenderSink`]; the
/// terminal implementation draws it with ratatui.
use chrono::{DateTime, Utc};
use ratatui::{backend::Backend, Terminal};

use crate::error::Result;
use crate::scroll::VisibleWindow;
use crate::snapshot::SnapshotStatus;
use crate::widget::render_ticker_panel;

/// Receives one frame per animation tick
pub trait RenderSink {
    fn render(&mut self, window: &VisibleWindow) -> Result<()>;

    fn render_placeholder(&mut self, text: &str) -> Result<()>;

    /// Latest status for sinks that show a footer
    fn update_status(&mut self, _status: &TickerStatus) {}
}

/// Refresh and scroll bookkeeping shown under the tape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerStatus {
    pub instruments: usize,
    pub laps: u64,
    pub refreshing: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_status: Option<SnapshotStatus>,
}

/// What the panel shows this frame
#[derive(Debug, Clone, Copy)]
pub enum TapeContent<'a> {
    Window(&'a VisibleWindow),
    Placeholder(&'a str),
}

/// Draws the tape into a ratatui terminal
pub struct TerminalSink<B: Backend> {
    terminal: Terminal<B>,
    status: TickerStatus,
}

impl<B: Backend> TerminalSink<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            status: TickerStatus::default(),
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    fn draw(&mut self, content: TapeContent<'_>) -> Result<()> {
        let status = &self.status;
        self.terminal
            .draw(|f| render_ticker_panel(f, f.area(), content, status))?;
        Ok(())
    }
}

impl<B: Backend> RenderSink for TerminalSink<B> {
    fn render(&mut self, window: &VisibleWindow) -> Result<()> {
        self.draw(TapeContent::Window(window))
    }

    fn render_placeholder(&mut self, text: &str) -> Result<()> {
        self.draw(TapeContent::Placeholder(text))
    }

    fn update_status(&mut self, status: &TickerStatus) {
        self.status = status.clone();
    }
}
