//! Ratatui widget for the ticker tape panel

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::scroll::VisibleWindow;
use crate::sink::{TapeContent, TickerStatus};
use crate::snapshot::SnapshotStatus;
use crate::types::ColorTag;

const C_UP: Color = Color::Rgb(100, 220, 100);
const C_DOWN: Color = Color::Rgb(220, 100, 100);
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);

pub fn tag_style(tag: ColorTag) -> Style {
    match tag {
        ColorTag::Label => Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        ColorTag::Up => Style::default().fg(C_UP),
        ColorTag::Down => Style::default().fg(C_DOWN),
        ColorTag::Missing => Style::default().fg(C_BRIGHT),
        ColorTag::Separator => Style::default().fg(C_DIM),
    }
}

/// One span per styled run of the window
pub fn ticker_line(window: &VisibleWindow) -> Line<'static> {
    Line::from(
        window
            .runs()
            .into_iter()
            .map(|run| Span::styled(run.text, tag_style(run.tag)))
            .collect::<Vec<_>>(),
    )
}

pub fn status_line(status: &TickerStatus) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!(" {} symbols", status.instruments),
            Style::default().fg(C_DIM),
        ),
        Span::styled(format!("  lap {}", status.laps), Style::default().fg(C_DIM)),
    ];

    let updated = status
        .last_refresh
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "--".to_string());
    spans.push(Span::styled(
        format!("  updated {}", updated),
        Style::default().fg(C_DIM),
    ));

    if status.last_status == Some(SnapshotStatus::FailedClosed) {
        spans.push(Span::styled("  STALE", Style::default().fg(C_DOWN)));
    }
    if status.refreshing {
        spans.push(Span::styled("  refreshing…", Style::default().fg(C_ACCENT)));
    }
    spans.push(Span::styled("  [r] refresh  [q] quit", Style::default().fg(C_DIM)));

    Line::from(spans)
}

/// Render the tape panel with its status footer
pub fn render_ticker_panel(
    f: &mut Frame,
    area: Rect,
    content: TapeContent<'_>,
    status: &TickerStatus,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tape
            Constraint::Length(1), // Footer
            Constraint::Min(0),
        ])
        .split(area);

    let block = Block::default()
        .title(" LIVE STOCK TICKER ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_ACCENT));

    let line = match content {
        TapeContent::Window(window) => ticker_line(window),
        TapeContent::Placeholder(text) => {
            Line::from(Span::styled(text.to_string(), Style::default().fg(C_DIM)))
        }
    };

    f.render_widget(
        Paragraph::new(line).block(block).alignment(Alignment::Center),
        chunks[0],
    );
    f.render_widget(Paragraph::new(status_line(status)), chunks[1]);
}
