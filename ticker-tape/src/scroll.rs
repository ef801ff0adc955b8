//! Scroll engine
//!
//! Advances a fractional read position over the display buffer once per animation tick and
//! cuts the fixed-width visible window, stitching the buffer's tail to its head on wrap-around.
//! Also decides when a new refresh cycle should start: once per full traversal of the buffer.

use crate::compositor::{group_runs, DisplayBuffer, StyledRun};
use crate::types::ColorTag;

/// Fixed-width slice of the display buffer shown on one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWindow {
    cells: Vec<(char, ColorTag)>,
}

impl VisibleWindow {
    /// Cut `width` cells starting at `start`, wrapping to the head of the buffer
    ///
    /// Indices are taken modulo the buffer length, so a window wider than the buffer repeats the
    /// tape rather than reading out of bounds.
    pub fn from_buffer(buffer: &DisplayBuffer, start: usize, width: usize) -> Self {
        let len = buffer.len();
        if len == 0 {
            return Self { cells: Vec::new() };
        }

        let chars = buffer.chars();
        let colors = buffer.colors();
        let cells = (0..width)
            .map(|offset| {
                let index = (start + offset) % len;
                (chars[index], colors[index])
            })
            .collect();

        Self { cells }
    }

    pub fn cells(&self) -> &[(char, ColorTag)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn text(&self) -> String {
        self.cells.iter().map(|(c, _)| *c).collect()
    }

    pub fn colors(&self) -> Vec<ColorTag> {
        self.cells.iter().map(|(_, tag)| *tag).collect()
    }

    pub fn runs(&self) -> Vec<StyledRun> {
        group_runs(self.cells.iter().copied())
    }
}

/// Outcome of a single animation tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrollTick {
    /// Window to publish, `None` when the buffer is empty
    pub window: Option<VisibleWindow>,
    /// The tape is back at its head and no refresh is in flight
    pub start_cycle: bool,
}

/// Circular scroll position over the display buffer
#[derive(Debug, Clone)]
pub struct ScrollEngine {
    position: f64,
    visible_width: usize,
    step: f64,
    /// Buffer length `position` was last normalised against
    buffer_len: usize,
    /// Completed traversals of the buffer
    laps: u64,
    /// Last advance crossed the end of the buffer; consumed by the next tick
    wrapped: bool,
}

impl ScrollEngine {
    pub fn new(visible_width: usize, step: f64) -> Self {
        Self {
            position: 0.0,
            visible_width,
            step,
            buffer_len: 0,
            laps: 0,
            wrapped: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn visible_width(&self) -> usize {
        self.visible_width
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn laps(&self) -> u64 {
        self.laps
    }

    /// Move the read position; normalised against the buffer on the next tick
    pub fn seek(&mut self, position: f64) {
        self.position = position;
    }

    /// Keep `position` inside `[0, len)` after the buffer was replaced or seeked
    fn normalise(&mut self, len: usize) {
        if len == 0 {
            self.position = 0.0;
        } else if len != self.buffer_len
            || !self.position.is_finite()
            || self.position < 0.0
            || self.position >= len as f64
        {
            self.position = if self.position.is_finite() {
                self.position.rem_euclid(len as f64)
            } else {
                0.0
            };
        }
        self.buffer_len = len;
    }

    /// Produce the visible window for this tick and advance by one step
    ///
    /// An empty buffer skips rendering and advancing entirely.
    pub fn tick(&mut self, buffer: &DisplayBuffer, refresh_in_flight: bool) -> ScrollTick {
        let len = buffer.len();
        self.normalise(len);
        if len == 0 {
            return ScrollTick::default();
        }

        let start = self.position.floor() as usize;
        let window = VisibleWindow::from_buffer(buffer, start, self.visible_width);

        // Only a real wrap starts a cycle, never a shortened buffer. The startup pass has not
        // wrapped yet, so it does not count either.
        let start_cycle = self.wrapped && !refresh_in_flight;

        let next = self.position + self.step;
        self.wrapped = next >= len as f64;
        if self.wrapped {
            self.laps += 1;
        }
        self.position = next.rem_euclid(len as f64);

        ScrollTick {
            window: Some(window),
            start_cycle,
        }
    }
}
