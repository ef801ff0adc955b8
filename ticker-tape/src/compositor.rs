//! Ticker text compositor
//!
//! Flattens a [`QuoteSnapshot`] into the display buffer: one character stream plus a parallel
//! stream of colour tags. Pure and deterministic, so identical snapshots produce identical
//! buffers and a refresh with unchanged data never makes the tape jump.

use crate::snapshot::QuoteSnapshot;
use crate::types::{ColorTag, Direction};

/// Text inserted between consecutive instrument fragments
pub const SEPARATOR: &str = "  |  ";

/// Fragment text for an instrument without usable data
pub const MISSING_TEXT: &str = "N/A";

/// Full colourised character stream for the current cycle
///
/// `colors[i]` is the colour of `text[i]`. The buffer is never mutated after composition; a new
/// buffer replaces the old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayBuffer {
    text: Vec<char>,
    colors: Vec<ColorTag>,
}

impl DisplayBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    fn push(&mut self, fragment: &str, tag: ColorTag) {
        for c in fragment.chars() {
            self.text.push(c);
            self.colors.push(tag);
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.text
    }

    pub fn colors(&self) -> &[ColorTag] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<(char, ColorTag)> {
        Some((*self.text.get(index)?, *self.colors.get(index)?))
    }

    /// Plain text without colour information
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }
}

impl FromIterator<(char, ColorTag)> for DisplayBuffer {
    fn from_iter<I: IntoIterator<Item = (char, ColorTag)>>(cells: I) -> Self {
        let (text, colors) = cells.into_iter().unzip();
        Self { text, colors }
    }
}

/// Contiguous characters sharing one colour tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub tag: ColorTag,
}

/// Group a per-character colour stream into styled runs
pub fn group_runs(cells: impl IntoIterator<Item = (char, ColorTag)>) -> Vec<StyledRun> {
    let mut runs: Vec<StyledRun> = Vec::new();
    for (c, tag) in cells {
        match runs.last_mut() {
            Some(run) if run.tag == tag => run.text.push(c),
            _ => runs.push(StyledRun {
                text: c.to_string(),
                tag,
            }),
        }
    }
    runs
}

/// Compose the display buffer for a snapshot, in snapshot (configured) order
pub fn compose(snapshot: &QuoteSnapshot) -> DisplayBuffer {
    let mut buffer = DisplayBuffer::empty();

    for (index, (instrument, quote)) in snapshot.iter().enumerate() {
        if index > 0 {
            buffer.push(SEPARATOR, ColorTag::Separator);
        }

        match (quote.price, quote.change_percent) {
            (Some(price), Some(change)) => {
                let direction = Direction::from_change(change);
                buffer.push(&format!(" {}:", instrument), ColorTag::Label);
                buffer.push(
                    &format!(" ${:.2} {}{:.2}% ", price, direction.arrow(), change.abs()),
                    ColorTag::from(direction),
                );
            }
            _ => buffer.push(
                &format!(" {}: {} ", instrument, MISSING_TEXT),
                ColorTag::Missing,
            ),
        }
    }

    buffer
}
