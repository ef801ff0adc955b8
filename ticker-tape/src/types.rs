/// Core data types shared by the snapshot builder, compositor and scroll engine
use chrono::{DateTime, Utc};
use smol_str::SmolStr;

/// Tradable symbol tracked by the ticker (e.g., "AAPL", "BRK-B")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instrument(SmolStr);

impl Instrument {
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(SmolStr::new(symbol.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Number of characters the symbol occupies on the tape
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl AsRef<str> for Instrument {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Instrument {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Instrument {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single observation in a provider series (intraday bar close or daily close)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(time: DateTime<Utc>, price: f64) -> Self {
        Self { time, price }
    }
}

/// Price direction against the previous close
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_change(change_percent: f64) -> Self {
        if change_percent >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn arrow(&self) -> char {
        match self {
            Direction::Up => '▲',
            Direction::Down => '▼',
        }
    }
}

/// Current price and percent change for one instrument in one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quote {
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
}

impl Quote {
    pub const MISSING: Quote = Quote {
        price: None,
        change_percent: None,
    };

    pub fn new(price: Option<f64>, change_percent: Option<f64>) -> Self {
        Self {
            price,
            change_percent,
        }
    }

    /// Both fields present, so the quote renders with price and arrow
    pub fn is_complete(&self) -> bool {
        self.price.is_some() && self.change_percent.is_some()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.change_percent.map(Direction::from_change)
    }
}

/// Colour class of a single character on the tape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTag {
    /// Instrument symbol and its decoration
    Label,
    Up,
    Down,
    /// "N/A" fragment for an instrument without usable data
    Missing,
    Separator,
}

impl From<Direction> for ColorTag {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => ColorTag::Up,
            Direction::Down => ColorTag::Down,
        }
    }
}
