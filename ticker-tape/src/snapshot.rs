//! Quote snapshot builder
//!
//! Turns raw provider series into one [`Quote`] per configured instrument. Fails closed: a
//! provider error becomes an all-absent snapshot instead of an error.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, error, warn};

use crate::error::TickerError;
use crate::types::{Instrument, PricePoint, Quote};

/// Raw provider output: intraday and short daily history series keyed by instrument
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub intraday: HashMap<Instrument, Vec<PricePoint>>,
    pub history: HashMap<Instrument, Vec<PricePoint>>,
}

impl ProviderResponse {
    pub fn is_empty(&self) -> bool {
        self.intraday.is_empty() && self.history.is_empty()
    }
}

/// Whether a snapshot reflects provider data or the fail-closed fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Live,
    FailedClosed,
}

/// One quote per configured instrument, in configured order
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    quotes: IndexMap<Instrument, Quote>,
    status: SnapshotStatus,
}

impl QuoteSnapshot {
    /// Build a snapshot from a provider result. Never fails.
    pub fn build(
        instruments: &[Instrument],
        response: Result<ProviderResponse, TickerError>,
    ) -> Self {
        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_provider_failure() => {
                warn!("Quote fetch failed, all instruments marked missing: {}", e);
                return Self::failed_closed(instruments);
            }
            Err(e) => {
                error!("Provider returned a non-fetch error, failing closed: {}", e);
                return Self::failed_closed(instruments);
            }
        };

        let quotes = instruments
            .iter()
            .map(|instrument| {
                let price = response
                    .intraday
                    .get(instrument)
                    .and_then(|series| series.last())
                    .map(|point| point.price)
                    .filter(|price| price.is_finite());

                // Last daily bar is today, the one before it is the previous close
                let previous_close = response
                    .history
                    .get(instrument)
                    .filter(|series| series.len() >= 2)
                    .map(|series| series[series.len() - 2].price)
                    .filter(|price| price.is_finite());

                let change_percent = match (price, previous_close) {
                    (Some(current), Some(previous)) => percent_change(current, previous),
                    _ => None,
                };

                if price.is_none() || change_percent.is_none() {
                    debug!("No usable quote for {}", instrument);
                }

                (instrument.clone(), Quote::new(price, change_percent))
            })
            .collect();

        Self {
            quotes,
            status: SnapshotStatus::Live,
        }
    }

    /// All-absent snapshot used when the provider failed outright
    pub fn failed_closed(instruments: &[Instrument]) -> Self {
        Self {
            quotes: instruments
                .iter()
                .map(|instrument| (instrument.clone(), Quote::MISSING))
                .collect(),
            status: SnapshotStatus::FailedClosed,
        }
    }

    pub fn status(&self) -> SnapshotStatus {
        self.status
    }

    pub fn get(&self, instrument: &Instrument) -> Option<&Quote> {
        self.quotes.get(instrument)
    }

    /// Iterate quotes in configured instrument order
    pub fn iter(&self) -> impl Iterator<Item = (&Instrument, &Quote)> {
        self.quotes.iter()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Number of instruments with both price and change available
    pub fn complete_count(&self) -> usize {
        self.quotes.values().filter(|quote| quote.is_complete()).count()
    }
}

/// Percentage change from `previous` to `current`, absent when `previous` is zero
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}
