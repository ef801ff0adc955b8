//! Refresh coordinator
//!
//! Owns the single-flight provider call and the published display buffer. A refresh runs as one
//! tokio task; the UI loop polls it without blocking and swaps the new buffer in wholesale when
//! it completes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::compositor::{compose, DisplayBuffer};
use crate::error::TickerError;
use crate::provider::QuoteProvider;
use crate::snapshot::{QuoteSnapshot, SnapshotStatus};
use crate::types::Instrument;

pub struct RefreshCoordinator {
    provider: Arc<dyn QuoteProvider>,
    instruments: Arc<[Instrument]>,
    fetch_timeout: Duration,
    /// Outstanding refresh; `Some` is the "refresh in flight" flag
    in_flight: Option<JoinHandle<QuoteSnapshot>>,
    buffer: Arc<DisplayBuffer>,
    last_refresh: Option<DateTime<Utc>>,
    last_status: Option<SnapshotStatus>,
}

impl RefreshCoordinator {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        instruments: impl Into<Arc<[Instrument]>>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            instruments: instruments.into(),
            fetch_timeout,
            in_flight: None,
            buffer: Arc::new(DisplayBuffer::empty()),
            last_refresh: None,
            last_status: None,
        }
    }

    /// Currently published buffer (empty until the first refresh completes)
    pub fn buffer(&self) -> &Arc<DisplayBuffer> {
        &self.buffer
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Time of the last refresh that published live data
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    pub fn last_status(&self) -> Option<SnapshotStatus> {
        self.last_status
    }

    /// Dispatch a refresh unless one is already running
    ///
    /// Returns `false` when the request was shed. The in-flight refresh is never cancelled.
    pub fn request_refresh(&mut self) -> bool {
        if self.in_flight.is_some() {
            debug!("Refresh already in flight, request shed");
            return false;
        }

        let provider = Arc::clone(&self.provider);
        let instruments = Arc::clone(&self.instruments);
        let fetch_timeout = self.fetch_timeout;

        debug!("Dispatching refresh for {} instruments", instruments.len());
        self.in_flight = Some(tokio::spawn(async move {
            let response =
                match tokio::time::timeout(fetch_timeout, provider.fetch_quotes(&instruments)).await {
                    Ok(response) => response,
                    Err(_) => Err(TickerError::Timeout(fetch_timeout)),
                };
            QuoteSnapshot::build(&instruments, response)
        }));
        true
    }

    /// Publish the finished refresh, if any, without blocking
    pub fn poll_completion(&mut self) -> Option<Arc<DisplayBuffer>> {
        let handle = self.in_flight.as_mut()?;
        if !handle.is_finished() {
            return None;
        }
        let joined = handle.now_or_never()?;
        self.in_flight = None;
        Some(self.complete(joined))
    }

    /// Wait for the in-flight refresh and publish it; `None` when nothing is in flight
    pub async fn wait_for_completion(&mut self) -> Option<Arc<DisplayBuffer>> {
        let handle = self.in_flight.as_mut()?;
        let joined = handle.await;
        self.in_flight = None;
        Some(self.complete(joined))
    }

    fn complete(&mut self, joined: Result<QuoteSnapshot, JoinError>) -> Arc<DisplayBuffer> {
        let snapshot = joined.unwrap_or_else(|e| {
            QuoteSnapshot::build(&self.instruments, Err(TickerError::Worker(e.to_string())))
        });
        self.publish(snapshot)
    }

    fn publish(&mut self, snapshot: QuoteSnapshot) -> Arc<DisplayBuffer> {
        self.last_status = Some(snapshot.status());

        match snapshot.status() {
            SnapshotStatus::FailedClosed if !self.buffer.is_empty() => {
                warn!("Refresh failed, keeping previous tape");
            }
            status => {
                self.buffer = Arc::new(compose(&snapshot));
                if status == SnapshotStatus::Live {
                    self.last_refresh = Some(Utc::now());
                }
                info!(
                    "Published tape: {}/{} quotes, {} chars",
                    snapshot.complete_count(),
                    snapshot.len(),
                    self.buffer.len()
                );
            }
        }

        Arc::clone(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedProvider};
    use crate::types::ColorTag;

    fn coordinator(provider: &Arc<ScriptedProvider>, symbols: &[&str]) -> RefreshCoordinator {
        let instruments: Vec<Instrument> = symbols.iter().copied().map(Instrument::from).collect();
        RefreshCoordinator::new(
            Arc::clone(provider) as Arc<dyn QuoteProvider>,
            instruments,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_single_flight_sheds_overlapping_requests() {
        let provider = Arc::new(ScriptedProvider::gated(Script::prices(&[("AAA", 100.0, 90.0)])));
        let mut coordinator = coordinator(&provider, &["AAA"]);

        assert!(coordinator.request_refresh());
        provider.wait_for_calls(1).await;

        for _ in 0..5 {
            assert!(!coordinator.request_refresh());
            assert!(coordinator.poll_completion().is_none());
            tokio::task::yield_now().await;
        }
        assert_eq!(provider.calls(), 1);
        assert!(coordinator.is_in_flight());

        provider.release();
        let buffer = coordinator.wait_for_completion().await.unwrap();
        assert_eq!(buffer.text(), " AAA: $100.00 ▲11.11% ");
        assert!(!coordinator.is_in_flight());

        // Next cycle may dispatch again
        assert!(coordinator.request_refresh());
        provider.release();
        coordinator.wait_for_completion().await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_poll_completion_publishes_buffer() {
        let provider = Arc::new(ScriptedProvider::new(Script::prices(&[
            ("AAA", 100.0, 100.0 / 1.015),
        ])));
        let mut coordinator = coordinator(&provider, &["AAA", "BBB"]);
        assert!(coordinator.buffer().is_empty());

        coordinator.request_refresh();
        let buffer = loop {
            if let Some(buffer) = coordinator.poll_completion() {
                break buffer;
            }
            tokio::task::yield_now().await;
        };

        assert_eq!(buffer.text(), " AAA: $100.00 ▲1.50%   |   BBB: N/A ");
        assert!(Arc::ptr_eq(&buffer, coordinator.buffer()));
        assert_eq!(coordinator.last_status(), Some(SnapshotStatus::Live));
        assert!(coordinator.last_refresh().is_some());
    }

    #[tokio::test]
    async fn test_failure_without_prior_buffer_publishes_missing_tape() {
        let provider = Arc::new(ScriptedProvider::new(Script::Fail));
        let mut coordinator = coordinator(&provider, &["AAA", "BBB"]);

        coordinator.request_refresh();
        let buffer = coordinator.wait_for_completion().await.unwrap();

        assert_eq!(buffer.text(), " AAA: N/A   |   BBB: N/A ");
        assert!(buffer
            .colors()
            .iter()
            .all(|tag| matches!(tag, ColorTag::Missing | ColorTag::Separator)));
        assert_eq!(coordinator.last_status(), Some(SnapshotStatus::FailedClosed));
        assert!(coordinator.last_refresh().is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_buffer() {
        let provider = Arc::new(ScriptedProvider::new(Script::prices(&[("AAA", 95.0, 100.0)])));
        let mut coordinator = coordinator(&provider, &["AAA"]);

        coordinator.request_refresh();
        let first = coordinator.wait_for_completion().await.unwrap();

        provider.set_script(Script::Fail);
        coordinator.request_refresh();
        let second = coordinator.wait_for_completion().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.text(), " AAA: $95.00 ▼5.00% ");
        assert_eq!(coordinator.last_status(), Some(SnapshotStatus::FailedClosed));
    }

    #[tokio::test]
    async fn test_worker_panic_fails_closed() {
        let provider = Arc::new(ScriptedProvider::new(Script::Panic));
        let mut coordinator = coordinator(&provider, &["AAA"]);

        coordinator.request_refresh();
        let buffer = coordinator.wait_for_completion().await.unwrap();

        assert_eq!(buffer.text(), " AAA: N/A ");
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_fetch_timeout_fails_closed() {
        // Gated and never released
        let provider = Arc::new(ScriptedProvider::gated(Script::Fail));
        let instruments = vec![Instrument::from("AAA")];
        let mut coordinator = RefreshCoordinator::new(
            Arc::clone(&provider) as Arc<dyn QuoteProvider>,
            instruments,
            Duration::from_millis(20),
        );

        coordinator.request_refresh();
        let buffer = coordinator.wait_for_completion().await.unwrap();

        assert_eq!(buffer.text(), " AAA: N/A ");
        assert_eq!(coordinator.last_status(), Some(SnapshotStatus::FailedClosed));
    }

    #[tokio::test]
    async fn test_wait_without_refresh_is_none() {
        let provider = Arc::new(ScriptedProvider::new(Script::Fail));
        let mut coordinator = coordinator(&provider, &["AAA"]);
        assert!(coordinator.wait_for_completion().await.is_none());
        assert!(coordinator.poll_completion().is_none());
        assert_eq!(provider.calls(), 0);
    }
}
