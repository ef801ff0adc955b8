//! Ticker application state
//!
//! Ties the scroll engine to the refresh coordinator. Everything here runs on the UI loop; only
//! the provider call itself runs on a worker task.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::{RefreshPolicy, TickerConfig};
use crate::error::Result;
use crate::provider::QuoteProvider;
use crate::refresh::RefreshCoordinator;
use crate::scroll::ScrollEngine;
use crate::sink::{RenderSink, TickerStatus};

/// Shown until the first buffer is published
pub const LOADING_PLACEHOLDER: &str = "Loading data...";

pub struct TickerApp {
    engine: ScrollEngine,
    coordinator: RefreshCoordinator,
    refresh_policy: RefreshPolicy,
    last_dispatch: Option<Instant>,
}

impl TickerApp {
    pub fn new(config: &TickerConfig, provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            engine: ScrollEngine::new(config.visible_width, config.scroll_step),
            coordinator: RefreshCoordinator::new(
                provider,
                config.instruments.clone(),
                config.fetch_timeout,
            ),
            refresh_policy: config.refresh_policy,
            last_dispatch: None,
        }
    }

    pub fn engine(&self) -> &ScrollEngine {
        &self.engine
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Dispatch the startup refresh
    pub fn start(&mut self) -> bool {
        self.dispatch()
    }

    /// Manual refresh request, still subject to single-flight
    pub fn force_refresh(&mut self) -> bool {
        self.dispatch()
    }

    fn dispatch(&mut self) -> bool {
        let dispatched = self.coordinator.request_refresh();
        if dispatched {
            self.last_dispatch = Some(Instant::now());
        }
        dispatched
    }

    fn refresh_due(&self, start_cycle: bool) -> bool {
        match self.refresh_policy {
            RefreshPolicy::ScrollCycle => start_cycle,
            RefreshPolicy::Interval(every) => {
                !self.coordinator.is_in_flight()
                    && self.last_dispatch.is_none_or(|t| t.elapsed() >= every)
            }
        }
    }

    /// One animation step: adopt a finished refresh, scroll, render, maybe start a new cycle
    pub fn on_tick<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.coordinator.poll_completion();

        let tick = self
            .engine
            .tick(self.coordinator.buffer(), self.coordinator.is_in_flight());

        if self.refresh_due(tick.start_cycle) {
            debug!("Starting refresh cycle after lap {}", self.engine.laps());
            self.dispatch();
        }

        sink.update_status(&self.status());
        match &tick.window {
            Some(window) => sink.render(window),
            None => sink.render_placeholder(LOADING_PLACEHOLDER),
        }
    }

    /// Wait for the in-flight refresh to publish; `false` when none was running
    pub async fn wait_for_refresh(&mut self) -> bool {
        self.coordinator.wait_for_completion().await.is_some()
    }

    pub fn status(&self) -> TickerStatus {
        TickerStatus {
            instruments: self.coordinator.instruments().len(),
            laps: self.engine.laps(),
            refreshing: self.coordinator.is_in_flight(),
            last_refresh: self.coordinator.last_refresh(),
            last_status: self.coordinator.last_status(),
        }
    }
}
