//! Test doubles shared by the coordinator and app tests
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::error::{Result, TickerError};
use crate::provider::QuoteProvider;
use crate::scroll::VisibleWindow;
use crate::sink::RenderSink;
use crate::snapshot::ProviderResponse;
use crate::types::{Instrument, PricePoint};

#[derive(Debug, Clone)]
pub enum Script {
    /// (symbol, current price, previous close)
    Prices(Vec<(Instrument, f64, f64)>),
    Fail,
    Panic,
}

impl Script {
    pub fn prices(entries: &[(&str, f64, f64)]) -> Self {
        Script::Prices(
            entries
                .iter()
                .map(|(symbol, price, previous)| (Instrument::from(*symbol), *price, *previous))
                .collect(),
        )
    }
}

/// Provider that replays a script, counting calls and optionally blocking until released
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: AtomicUsize,
    gate: Option<Notify>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Each fetch blocks until [`ScriptedProvider::release`] is called
    pub fn gated(script: Script) -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new(script)
        }
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, calls: usize) {
        while self.calls() < calls {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn fetch_quotes(&self, _instruments: &[Instrument]) -> Result<ProviderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let script = self.script.lock().unwrap().clone();
        match script {
            Script::Prices(entries) => {
                let now = Utc::now();
                let mut response = ProviderResponse::default();
                for (instrument, price, previous) in entries {
                    response
                        .intraday
                        .insert(instrument.clone(), vec![PricePoint::new(now, price)]);
                    response.history.insert(
                        instrument,
                        vec![PricePoint::new(now, previous), PricePoint::new(now, price)],
                    );
                }
                Ok(response)
            }
            Script::Fail => Err(TickerError::Chart {
                code: "Internal Server Error".to_string(),
                description: "scripted failure".to_string(),
            }),
            Script::Panic => panic!("scripted provider panic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Window(String),
    Placeholder(String),
}

/// Sink that records every frame as plain text
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<Frame>,
    pub windows: Vec<VisibleWindow>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl RenderSink for RecordingSink {
    fn render(&mut self, window: &VisibleWindow) -> Result<()> {
        self.frames.push(Frame::Window(window.text()));
        self.windows.push(window.clone());
        Ok(())
    }

    fn render_placeholder(&mut self, text: &str) -> Result<()> {
        self.frames.push(Frame::Placeholder(text.to_string()));
        Ok(())
    }
}
