//! Market data providers
//!
//! [`YahooProvider`] pulls intraday 1m closes and a two-day daily history per symbol from the
//! Yahoo Finance v8 chart endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, TickerError};
use crate::snapshot::ProviderResponse;
use crate::types::{Instrument, PricePoint};

/// Default chart endpoint, overridable with `YAHOO_BASE_URL`
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) ticker-tape/0.1";

/// Chart requests in flight at once, keeps a 50 symbol refresh under Yahoo's throttling
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Source of per-instrument price series
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quotes(&self, instruments: &[Instrument]) -> Result<ProviderResponse>;
}

/// Range/interval pair of a chart request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSpan {
    pub range: &'static str,
    pub interval: &'static str,
}

/// Today's one-minute bars
pub const INTRADAY: ChartSpan = ChartSpan {
    range: "1d",
    interval: "1m",
};

/// Last two daily bars, the first being the previous close
pub const DAILY_HISTORY: ChartSpan = ChartSpan {
    range: "2d",
    interval: "1d",
};

/// Yahoo Finance chart API client
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, instrument: &Instrument, span: ChartSpan) -> String {
        format!(
            "{}/{}?range={}&interval={}",
            self.base_url, instrument, span.range, span.interval
        )
    }

    /// Fetch one chart series
    pub async fn fetch_series(
        &self,
        instrument: &Instrument,
        span: ChartSpan,
    ) -> Result<Vec<PricePoint>> {
        let url = self.chart_url(instrument, span);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(TickerError::Status {
                symbol: instrument.to_string(),
                status: response.status(),
            });
        }

        let body = response.text().await?;
        parse_chart(&body)
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn fetch_quotes(&self, instruments: &[Instrument]) -> Result<ProviderResponse> {
        let requests: Vec<(&Instrument, ChartSpan)> = instruments
            .iter()
            .flat_map(|instrument| [INTRADAY, DAILY_HISTORY].map(move |span| (instrument, span)))
            .collect();
        let requests: Vec<_> = requests
            .into_iter()
            .map(|(instrument, span)| async move {
                let series = self.fetch_series(instrument, span).await;
                (instrument.clone(), span, series)
            })
            .collect();
        let outcomes = stream::iter(requests)
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .collect::<Vec<_>>()
            .await;

        aggregate_series(outcomes)
    }
}

/// Fold per-request outcomes into one response
///
/// A failed request only leaves its own series missing. When every request failed the provider
/// is down rather than missing a few symbols, and the first error is returned.
pub fn aggregate_series(
    outcomes: Vec<(Instrument, ChartSpan, Result<Vec<PricePoint>>)>,
) -> Result<ProviderResponse> {
    let mut response = ProviderResponse::default();
    let mut first_error = None;
    let mut succeeded = 0usize;

    for (instrument, span, series) in outcomes {
        match series {
            Ok(points) => {
                succeeded += 1;
                let target = if span == INTRADAY {
                    &mut response.intraday
                } else {
                    &mut response.history
                };
                target.insert(instrument, points);
            }
            Err(e) => {
                warn!("{} {} chart request failed: {}", instrument, span.range, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if succeeded == 0 => Err(e),
        _ => Ok(response),
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChartErrorBody {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Parse a chart payload into chronologically ordered closes, skipping null bars
pub fn parse_chart(body: &str) -> Result<Vec<PricePoint>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        return Err(TickerError::Chart {
            code: error.code,
            description: error.description,
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    Ok(result
        .timestamp
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let time = DateTime::from_timestamp(ts, 0)?;
            Some(PricePoint::new(time, close?))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTRADAY_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "regularMarketPrice": 190.5},
                "timestamp": [1700000000, 1700000060, 1700000120],
                "indicators": {"quote": [{"close": [190.1, null, 190.5], "open": [190.0, 190.2, 190.3]}]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_skips_null_closes() {
        let points = parse_chart(INTRADAY_BODY).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, 190.1);
        assert_eq!(points[1].price, 190.5);
        assert_eq!(points[1].time.timestamp(), 1700000120);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse_chart(body) {
            Err(TickerError::Chart { code, .. }) => assert_eq!(code, "Not Found"),
            other => panic!("expected chart error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chart_without_bars() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_malformed() {
        assert!(matches!(parse_chart("<html>"), Err(TickerError::Parse(_))));
    }

    #[test]
    fn test_aggregate_series() {
        fn bars(prices: &[f64]) -> Result<Vec<PricePoint>> {
            Ok(prices
                .iter()
                .enumerate()
                .map(|(i, &price)| {
                    PricePoint::new(DateTime::from_timestamp(1700000000 + i as i64, 0).unwrap(), price)
                })
                .collect())
        }

        fn timeout() -> Result<Vec<PricePoint>> {
            Err(TickerError::Timeout(Duration::from_secs(10)))
        }

        fn not_found() -> Result<Vec<PricePoint>> {
            Err(TickerError::Chart {
                code: "Not Found".to_string(),
                description: "No data found".to_string(),
            })
        }

        struct TestCase {
            input: Vec<(Instrument, ChartSpan, Result<Vec<PricePoint>>)>,
            expected_intraday: Vec<&'static str>,
            expected_history: Vec<&'static str>,
            expected_err: bool,
        }

        let aaa = Instrument::from("AAA");
        let bbb = Instrument::from("BBB");

        let tests = vec![
            TestCase {
                // TC0: every request succeeds
                input: vec![
                    (aaa.clone(), INTRADAY, bars(&[100.0])),
                    (aaa.clone(), DAILY_HISTORY, bars(&[90.0, 100.0])),
                ],
                expected_intraday: vec!["AAA"],
                expected_history: vec!["AAA"],
                expected_err: false,
            },
            TestCase {
                // TC1: one instrument failing leaves only its series missing
                input: vec![
                    (aaa.clone(), INTRADAY, bars(&[100.0])),
                    (aaa.clone(), DAILY_HISTORY, bars(&[90.0, 100.0])),
                    (bbb.clone(), INTRADAY, timeout()),
                    (bbb.clone(), DAILY_HISTORY, not_found()),
                ],
                expected_intraday: vec!["AAA"],
                expected_history: vec!["AAA"],
                expected_err: false,
            },
            TestCase {
                // TC2: one span failing keeps the other
                input: vec![
                    (bbb.clone(), INTRADAY, bars(&[50.0])),
                    (bbb.clone(), DAILY_HISTORY, timeout()),
                ],
                expected_intraday: vec!["BBB"],
                expected_history: vec![],
                expected_err: false,
            },
            TestCase {
                // TC3: every request failing is a provider failure
                input: vec![
                    (aaa.clone(), INTRADAY, timeout()),
                    (aaa.clone(), DAILY_HISTORY, not_found()),
                ],
                expected_intraday: vec![],
                expected_history: vec![],
                expected_err: true,
            },
            TestCase {
                // TC4: nothing requested
                input: vec![],
                expected_intraday: vec![],
                expected_history: vec![],
                expected_err: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = aggregate_series(test.input);
            match (actual, test.expected_err) {
                (Ok(response), false) => {
                    let mut intraday: Vec<&str> =
                        response.intraday.keys().map(|i| i.as_str()).collect();
                    let mut history: Vec<&str> =
                        response.history.keys().map(|i| i.as_str()).collect();
                    intraday.sort();
                    history.sort();
                    assert_eq!(intraday, test.expected_intraday, "TC{} intraday", index);
                    assert_eq!(history, test.expected_history, "TC{} history", index);
                }
                (Err(e), true) => {
                    assert!(matches!(e, TickerError::Timeout(_)), "TC{} first error", index);
                }
                (actual, _) => panic!("TC{} failed: {:?}", index, actual.map(|r| r.is_empty())),
            }
        }
    }

    #[test]
    fn test_chart_url() {
        let provider =
            YahooProvider::new("https://example.test/v8/finance/chart/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            provider.chart_url(&Instrument::from("BRK-B"), DAILY_HISTORY),
            "https://example.test/v8/finance/chart/BRK-B?range=2d&interval=1d"
        );
    }
}
