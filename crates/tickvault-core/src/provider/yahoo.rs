//! Yahoo Finance adapter.
//!
//! Daily bars come from the v8 chart API; the trailing-P/E snapshot comes
//! from the v10 quoteSummary API. Yahoo has no official public API and the
//! response format can change without notice.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::domain::{DayDate, PriceBar, PriceSeries, Symbol};

use super::{MarketDataSource, SourceError};

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Blocking Yahoo Finance client.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| {
                SourceError::internal(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self { client })
    }

    fn chart_url(symbol: &Symbol, start: DayDate) -> String {
        let period1 = start.start_of_day_unix();
        let period2 = OffsetDateTime::now_utc().unix_timestamp();
        format!(
            "{CHART_BASE}/{symbol}?period1={period1}&period2={period2}&interval=1d",
            symbol = urlencoding::encode(symbol.as_str()),
        )
    }

    fn summary_url(symbol: &Symbol) -> String {
        format!(
            "{SUMMARY_BASE}/{symbol}?modules=summaryDetail",
            symbol = urlencoding::encode(symbol.as_str()),
        )
    }

    fn get_body(&self, url: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|error| SourceError::unavailable(format!("yahoo transport error: {error}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SourceError::rate_limited(
                "yahoo returned status 429 Too Many Requests",
            ));
        }
        // 404 carries a parseable error body ("Not Found" for unknown
        // symbols), which the chart parser turns into an empty series.
        if !status.is_success() && status.as_u16() != 404 {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {status}"
            )));
        }

        response
            .text()
            .map_err(|error| SourceError::unavailable(format!("yahoo transport error: {error}")))
    }

    /// Best-effort trailing-P/E snapshot; `None` whenever the summary
    /// endpoint cannot provide one.
    fn trailing_pe(&self, symbol: &Symbol) -> Option<f64> {
        let body = self.get_body(&Self::summary_url(symbol)).ok()?;
        parse_trailing_pe(&body)
    }
}

impl MarketDataSource for YahooProvider {
    fn fetch_series(&self, symbol: &Symbol, start: DayDate) -> Result<PriceSeries, SourceError> {
        let body = self.get_body(&Self::chart_url(symbol, start))?;
        let bars = parse_chart(&body, start)?;
        if bars.is_empty() {
            return Ok(PriceSeries::empty());
        }

        let pe = self.trailing_pe(symbol);
        let points = bars
            .into_iter()
            .map(|(date, bar)| {
                (
                    date,
                    PriceBar {
                        pe,
                        ..bar
                    },
                )
            })
            .collect();
        Ok(PriceSeries::new(points))
    }
}

// Yahoo v8 chart API response shapes.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

// Yahoo v10 quoteSummary response shapes (only what we read).
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryModules>>,
}

#[derive(Debug, Deserialize)]
struct SummaryModules {
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<SummaryDetail>,
}

#[derive(Debug, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
}

/// Yahoo wraps numeric values in an object with a `raw` field.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

/// Parse a chart response into per-day bars at or after `start`.
///
/// An unknown symbol ("Not Found") and a range with no data both produce an
/// empty map, not an error. Index entries with any missing OHLC value are
/// skipped. The P/E field is left unset; the caller bakes in the snapshot.
fn parse_chart(body: &str, start: DayDate) -> Result<BTreeMap<DayDate, PriceBar>, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::internal(format!("failed to parse yahoo chart: {error}")))?;

    let Some(result) = response.chart.result else {
        return match response.chart.error {
            Some(error) if error.code == "Not Found" => Ok(BTreeMap::new()),
            Some(error) => Err(SourceError::unavailable(format!(
                "yahoo chart API error: {}: {}",
                error.code, error.description
            ))),
            None => Err(SourceError::internal(
                "yahoo chart response has neither result nor error",
            )),
        };
    };

    let Some(data) = result.into_iter().next() else {
        return Ok(BTreeMap::new());
    };
    let Some(timestamps) = data.timestamp else {
        return Ok(BTreeMap::new());
    };
    let Some(quote) = data.indicators.quote.into_iter().next() else {
        return Ok(BTreeMap::new());
    };

    let mut bars = BTreeMap::new();
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = DayDate::from_unix_timestamp(ts)
            .map_err(|_| SourceError::internal(format!("yahoo returned invalid timestamp {ts}")))?;
        if date < start {
            continue;
        }

        let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) else {
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);

        let bar = PriceBar::new(*open, *close, *high, *low, volume, None)
            .map_err(|error| SourceError::internal(format!("yahoo returned bad bar: {error}")))?;
        bars.insert(date, bar);
    }

    Ok(bars)
}

fn parse_trailing_pe(body: &str) -> Option<f64> {
    let response: SummaryResponse = serde_json::from_str(body).ok()?;
    response
        .quote_summary
        .result?
        .into_iter()
        .next()?
        .summary_detail?
        .trailing_pe?
        .raw
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(input: &str) -> DayDate {
        DayDate::parse(input).expect("test date")
    }

    // 2023-01-03 / 2023-01-04 / 2023-01-05, UTC midnight.
    const CHART_FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1672704000, 1672790400, 1672876800],
                "indicators": {
                    "quote": [{
                        "open":   [130.28, 126.89, 127.13],
                        "high":   [130.90, 128.66, 127.77],
                        "low":    [124.17, 125.08, 124.76],
                        "close":  [125.07, 126.36, null],
                        "volume": [112117500, 89113600, 80962700]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_bars_and_skips_incomplete_entries() {
        let bars = parse_chart(CHART_FIXTURE, day("2023-01-01")).expect("must parse");
        assert_eq!(bars.len(), 2, "the null-close entry is skipped");

        let first = bars.get(&day("2023-01-03")).expect("first bar");
        assert_eq!(first.open, 130.28);
        assert_eq!(first.close, 125.07);
        assert_eq!(first.volume, 112_117_500);
        assert_eq!(first.pe, None);
    }

    #[test]
    fn filters_bars_before_the_requested_start() {
        let bars = parse_chart(CHART_FIXTURE, day("2023-01-04")).expect("must parse");
        assert_eq!(bars.keys().next(), Some(&day("2023-01-04")));
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn unknown_symbol_yields_empty_series_not_error() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;
        let bars = parse_chart(body, day("2023-01-01")).expect("must not error");
        assert!(bars.is_empty());
    }

    #[test]
    fn other_api_errors_propagate() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Internal Server Error", "description": "boom"}
            }
        }"#;
        let error = parse_chart(body, day("2023-01-01")).expect_err("must error");
        assert_eq!(error.kind(), super::super::SourceErrorKind::Unavailable);
    }

    #[test]
    fn missing_timestamps_mean_empty_range() {
        let body = r#"{
            "chart": {
                "result": [{"timestamp": null, "indicators": {"quote": [
                    {"open": [], "high": [], "low": [], "close": [], "volume": []}
                ]}}],
                "error": null
            }
        }"#;
        let bars = parse_chart(body, day("2023-01-01")).expect("must parse");
        assert!(bars.is_empty());
    }

    #[test]
    fn extracts_trailing_pe_raw_value() {
        let body = r#"{
            "quoteSummary": {
                "result": [{"summaryDetail": {"trailingPE": {"raw": 28.91, "fmt": "28.91"}}}],
                "error": null
            }
        }"#;
        assert_eq!(parse_trailing_pe(body), Some(28.91));
    }

    #[test]
    fn missing_pe_degrades_to_none() {
        let body = r#"{"quoteSummary": {"result": [{"summaryDetail": {}}], "error": null}}"#;
        assert_eq!(parse_trailing_pe(body), None);
        assert_eq!(parse_trailing_pe("not json"), None);
    }
}
