//! Reconciliation engine.
//!
//! Per tracked key, decides what date range is missing from the store,
//! fetches only that delta from the provider, and merges it. Three policies:
//!
//! - **full capture**: fetch everything from the configured start date;
//! - **incremental append**: fetch from the day after the stored latest
//!   date, never touching earlier rows;
//! - **destructive refresh**: drop the single latest row and refetch from
//!   that same date, because the most recent trading day may have been
//!   provisional when first captured.
//!
//! Gap detection is a separate diagnostic: it reports every calendar-day
//! discontinuity, including weekends and holidays where no market data will
//! ever exist. Callers wanting trading-calendar gaps must filter themselves.

use thiserror::Error;

use tickvault_store::{Dataset, StockRow, Store, StoreError, YieldRow};

use crate::config::{TrackedSymbol, TrackerConfig};
use crate::domain::{DayDate, PriceSeries, Symbol};
use crate::provider::{resolve_nation_proxy, MarketDataSource, SourceError};
use crate::ValidationError;

/// Errors from a reconciliation run.
///
/// A provider or store error aborts the remaining keys of the current run;
/// rows already upserted for earlier keys stay committed. No transaction
/// spans the whole batch.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How `update` treats the stored latest row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Fetch strictly after the latest stored date.
    Append,
    /// Delete the latest stored row and refetch from that date.
    Overwrite,
}

/// Outcome for one tracked key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReport {
    pub key: String,
    pub rows_upserted: usize,
}

/// Drives fetch-and-merge for every tracked key against one store.
pub struct Reconciler<'a> {
    provider: &'a dyn MarketDataSource,
    store: &'a Store,
}

impl<'a> Reconciler<'a> {
    pub fn new(provider: &'a dyn MarketDataSource, store: &'a Store) -> Self {
        Self { provider, store }
    }

    /// Full capture for one stock entry from its configured start date.
    pub fn capture_stock(&self, entry: &TrackedSymbol) -> Result<usize, ReconError> {
        self.capture_stock_from(entry, entry.start_date)
    }

    /// Full capture for one nation entry from its configured start date.
    pub fn capture_nation(&self, entry: &TrackedSymbol) -> Result<usize, ReconError> {
        self.capture_nation_from(entry, entry.start_date)
    }

    /// Full capture across every tracked key (the `download` operation).
    pub fn capture_all(&self, config: &TrackerConfig) -> Result<Vec<KeyReport>, ReconError> {
        let mut reports = Vec::new();
        for entry in &config.stocks {
            let rows_upserted = self.capture_stock(entry)?;
            reports.push(KeyReport {
                key: entry.name.clone(),
                rows_upserted,
            });
        }
        for entry in &config.national_debt {
            let rows_upserted = self.capture_nation(entry)?;
            reports.push(KeyReport {
                key: entry.name.clone(),
                rows_upserted,
            });
        }
        Ok(reports)
    }

    /// Update across every tracked key (the `update` operation).
    pub fn update_all(
        &self,
        config: &TrackerConfig,
        mode: RefreshMode,
    ) -> Result<Vec<KeyReport>, ReconError> {
        let mut reports = Vec::new();
        for entry in &config.stocks {
            let rows_upserted = self.update_stock(entry, mode)?;
            reports.push(KeyReport {
                key: entry.name.clone(),
                rows_upserted,
            });
        }
        for entry in &config.national_debt {
            let rows_upserted = self.update_nation(entry, mode)?;
            reports.push(KeyReport {
                key: entry.name.clone(),
                rows_upserted,
            });
        }
        Ok(reports)
    }

    /// Reconcile one stock entry under the given refresh mode.
    ///
    /// A key with no stored rows behaves as full capture from the configured
    /// start date under either mode.
    pub fn update_stock(
        &self,
        entry: &TrackedSymbol,
        mode: RefreshMode,
    ) -> Result<usize, ReconError> {
        match self.store.latest_date(Dataset::Stocks, &entry.name)? {
            None => self.capture_stock_from(entry, entry.start_date),
            Some(latest_iso) => {
                let latest = DayDate::parse(&latest_iso)?;
                match mode {
                    RefreshMode::Append => self.capture_stock_from(entry, latest.next_day()?),
                    RefreshMode::Overwrite => {
                        self.store
                            .delete_row(Dataset::Stocks, &entry.name, &latest_iso)?;
                        self.capture_stock_from(entry, latest)
                    }
                }
            }
        }
    }

    /// Reconcile one nation entry under the given refresh mode.
    pub fn update_nation(
        &self,
        entry: &TrackedSymbol,
        mode: RefreshMode,
    ) -> Result<usize, ReconError> {
        match self.store.latest_date(Dataset::NationalDebt, &entry.name)? {
            None => self.capture_nation_from(entry, entry.start_date),
            Some(latest_iso) => {
                let latest = DayDate::parse(&latest_iso)?;
                match mode {
                    RefreshMode::Append => self.capture_nation_from(entry, latest.next_day()?),
                    RefreshMode::Overwrite => {
                        self.store
                            .delete_row(Dataset::NationalDebt, &entry.name, &latest_iso)?;
                        self.capture_nation_from(entry, latest)
                    }
                }
            }
        }
    }

    fn capture_stock_from(&self, entry: &TrackedSymbol, start: DayDate) -> Result<usize, ReconError> {
        let symbol = Symbol::parse(&entry.name)?;
        let series = self.provider.fetch_series(&symbol, start)?;
        let rows = stock_rows(&entry.name, &series);
        Ok(self.store.upsert_stock_rows(&rows)?)
    }

    fn capture_nation_from(
        &self,
        entry: &TrackedSymbol,
        start: DayDate,
    ) -> Result<usize, ReconError> {
        let proxy = resolve_nation_proxy(&entry.name);
        let series = self.provider.fetch_series(&proxy, start)?;
        let rows = yield_rows(&entry.name, &series);
        Ok(self.store.upsert_yield_rows(&rows)?)
    }
}

/// Calendar-day gaps in the stored dates for one key. Needs no provider;
/// this is a pure diagnostic over what the store already holds.
pub fn scan_gaps(
    store: &Store,
    dataset: Dataset,
    key: &str,
) -> Result<Vec<(DayDate, DayDate)>, ReconError> {
    let stored = store.dates_ascending(dataset, key)?;
    let dates = stored
        .iter()
        .map(|date| DayDate::parse(date))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(missing_ranges(&dates)?)
}

/// Missing calendar-day ranges between consecutive stored dates.
///
/// `dates` must be ascending. Every gap wider than one day yields
/// `(prev + 1, next - 1)`, weekends and holidays included; the store has
/// no trading calendar.
pub fn missing_ranges(dates: &[DayDate]) -> Result<Vec<(DayDate, DayDate)>, ValidationError> {
    let mut ranges = Vec::new();
    for pair in dates.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        if current.days_until(next) > 1 {
            ranges.push((current.next_day()?, next.previous_day()?));
        }
    }
    Ok(ranges)
}

fn stock_rows(key: &str, series: &PriceSeries) -> Vec<StockRow> {
    series
        .points
        .iter()
        .map(|(date, bar)| StockRow {
            symbol: key.to_owned(),
            date: date.format_iso(),
            open: bar.open,
            close: bar.close,
            high: bar.high,
            low: bar.low,
            volume: bar.volume,
            pe: bar.pe,
        })
        .collect()
}

/// Nation rows persist each bar's close as the yield, keyed by the nation
/// name exactly as configured (not the proxy instrument).
fn yield_rows(nation: &str, series: &PriceSeries) -> Vec<YieldRow> {
    series
        .points
        .iter()
        .map(|(date, bar)| YieldRow {
            nation: nation.to_owned(),
            date: date.format_iso(),
            yield_value: bar.close,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap, HashSet};

    use tempfile::tempdir;

    use crate::domain::PriceBar;

    use super::*;

    fn day(input: &str) -> DayDate {
        DayDate::parse(input).expect("test date")
    }

    fn bar(close: f64) -> PriceBar {
        PriceBar::new(close - 1.0, close, close + 0.5, close - 1.5, 1_000, Some(25.0))
            .expect("valid bar")
    }

    fn entry(name: &str, start: &str) -> TrackedSymbol {
        TrackedSymbol {
            name: name.to_string(),
            start_date: day(start),
            end_date: None,
        }
    }

    /// Provider stub holding a fixed per-symbol history. `fetch_series`
    /// returns the slice at or after `start` and records every call.
    struct ScriptedProvider {
        history: HashMap<String, BTreeMap<DayDate, PriceBar>>,
        failing: HashSet<String>,
        calls: RefCell<Vec<(String, DayDate)>>,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                history: HashMap::new(),
                failing: HashSet::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn with_bars(mut self, symbol: &str, bars: &[(&str, f64)]) -> Self {
            let points = bars
                .iter()
                .map(|(date, close)| (day(date), bar(*close)))
                .collect();
            self.history.insert(symbol.to_string(), points);
            self
        }

        fn failing_for(mut self, symbol: &str) -> Self {
            self.failing.insert(symbol.to_string());
            self
        }

        fn calls(&self) -> Vec<(String, DayDate)> {
            self.calls.borrow().clone()
        }
    }

    impl MarketDataSource for ScriptedProvider {
        fn fetch_series(
            &self,
            symbol: &Symbol,
            start: DayDate,
        ) -> Result<PriceSeries, SourceError> {
            self.calls
                .borrow_mut()
                .push((symbol.as_str().to_string(), start));
            if self.failing.contains(symbol.as_str()) {
                return Err(SourceError::unavailable("scripted provider outage"));
            }
            let points = self
                .history
                .get(symbol.as_str())
                .map(|history| history.range(start..).map(|(d, b)| (*d, *b)).collect())
                .unwrap_or_default();
            Ok(PriceSeries::new(points))
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> Store {
        Store::open(dir.path().join("series.duckdb")).expect("store open")
    }

    #[test]
    fn empty_store_full_capture_sets_latest_to_provider_max() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider = ScriptedProvider::new().with_bars(
            "AAPL",
            &[("2023-01-03", 125.0), ("2023-01-04", 126.0)],
        );
        let recon = Reconciler::new(&provider, &store);

        let rows = recon
            .capture_stock(&entry("AAPL", "2023-01-01"))
            .expect("capture");

        assert_eq!(rows, 2);
        assert_eq!(
            store
                .latest_date(Dataset::Stocks, "AAPL")
                .expect("latest"),
            Some(String::from("2023-01-04"))
        );
    }

    #[test]
    fn unknown_symbol_full_capture_is_a_no_op_not_an_error() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider = ScriptedProvider::new();
        let recon = Reconciler::new(&provider, &store);

        let rows = recon
            .capture_stock(&entry("NOSUCH", "2023-01-01"))
            .expect("empty series is valid output");

        assert_eq!(rows, 0);
        assert_eq!(
            store.latest_date(Dataset::Stocks, "NOSUCH").expect("latest"),
            None
        );
    }

    #[test]
    fn incremental_append_fetches_from_latest_plus_one_day() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider = ScriptedProvider::new().with_bars(
            "AAPL",
            &[
                ("2023-01-03", 125.0),
                ("2023-01-04", 126.0),
                ("2023-01-05", 127.0),
            ],
        );
        let recon = Reconciler::new(&provider, &store);
        let tracked = entry("AAPL", "2023-01-01");

        recon.capture_stock(&tracked).expect("initial capture");
        recon
            .update_stock(&tracked, RefreshMode::Append)
            .expect("append");

        let calls = provider.calls();
        assert_eq!(calls[0], (String::from("AAPL"), day("2023-01-01")));
        assert_eq!(calls[1], (String::from("AAPL"), day("2023-01-06")));
    }

    #[test]
    fn incremental_append_on_empty_key_behaves_as_full_capture() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider =
            ScriptedProvider::new().with_bars("AAPL", &[("2023-01-03", 125.0)]);
        let recon = Reconciler::new(&provider, &store);

        let rows = recon
            .update_stock(&entry("AAPL", "2023-01-01"), RefreshMode::Append)
            .expect("append");

        assert_eq!(rows, 1);
        assert_eq!(provider.calls()[0].1, day("2023-01-01"));
    }

    #[test]
    fn incremental_append_is_idempotent_when_no_new_data() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider = ScriptedProvider::new().with_bars(
            "AAPL",
            &[("2023-01-03", 125.0), ("2023-01-04", 126.0)],
        );
        let recon = Reconciler::new(&provider, &store);
        let tracked = entry("AAPL", "2023-01-01");

        recon
            .update_stock(&tracked, RefreshMode::Append)
            .expect("first run");
        let after_first = store
            .dates_ascending(Dataset::Stocks, "AAPL")
            .expect("dates");

        let rows = recon
            .update_stock(&tracked, RefreshMode::Append)
            .expect("second run");
        let after_second = store
            .dates_ascending(Dataset::Stocks, "AAPL")
            .expect("dates");

        assert_eq!(rows, 0);
        assert_eq!(after_first, after_second);
        let stored = store
            .stock_row("AAPL", "2023-01-04")
            .expect("read")
            .expect("row present");
        assert_eq!(stored.close, 126.0);
    }

    #[test]
    fn incremental_append_never_touches_rows_before_the_latest_date() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);

        {
            let provider = ScriptedProvider::new().with_bars(
                "AAPL",
                &[("2023-01-03", 125.0), ("2023-01-04", 126.0)],
            );
            Reconciler::new(&provider, &store)
                .capture_stock(&entry("AAPL", "2023-01-01"))
                .expect("seed");
        }

        // Provider later revises history for already-stored dates and grows
        // by one day; append must pick up only the new day.
        let provider = ScriptedProvider::new().with_bars(
            "AAPL",
            &[
                ("2023-01-03", 999.0),
                ("2023-01-04", 999.0),
                ("2023-01-05", 127.0),
            ],
        );
        let rows = Reconciler::new(&provider, &store)
            .update_stock(&entry("AAPL", "2023-01-01"), RefreshMode::Append)
            .expect("append");

        assert_eq!(rows, 1);
        let untouched = store
            .stock_row("AAPL", "2023-01-03")
            .expect("read")
            .expect("row present");
        assert_eq!(untouched.close, 125.0);
        let appended = store
            .stock_row("AAPL", "2023-01-05")
            .expect("read")
            .expect("row present");
        assert_eq!(appended.close, 127.0);
    }

    #[test]
    fn destructive_refresh_replaces_only_the_prior_latest_row() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);

        {
            let provider = ScriptedProvider::new().with_bars(
                "AAPL",
                &[("2023-01-03", 125.0), ("2023-01-04", 126.0)],
            );
            Reconciler::new(&provider, &store)
                .capture_stock(&entry("AAPL", "2023-01-01"))
                .expect("seed");
        }

        // The provider revised the last trading day's figures.
        let provider = ScriptedProvider::new().with_bars(
            "AAPL",
            &[
                ("2023-01-03", 999.0),
                ("2023-01-04", 126.5),
                ("2023-01-05", 127.0),
            ],
        );
        Reconciler::new(&provider, &store)
            .update_stock(&entry("AAPL", "2023-01-01"), RefreshMode::Overwrite)
            .expect("overwrite");

        assert_eq!(provider.calls()[0].1, day("2023-01-04"), "refetch from the deleted date");
        let before = store
            .stock_row("AAPL", "2023-01-03")
            .expect("read")
            .expect("row present");
        assert_eq!(before.close, 125.0, "rows before the latest date are untouched");
        let refreshed = store
            .stock_row("AAPL", "2023-01-04")
            .expect("read")
            .expect("row present");
        assert_eq!(refreshed.close, 126.5);
        assert_eq!(store.row_count(Dataset::Stocks, "AAPL").expect("count"), 3);
    }

    #[test]
    fn destructive_refresh_on_empty_key_behaves_as_full_capture() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider =
            ScriptedProvider::new().with_bars("AAPL", &[("2023-01-03", 125.0)]);
        let recon = Reconciler::new(&provider, &store);

        let rows = recon
            .update_stock(&entry("AAPL", "2023-01-01"), RefreshMode::Overwrite)
            .expect("overwrite");

        assert_eq!(rows, 1);
        assert_eq!(provider.calls()[0].1, day("2023-01-01"));
    }

    #[test]
    fn nation_update_persists_close_as_yield_keyed_by_nation() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider =
            ScriptedProvider::new().with_bars("^TNX", &[("2023-01-03", 3.79)]);
        let recon = Reconciler::new(&provider, &store);

        recon
            .update_nation(&entry("US", "2023-01-01"), RefreshMode::Append)
            .expect("nation update");

        let row = store
            .yield_row("US", "2023-01-03")
            .expect("read")
            .expect("row present");
        assert_eq!(row.yield_value, 3.79);
        assert_eq!(provider.calls()[0].0, "^TNX", "fetch goes to the proxy instrument");
    }

    #[test]
    fn unknown_nation_uses_default_proxy_without_error() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider =
            ScriptedProvider::new().with_bars("^TNX", &[("2023-01-03", 3.79)]);
        let recon = Reconciler::new(&provider, &store);

        let rows = recon
            .capture_nation(&entry("Atlantis", "2023-01-01"))
            .expect("fallback proxy");

        assert_eq!(rows, 1);
        assert!(store
            .yield_row("Atlantis", "2023-01-03")
            .expect("read")
            .is_some());
    }

    #[test]
    fn provider_failure_aborts_remaining_keys_but_keeps_earlier_commits() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider = ScriptedProvider::new()
            .with_bars("AAPL", &[("2023-01-03", 125.0)])
            .failing_for("MSFT");
        let recon = Reconciler::new(&provider, &store);

        let mut config = TrackerConfig::default();
        config.stocks.push(entry("AAPL", "2023-01-01"));
        config.stocks.push(entry("MSFT", "2023-01-01"));

        let error = recon
            .update_all(&config, RefreshMode::Append)
            .expect_err("second key fails");
        assert!(matches!(error, ReconError::Source(_)));

        assert_eq!(store.row_count(Dataset::Stocks, "AAPL").expect("count"), 1);
        assert_eq!(store.row_count(Dataset::Stocks, "MSFT").expect("count"), 0);
    }

    #[test]
    fn capture_all_covers_stocks_and_nations() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider = ScriptedProvider::new()
            .with_bars("AAPL", &[("2023-01-03", 125.0), ("2023-01-04", 126.0)])
            .with_bars("^TNX", &[("2023-01-03", 3.79)]);
        let recon = Reconciler::new(&provider, &store);

        let mut config = TrackerConfig::default();
        config.stocks.push(entry("AAPL", "2023-01-01"));
        config.national_debt.push(entry("US", "2023-01-01"));

        let reports = recon.capture_all(&config).expect("capture all");
        assert_eq!(
            reports,
            vec![
                KeyReport {
                    key: String::from("AAPL"),
                    rows_upserted: 2
                },
                KeyReport {
                    key: String::from("US"),
                    rows_upserted: 1
                },
            ]
        );
    }

    #[test]
    fn gap_detection_reports_the_single_missing_day() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(&temp);
        let provider = ScriptedProvider::new().with_bars(
            "AAPL",
            &[
                ("2023-01-01", 123.0),
                ("2023-01-02", 124.0),
                ("2023-01-04", 126.0),
            ],
        );
        let recon = Reconciler::new(&provider, &store);
        recon
            .capture_stock(&entry("AAPL", "2023-01-01"))
            .expect("seed");

        let gaps = scan_gaps(&store, Dataset::Stocks, "AAPL").expect("gap scan");
        assert_eq!(gaps, vec![(day("2023-01-03"), day("2023-01-03"))]);
    }

    #[test]
    fn gap_detection_counts_weekends_as_missing() {
        // Friday 2023-01-06 to Monday 2023-01-09: the weekend is reported
        // even though no market data will ever exist for it.
        let dates = [day("2023-01-06"), day("2023-01-09")];
        let gaps = missing_ranges(&dates).expect("ranges");
        assert_eq!(gaps, vec![(day("2023-01-07"), day("2023-01-08"))]);
    }

    #[test]
    fn contiguous_or_short_sequences_have_no_gaps() {
        assert!(missing_ranges(&[]).expect("ranges").is_empty());
        assert!(missing_ranges(&[day("2023-01-01")]).expect("ranges").is_empty());
        assert!(
            missing_ranges(&[day("2023-01-01"), day("2023-01-02")])
                .expect("ranges")
                .is_empty()
        );
    }

    #[test]
    fn gap_detection_reports_multiple_ranges() {
        let dates = [
            day("2023-01-01"),
            day("2023-01-04"),
            day("2023-01-05"),
            day("2023-01-09"),
        ];
        let gaps = missing_ranges(&dates).expect("ranges");
        assert_eq!(
            gaps,
            vec![
                (day("2023-01-02"), day("2023-01-03")),
                (day("2023-01-06"), day("2023-01-08")),
            ]
        );
    }
}
