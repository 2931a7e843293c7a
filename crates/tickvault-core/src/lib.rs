//! Core contracts for tickvault.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Tracker and settings configuration
//! - The market-data source trait and the Yahoo adapter
//! - The reconciliation engine that merges fetched series into the store

pub mod config;
pub mod domain;
pub mod error;
pub mod provider;
pub mod recon;

pub use config::{ConfigError, Settings, SettingsPaths, TrackedSymbol, TrackerConfig};
pub use domain::{DayDate, PriceBar, PriceSeries, Symbol};
pub use error::ValidationError;
pub use provider::{
    resolve_nation_proxy, MarketDataSource, SourceError, SourceErrorKind, YahooProvider,
    DEFAULT_NATION_PROXY,
};
pub use recon::{missing_ranges, scan_gaps, KeyReport, ReconError, Reconciler, RefreshMode};
pub use tickvault_store::{Dataset, StockRow, Store, StoreError, YieldRow};
