//! Market-data provider contract and adapters.

pub mod yahoo;

use std::fmt::{Display, Formatter};

use crate::domain::{DayDate, PriceSeries, Symbol};

pub use yahoo::YahooProvider;

/// Failure categories for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured provider error.
///
/// An unknown symbol is NOT represented here: the provider contract returns
/// an empty series for symbols it has no data for. This type covers only the
/// calls that actually failed (transport, upstream status, malformed
/// payload), so callers can never conflate "no data" with "the call failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SourceError {}

/// Synchronous daily-history source.
///
/// `fetch_series` returns every available bar from `start` through "now";
/// there is no end-date parameter by contract. The configured `end_date` in
/// the tracker file is bookkeeping only and is never passed here.
pub trait MarketDataSource {
    fn fetch_series(&self, symbol: &Symbol, start: DayDate) -> Result<PriceSeries, SourceError>;
}

/// Default proxy instrument for nation codes: the 10-year treasury yield.
pub const DEFAULT_NATION_PROXY: &str = "^TNX";

/// Map a nation code to the proxy instrument whose yield approximates it.
///
/// The provider has no true national-debt figures; sovereign yield
/// instruments stand in. Unrecognized codes fall back to the default proxy
/// rather than failing.
pub fn resolve_nation_proxy(nation: &str) -> Symbol {
    let instrument = match nation {
        "US" | "USA" | "United States" => "^TNX",
        _ => DEFAULT_NATION_PROXY,
    };
    Symbol::parse(instrument).expect("proxy table symbols are valid")
}
