use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

use super::date::DayDate;

/// One fetched daily price bar. Immutable once constructed.
///
/// `pe` is the trailing price/earnings snapshot taken at fetch time, not a
/// historical figure: every bar returned by one provider call carries the
/// same value, and `None` means the provider had nothing to report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
    pub pe: Option<f64>,
}

impl PriceBar {
    pub fn new(
        open: f64,
        close: f64,
        high: f64,
        low: f64,
        volume: i64,
        pe: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_finite("open", open)?;
        validate_finite("close", close)?;
        validate_finite("high", high)?;
        validate_finite("low", low)?;
        if let Some(pe) = pe {
            validate_finite("pe", pe)?;
        }

        Ok(Self {
            open,
            close,
            high,
            low,
            volume,
            pe,
        })
    }
}

/// Daily price series keyed by unique date, ascending iteration order.
///
/// Dates are not necessarily contiguous; markets close on weekends and
/// holidays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub points: BTreeMap<DayDate, PriceBar>,
}

impl PriceSeries {
    pub fn new(points: BTreeMap<DayDate, PriceBar>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn last_date(&self) -> Option<DayDate> {
        self.points.keys().next_back().copied()
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteValue { field })
    }
}
