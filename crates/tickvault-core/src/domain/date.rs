use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::ValidationError;

const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date carried everywhere as strict `YYYY-MM-DD`.
///
/// The wire format, the tracker file, and the store all use this textual
/// form, so lexicographic order of the formatted value matches calendar
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayDate(Date);

impl DayDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input, DAY_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Today's date in UTC.
    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn from_unix_timestamp(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(|dt| Self(dt.date()))
            .map_err(|_| ValidationError::DateOutOfRange {
                value: seconds.to_string(),
            })
    }

    /// Unix timestamp of this day's midnight, UTC.
    pub fn start_of_day_unix(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    pub fn next_day(self) -> Result<Self, ValidationError> {
        self.0
            .next_day()
            .map(Self)
            .ok_or_else(|| ValidationError::DateOutOfRange {
                value: self.to_string(),
            })
    }

    pub fn previous_day(self) -> Result<Self, ValidationError> {
        self.0
            .previous_day()
            .map(Self)
            .ok_or_else(|| ValidationError::DateOutOfRange {
                value: self.to_string(),
            })
    }

    /// Whole calendar days from `self` to `other` (positive when `other` is
    /// later).
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).whole_days()
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(DAY_FORMAT)
            .expect("DayDate must be formattable as YYYY-MM-DD")
    }
}

impl From<Date> for DayDate {
    fn from(value: Date) -> Self {
        Self(value)
    }
}

impl Display for DayDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for DayDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for DayDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
