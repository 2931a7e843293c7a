//! Declarative tracking configuration.
//!
//! Two TOML files drive the tool: the *tracker file* lists the symbols and
//! nations under reconciliation, and the *settings file* records where the
//! tracker file and the database live. The settings path is always passed in
//! explicitly by the caller; nothing in this module reads ambient process
//! state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DayDate;

/// Configuration-layer errors. These are reported before any side effect on
/// the store or the provider.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("settings file not found at '{path}'; run 'tickvault config' first")]
    SettingsMissing { path: PathBuf },

    #[error("tracker file path not set; run 'tickvault config --toml <path>' first")]
    TrackerPathUnset,

    #[error("database file path not set; run 'tickvault config --db <path>' first")]
    DatabasePathUnset,
}

/// One tracked key: a stock ticker or a nation code.
///
/// `end_date` is advisory bookkeeping only; fetches always run from
/// `start_date` (or the stored latest date) through "now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSymbol {
    pub name: String,
    pub start_date: DayDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DayDate>,
}

/// The tracker file: which keys to reconcile, from which date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub stocks: Vec<TrackedSymbol>,
    #[serde(default)]
    pub national_debt: Vec<TrackedSymbol>,
}

impl TrackerConfig {
    /// Template written by `init`.
    pub fn sample() -> Self {
        let start = DayDate::parse("2023-01-01").expect("sample start date is valid");
        let end = DayDate::parse("2023-12-31").expect("sample end date is valid");
        Self {
            stocks: vec![TrackedSymbol {
                name: String::from("AAPL"),
                start_date: start,
                end_date: Some(end),
            }],
            national_debt: vec![TrackedSymbol {
                name: String::from("US"),
                start_date: start,
                end_date: Some(end),
            }],
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Add a stock entry or update the matching one.
    ///
    /// Stock keys are case-insensitive: `aapl` matches an existing `AAPL`
    /// entry, and new entries are stored upper-cased. Returns `true` when an
    /// existing entry was updated.
    pub fn add_or_update_stock(
        &mut self,
        name: &str,
        start_date: DayDate,
        end_date: Option<DayDate>,
    ) -> bool {
        let normalized = name.trim().to_ascii_uppercase();
        for entry in &mut self.stocks {
            if entry.name.eq_ignore_ascii_case(&normalized) {
                entry.start_date = start_date;
                entry.end_date = end_date;
                return true;
            }
        }

        self.stocks.push(TrackedSymbol {
            name: normalized,
            start_date,
            end_date,
        });
        false
    }

    /// Add a nation entry or update the matching one.
    ///
    /// Nation keys are matched exactly as given; unlike stocks there is no
    /// case folding. The asymmetry is a deliberate, preserved policy.
    pub fn add_or_update_nation(
        &mut self,
        name: &str,
        start_date: DayDate,
        end_date: Option<DayDate>,
    ) -> bool {
        for entry in &mut self.national_debt {
            if entry.name == name {
                entry.start_date = start_date;
                entry.end_date = end_date;
                return true;
            }
        }

        self.national_debt.push(TrackedSymbol {
            name: name.to_owned(),
            start_date,
            end_date,
        });
        false
    }
}

/// The settings file: logical names mapped to filesystem paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: SettingsPaths,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toml: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<PathBuf>,
}

impl Settings {
    /// Load the settings file, failing if it does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::SettingsMissing {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load the settings file, or start from an empty one if absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Both required paths, or the configuration error naming the first
    /// missing one.
    pub fn require(&self) -> Result<(&Path, &Path), ConfigError> {
        let toml = self
            .paths
            .toml
            .as_deref()
            .ok_or(ConfigError::TrackerPathUnset)?;
        let db = self
            .paths
            .db
            .as_deref()
            .ok_or(ConfigError::DatabasePathUnset)?;
        Ok((toml, db))
    }
}
