//! CLI argument definitions for tickvault.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Create a tracking workspace (tracker file + database) |
//! | `config` | Show or set the tracker file and database paths |
//! | `add` | Track a new stock symbol and capture its history |
//! | `update` | Fetch rows newer than what the store already has |
//! | `download` | Re-capture full history for every tracked key |
//! | `gaps` | Report missing calendar days per tracked key |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--settings` | `config/config.toml` | Path to the settings file |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Track stock prices and sovereign yields in a local database.
///
/// tickvault reconciles a declarative tracker file against a local DuckDB
/// store: each run fetches only the date range the store is missing.
#[derive(Debug, Parser)]
#[command(name = "tickvault", version, about)]
pub struct Cli {
    /// Path to the settings file mapping logical names to file paths.
    #[arg(long, global = true, default_value = "config/config.toml")]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a tracking workspace under the given directory.
    ///
    /// Writes a template tracker file (`stock.toml`), creates an empty
    /// database (`stock.db`), and records both paths in the settings file.
    ///
    /// # Examples
    ///
    ///   tickvault init data
    Init(InitArgs),

    /// Show or set the tracker file and database paths.
    ///
    /// With no flags, prints the current settings. Paths given via flags
    /// must point at existing files.
    ///
    /// # Examples
    ///
    ///   tickvault config
    ///   tickvault config --toml data/stock.toml --db data/stock.db
    Config(ConfigArgs),

    /// Track a new stock symbol and capture its history.
    ///
    /// Adds (or updates) the symbol in the tracker file with the given
    /// start date, then immediately fetches its history from that date
    /// through today. Only the added symbol is fetched.
    ///
    /// # Examples
    ///
    ///   tickvault add AAPL 2023-01-01
    Add(AddArgs),

    /// Fetch rows newer than what the store already has.
    ///
    /// For every tracked key, fetches from the day after the stored latest
    /// date. With `--overwrite`, the latest stored row is deleted and
    /// refetched as well, picking up late revisions to the most recent
    /// trading day. Keys with no stored rows get a full capture.
    ///
    /// # Examples
    ///
    ///   tickvault update
    ///   tickvault update --overwrite
    Update(UpdateArgs),

    /// Re-capture full history for every tracked key.
    ///
    /// Fetches each key from its configured start date through today and
    /// merges the result, replacing any stored rows on the same dates.
    Download,

    /// Report missing calendar days per tracked key.
    ///
    /// Gaps are calendar gaps: weekends and market holidays are reported
    /// too, since the store has no trading calendar.
    Gaps,
}

/// Arguments for the `init` command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to create the workspace in (created if absent).
    pub directory: PathBuf,
}

/// Arguments for the `config` command.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Path to the tracker file.
    #[arg(long)]
    pub toml: Option<PathBuf>,

    /// Path to the database file.
    #[arg(long)]
    pub db: Option<PathBuf>,
}

/// Arguments for the `add` command.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Stock symbol to track (e.g., AAPL). Stored upper-cased.
    pub symbol: String,

    /// First date to capture, YYYY-MM-DD.
    pub start_date: String,
}

/// Arguments for the `update` command.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Delete and refetch the latest stored row for each key.
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
