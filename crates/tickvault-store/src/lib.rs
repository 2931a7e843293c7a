//! # tickvault-store
//!
//! DuckDB-backed storage for tracked price and yield series.
//!
//! The store owns two tables, `stocks` and `national_debt`, each keyed by
//! `(key, date)` with `date` held as `YYYY-MM-DD` text. The uniqueness of
//! that pair is the central invariant: an upsert for an existing pair fully
//! replaces the row, so no duplicate `(key, date)` pairs can ever exist.
//!
//! One connection is opened per [`Store`] and held for the lifetime of the
//! command invocation; durability is delegated to DuckDB's transaction
//! guarantees. All user-provided values travel through query parameters,
//! never string interpolation.

pub mod migrations;

use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use thiserror::Error;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// DuckDB database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error while preparing the database location.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The two series tables the store manages.
///
/// Table and key-column names are resolved through this enum so SQL text is
/// never built from caller-supplied identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Stocks,
    NationalDebt,
}

impl Dataset {
    pub const fn table(self) -> &'static str {
        match self {
            Self::Stocks => "stocks",
            Self::NationalDebt => "national_debt",
        }
    }

    pub const fn key_column(self) -> &'static str {
        match self {
            Self::Stocks => "symbol",
            Self::NationalDebt => "nation",
        }
    }
}

/// One daily price row for the `stocks` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRow {
    pub symbol: String,
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
    /// Trailing P/E snapshot taken at fetch time; `None` when unavailable.
    pub pe: Option<f64>,
}

/// One daily yield row for the `national_debt` table.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldRow {
    pub nation: String,
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    pub yield_value: f64,
}

/// Handle over the series database.
pub struct Store {
    connection: Connection,
    db_path: PathBuf,
}

impl Store {
    /// Open (creating if necessary) the database at `path` and apply schema
    /// migrations.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path: PathBuf = path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let connection = Connection::open(&db_path)?;
        migrations::apply_migrations(&connection)?;
        Ok(Self {
            connection,
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Maximum stored date for a key, or `None` when the key has no rows.
    ///
    /// Dates are `YYYY-MM-DD` text, so the lexicographic maximum is also the
    /// chronological maximum.
    pub fn latest_date(&self, dataset: Dataset, key: &str) -> Result<Option<String>, StoreError> {
        let sql = format!(
            "SELECT MAX(date) FROM {table} WHERE {key_column} = ?",
            table = dataset.table(),
            key_column = dataset.key_column(),
        );
        let latest: Option<String> =
            self.connection
                .query_row(sql.as_str(), [&key as &dyn ToSql], |row| row.get(0))?;
        Ok(latest)
    }

    /// All stored dates for a key in ascending order.
    pub fn dates_ascending(&self, dataset: Dataset, key: &str) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT date FROM {table} WHERE {key_column} = ? ORDER BY date ASC",
            table = dataset.table(),
            key_column = dataset.key_column(),
        );
        let mut statement = self.connection.prepare(sql.as_str())?;
        let mut rows = statement.query([&key as &dyn ToSql])?;

        let mut dates = Vec::new();
        while let Some(row) = rows.next()? {
            dates.push(row.get(0)?);
        }
        Ok(dates)
    }

    /// Upsert price rows. A row whose `(symbol, date)` already exists is
    /// replaced in full. The batch runs in one transaction.
    pub fn upsert_stock_rows(&self, rows: &[StockRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        self.connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, StoreError> {
            for row in rows {
                let params: [&dyn ToSql; 8] = [
                    &row.symbol,
                    &row.date,
                    &row.open,
                    &row.close,
                    &row.high,
                    &row.low,
                    &row.volume,
                    &row.pe,
                ];
                self.connection.execute(
                    "INSERT OR REPLACE INTO stocks \
                     (symbol, date, open, close, high, low, volume, pe) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                    params.as_slice(),
                )?;
            }
            Ok(rows.len())
        })();

        self.finalize_transaction(result)
    }

    /// Upsert yield rows; same replace-in-full semantics as stock rows.
    pub fn upsert_yield_rows(&self, rows: &[YieldRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        self.connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, StoreError> {
            for row in rows {
                let params: [&dyn ToSql; 3] = [&row.nation, &row.date, &row.yield_value];
                self.connection.execute(
                    "INSERT OR REPLACE INTO national_debt (nation, date, \"yield\") \
                     VALUES (?, ?, ?)",
                    params.as_slice(),
                )?;
            }
            Ok(rows.len())
        })();

        self.finalize_transaction(result)
    }

    /// Remove exactly the row for `(key, date)`. Used only by the
    /// overwrite-latest refresh policy.
    pub fn delete_row(&self, dataset: Dataset, key: &str, date: &str) -> Result<(), StoreError> {
        let sql = format!(
            "DELETE FROM {table} WHERE {key_column} = ? AND date = ?",
            table = dataset.table(),
            key_column = dataset.key_column(),
        );
        let params: [&dyn ToSql; 2] = [&key, &date];
        self.connection.execute(sql.as_str(), params.as_slice())?;
        Ok(())
    }

    /// Total row count for a key.
    pub fn row_count(&self, dataset: Dataset, key: &str) -> Result<i64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {key_column} = ?",
            table = dataset.table(),
            key_column = dataset.key_column(),
        );
        let count: i64 =
            self.connection
                .query_row(sql.as_str(), [&key as &dyn ToSql], |row| row.get(0))?;
        Ok(count)
    }

    /// Read back one stock row, if present.
    pub fn stock_row(&self, symbol: &str, date: &str) -> Result<Option<StockRow>, StoreError> {
        let mut statement = self.connection.prepare(
            "SELECT symbol, date, open, close, high, low, volume, pe \
             FROM stocks WHERE symbol = ? AND date = ?",
        )?;
        let params: [&dyn ToSql; 2] = [&symbol, &date];
        let mut rows = statement.query(params.as_slice())?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(StockRow {
            symbol: row.get(0)?,
            date: row.get(1)?,
            open: row.get(2)?,
            close: row.get(3)?,
            high: row.get(4)?,
            low: row.get(5)?,
            volume: row.get(6)?,
            pe: row.get(7)?,
        }))
    }

    /// Read back one yield row, if present.
    pub fn yield_row(&self, nation: &str, date: &str) -> Result<Option<YieldRow>, StoreError> {
        let mut statement = self.connection.prepare(
            "SELECT nation, date, \"yield\" FROM national_debt \
             WHERE nation = ? AND date = ?",
        )?;
        let params: [&dyn ToSql; 2] = [&nation, &date];
        let mut rows = statement.query(params.as_slice())?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(YieldRow {
            nation: row.get(0)?,
            date: row.get(1)?,
            yield_value: row.get(2)?,
        }))
    }

    fn finalize_transaction<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                self.connection.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(error) => {
                let _ = self.connection.execute_batch("ROLLBACK");
                Err(error)
            }
        }
    }
}
