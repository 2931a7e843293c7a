use std::path::Path;

use tickvault_core::{DayDate, Reconciler, Symbol, YahooProvider};

use crate::cli::AddArgs;
use crate::error::CliError;

use super::Workspace;

/// Track a new stock and capture its history from the given start date.
///
/// Only the added symbol is fetched; other tracked keys are untouched until
/// the next `update` or `download`.
pub fn run(settings_path: &Path, args: &AddArgs) -> Result<(), CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let start_date = DayDate::parse(&args.start_date)?;

    let mut workspace = Workspace::open(settings_path)?;
    let updated = workspace.tracker.add_or_update_stock(
        symbol.as_str(),
        start_date,
        Some(DayDate::today_utc()),
    );
    workspace.tracker.save(&workspace.tracker_path)?;
    if updated {
        println!("updated tracked symbol {symbol}");
    } else {
        println!("now tracking {symbol}");
    }

    let entry = workspace
        .tracker
        .stocks
        .iter()
        .find(|entry| entry.name == symbol.as_str())
        .cloned()
        .ok_or_else(|| CliError::Command(format!("tracker entry missing for {symbol}")))?;

    let provider = YahooProvider::new()?;
    let recon = Reconciler::new(&provider, &workspace.store);
    let rows = recon.capture_stock(&entry)?;
    println!("{}: {} row(s)", entry.name, rows);
    Ok(())
}
