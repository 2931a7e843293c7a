use std::path::Path;

use tickvault_core::{scan_gaps, Dataset, DayDate};

use crate::error::CliError;

use super::Workspace;

/// Report missing calendar days for every tracked key.
pub fn run(settings_path: &Path) -> Result<(), CliError> {
    let workspace = Workspace::open(settings_path)?;

    for entry in &workspace.tracker.stocks {
        let ranges = scan_gaps(&workspace.store, Dataset::Stocks, &entry.name)?;
        print_ranges(&entry.name, &ranges);
    }
    for entry in &workspace.tracker.national_debt {
        let ranges = scan_gaps(&workspace.store, Dataset::NationalDebt, &entry.name)?;
        print_ranges(&entry.name, &ranges);
    }
    Ok(())
}

fn print_ranges(key: &str, ranges: &[(DayDate, DayDate)]) {
    if ranges.is_empty() {
        println!("{key}: no gaps");
        return;
    }
    for (from, to) in ranges {
        println!("{key}: missing {from}..{to}");
    }
}
