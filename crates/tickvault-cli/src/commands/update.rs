use std::path::Path;

use tickvault_core::{Reconciler, RefreshMode, YahooProvider};

use crate::cli::UpdateArgs;
use crate::error::CliError;

use super::{print_reports, Workspace};

/// Fetch rows newer than the stored latest date for every tracked key.
pub fn run(settings_path: &Path, args: &UpdateArgs) -> Result<(), CliError> {
    let workspace = Workspace::open(settings_path)?;
    let mode = if args.overwrite {
        RefreshMode::Overwrite
    } else {
        RefreshMode::Append
    };

    let provider = YahooProvider::new()?;
    let recon = Reconciler::new(&provider, &workspace.store);
    let reports = recon.update_all(&workspace.tracker, mode)?;
    print_reports(&reports);
    Ok(())
}
