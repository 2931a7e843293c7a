use std::path::Path;

use tickvault_core::{Reconciler, YahooProvider};

use crate::error::CliError;

use super::{print_reports, Workspace};

/// Re-capture full history for every tracked key from its start date.
pub fn run(settings_path: &Path) -> Result<(), CliError> {
    let workspace = Workspace::open(settings_path)?;

    let provider = YahooProvider::new()?;
    let recon = Reconciler::new(&provider, &workspace.store);
    let reports = recon.capture_all(&workspace.tracker)?;
    print_reports(&reports);
    Ok(())
}
