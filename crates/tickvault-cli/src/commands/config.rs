use std::path::Path;

use tickvault_core::Settings;

use crate::cli::ConfigArgs;
use crate::error::CliError;

/// Show or set the tracker and database paths in the settings file.
pub fn run(settings_path: &Path, args: &ConfigArgs) -> Result<(), CliError> {
    let mut settings = Settings::load_or_default(settings_path)?;

    if args.toml.is_none() && args.db.is_none() {
        print_path("toml", settings.paths.toml.as_deref());
        print_path("db", settings.paths.db.as_deref());
        return Ok(());
    }

    if let Some(toml) = &args.toml {
        if !toml.is_file() {
            return Err(CliError::Command(format!(
                "tracker file not found: {}",
                toml.display()
            )));
        }
        settings.paths.toml = Some(toml.clone());
    }

    if let Some(db) = &args.db {
        if !db.is_file() {
            return Err(CliError::Command(format!(
                "database file not found: {}",
                db.display()
            )));
        }
        settings.paths.db = Some(db.clone());
    }

    settings.save(settings_path)?;
    println!("settings written: {}", settings_path.display());
    Ok(())
}

fn print_path(name: &str, path: Option<&Path>) {
    match path {
        Some(path) => println!("{name}: {}", path.display()),
        None => println!("{name}: (unset)"),
    }
}
