use std::fs;
use std::path::Path;

use tickvault_core::{Settings, Store, TrackerConfig};

use crate::cli::InitArgs;
use crate::error::CliError;

const TRACKER_FILE: &str = "stock.toml";
const DATABASE_FILE: &str = "stock.db";

/// Create a tracking workspace and point the settings file at it.
///
/// Existing files are left alone, so `init` is safe to re-run against a
/// directory that already holds data.
pub fn run(settings_path: &Path, args: &InitArgs) -> Result<(), CliError> {
    fs::create_dir_all(&args.directory)?;

    let tracker_path = args.directory.join(TRACKER_FILE);
    if tracker_path.exists() {
        println!("tracker file already exists: {}", tracker_path.display());
    } else {
        TrackerConfig::sample().save(&tracker_path)?;
        println!("created tracker file: {}", tracker_path.display());
    }

    let db_path = args.directory.join(DATABASE_FILE);
    // Opening creates the file and applies the schema.
    Store::open(&db_path)?;
    println!("database ready: {}", db_path.display());

    let mut settings = Settings::load_or_default(settings_path)?;
    settings.paths.toml = Some(tracker_path);
    settings.paths.db = Some(db_path);
    settings.save(settings_path)?;
    println!("settings written: {}", settings_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_workspace_and_settings() {
        let temp = tempdir().expect("tempdir");
        let settings_path = temp.path().join("config").join("config.toml");
        let workspace_dir = temp.path().join("data");

        run(
            &settings_path,
            &InitArgs {
                directory: workspace_dir.clone(),
            },
        )
        .expect("init");

        assert!(workspace_dir.join("stock.toml").exists());
        assert!(workspace_dir.join("stock.db").exists());

        let settings = Settings::load(&settings_path).expect("settings");
        let (toml, db) = settings.require().expect("paths set");
        assert_eq!(toml, workspace_dir.join("stock.toml"));
        assert_eq!(db, workspace_dir.join("stock.db"));
    }

    #[test]
    fn init_does_not_clobber_an_existing_tracker_file() {
        let temp = tempdir().expect("tempdir");
        let settings_path = temp.path().join("config.toml");
        let workspace_dir = temp.path().join("data");
        let args = InitArgs {
            directory: workspace_dir.clone(),
        };

        run(&settings_path, &args).expect("first init");

        let mut tracker =
            TrackerConfig::load(&workspace_dir.join("stock.toml")).expect("load");
        tracker.add_or_update_stock(
            "MSFT",
            tickvault_core::DayDate::parse("2022-06-01").expect("date"),
            None,
        );
        tracker
            .save(&workspace_dir.join("stock.toml"))
            .expect("save");

        run(&settings_path, &args).expect("second init");

        let reloaded =
            TrackerConfig::load(&workspace_dir.join("stock.toml")).expect("reload");
        assert!(reloaded.stocks.iter().any(|entry| entry.name == "MSFT"));
    }
}
