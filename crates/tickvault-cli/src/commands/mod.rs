mod add;
mod config;
mod download;
mod gaps;
mod init;
mod update;

use std::path::{Path, PathBuf};

use tickvault_core::{KeyReport, Settings, Store, TrackerConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Everything a data-touching command needs: the parsed tracker file, an
/// open store, and the tracker path for writing changes back.
pub struct Workspace {
    pub tracker: TrackerConfig,
    pub tracker_path: PathBuf,
    pub store: Store,
}

impl Workspace {
    /// Open from the settings file; fails with an actionable message when
    /// the settings or either configured path is missing.
    pub fn open(settings_path: &Path) -> Result<Self, CliError> {
        let settings = Settings::load(settings_path)?;
        let (tracker_path, db_path) = settings.require()?;
        let tracker = TrackerConfig::load(tracker_path)?;
        let store = Store::open(db_path)?;
        Ok(Self {
            tracker,
            tracker_path: tracker_path.to_path_buf(),
            store,
        })
    }
}

pub fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Init(args) => init::run(&cli.settings, args),
        Command::Config(args) => config::run(&cli.settings, args),
        Command::Add(args) => add::run(&cli.settings, args),
        Command::Update(args) => update::run(&cli.settings, args),
        Command::Download => download::run(&cli.settings),
        Command::Gaps => gaps::run(&cli.settings),
    }
}

fn print_reports(reports: &[KeyReport]) {
    for report in reports {
        println!("{}: {} row(s)", report.key, report.rows_upserted);
    }
}
