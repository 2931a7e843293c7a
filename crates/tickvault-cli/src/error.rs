use thiserror::Error;

use tickvault_core::{ConfigError, ReconError, SourceError, StoreError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Source(_) => 3,
            Self::Store(_) => 4,
            Self::Command(_) | Self::Io(_) => 10,
        }
    }
}

impl From<ReconError> for CliError {
    fn from(error: ReconError) -> Self {
        match error {
            ReconError::Validation(error) => Self::Validation(error),
            ReconError::Source(error) => Self::Source(error),
            ReconError::Store(error) => Self::Store(error),
        }
    }
}
