use thiserror::Error;

use drdata_generate::GenerationError;
use drdata_load::LoadError;

use crate::config::ConfigError;

/// Errors surfaced by the `drdata` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no configuration given: pass --config or set DRDATA_CONFIG")]
    MissingConfig,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Usage(String),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("cannot connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Core(#[from] drdata_core::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
