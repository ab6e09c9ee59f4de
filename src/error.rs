//! Top-level error for a billing run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::csv::CsvError;
use crate::log::LogError;

/// Anything that stops a run. Input validation problems never get here; the
/// terminal re-prompts for those.
#[derive(Debug, Error)]
pub enum PosError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("data file: {0}")]
    Csv(#[from] CsvError),

    #[error("bill log: {0}")]
    Log(#[from] LogError),

    #[error("terminal: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PosError>;
