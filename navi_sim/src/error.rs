// navi_sim/src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use navi_core::error::NaviError;
use navi_core::types::TfError;

/// Failures that stop the driver. Everything inside a tick is handled by the controller.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load scenario configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("failed to open report file '{}': {source}", path.display())]
    ReportOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Core(#[from] NaviError),

    #[error("invalid transform tree: {0}")]
    Tf(#[from] TfError),

    #[error("invalid scenario: {0}")]
    Scenario(String),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<figment::Error> for SimError {
    fn from(error: figment::Error) -> Self {
        SimError::Config(Box::new(error))
    }
}
