// navi_core/src/error.rs

use std::io;
use thiserror::Error;

/// Errors surfaced by the planning controller.
///
/// Planner and transform failures are handled inside a tick (stop command, identity
/// fallback) and never show up here.
#[derive(Debug, Error)]
pub enum NaviError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to write sweep report: {0}")]
    Report(#[from] io::Error),
}
