// navi_core/src/types.rs

use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// --- Core Type Aliases ---
/// Message timestamp in seconds.
pub type Timestamp = f64;

// --- Core Identifier ---
/// The name of a coordinate frame, e.g. `"map"` or the frame of the costmap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub String);

impl FrameId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for FrameId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Reasons a transform lookup can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TfError {
    #[error("frame '{0}' does not exist in the transform tree")]
    UnknownFrame(FrameId),
    #[error("frames '{target}' and '{origin}' are not connected")]
    Disconnected { target: FrameId, origin: FrameId },
}

// --- Core Trait for Transform Lookups ---
// This is so fundamental it belongs here.
/// The contract for any object that can provide transform information.
/// The driver's static transform tree implements this, as do the fakes in tests.
pub trait TfProvider {
    /// Gets the transform that maps coordinates expressed in `source` into `target`,
    /// valid at `stamp`.
    fn lookup_transform(
        &self,
        target: &FrameId,
        source: &FrameId,
        stamp: Timestamp,
    ) -> Result<Isometry3<f64>, TfError>;
}
