// navi_core/src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::NaviError;
use crate::sweep::SweepConfig;
use crate::types::FrameId;

/// # NaviConfig
/// Every tunable of the planning controller. Missing fields fall back to their defaults,
/// so an empty `[navi]` table is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NaviConfig {
    /// Cruise speed written to every waypoint of a found path, in km/h.
    pub velocity_kmh: f64,
    /// Planning ticks per second.
    pub update_rate_hz: f64,
    /// Number of sweep cells along each axis (`N`).
    pub block_number: usize,
    /// Goal offset between neighbouring sweep cells in metres (`RANGE`).
    pub block_range: f64,
    /// Replications per sweep cell (`ITER`).
    pub iterations: usize,
    /// Perturb the goal over the `N x N` cell grid instead of replaying it unchanged.
    pub area_search: bool,
    /// Frame the published trajectory is expressed in.
    pub output_frame: FrameId,
}

impl Default for NaviConfig {
    fn default() -> Self {
        Self {
            velocity_kmh: 5.0,
            update_rate_hz: 1.0,
            block_number: 11,
            block_range: 3.0,
            iterations: 10,
            area_search: false,
            output_frame: FrameId::from("map"),
        }
    }
}

impl NaviConfig {
    /// Rejects values the sweep arithmetic cannot work with.
    pub fn validate(&self) -> Result<(), NaviError> {
        if self.block_number == 0 {
            return Err(NaviError::InvalidConfig(
                "block_number must be at least 1".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(NaviError::InvalidConfig(
                "iterations must be at least 1".to_string(),
            ));
        }
        if !self.block_range.is_finite() || self.block_range < 0.0 {
            return Err(NaviError::InvalidConfig(format!(
                "block_range must be a non-negative number, got {}",
                self.block_range
            )));
        }
        if !self.update_rate_hz.is_finite() || self.update_rate_hz <= 0.0 {
            return Err(NaviError::InvalidConfig(format!(
                "update_rate_hz must be positive, got {}",
                self.update_rate_hz
            )));
        }
        if !self.velocity_kmh.is_finite() {
            return Err(NaviError::InvalidConfig(
                "velocity_kmh must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sweep(&self) -> SweepConfig {
        SweepConfig {
            block_number: self.block_number,
            block_range: self.block_range,
            iterations: self.iterations,
            area_search: self.area_search,
        }
    }
}
