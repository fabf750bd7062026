// navi_sim/src/config.rs

//! Scenario configuration: the controller's tunables plus everything the driver needs to
//! fabricate its inputs (transform tree, costmap, vehicle pose, goal).
//!
//! Layering, lowest priority first: built-in defaults, the scenario TOML file, then
//! `NAVI_`-prefixed environment variables (`__` separates nested keys, e.g.
//! `NAVI_NAVI__BLOCK_NUMBER=3`). Command-line flags are applied on top by [`crate::cli`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use navi_core::prelude::{FrameId, NaviConfig, OccupancyGrid, StampedPose, Timestamp};

use crate::error::SimError;
use crate::serde_helpers::{quat_from_euler_deg, vec3_from_array};

fn zero_vec3() -> Vector3<f64> {
    Vector3::zeros()
}

fn identity_rotation() -> UnitQuaternion<f64> {
    UnitQuaternion::identity()
}

fn occupied_value() -> i8 {
    100
}

// =========================================================================
// == Transform Tree ==
// =========================================================================

/// One static frame. `translation`/`rotation` give its pose in `parent`; frames
/// without a parent are roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub name: FrameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<FrameId>,
    #[serde(default = "zero_vec3", with = "vec3_from_array")]
    pub translation: Vector3<f64>,
    #[serde(default = "identity_rotation", with = "quat_from_euler_deg")]
    pub rotation: UnitQuaternion<f64>,
}

impl FrameConfig {
    pub fn pose_in_parent(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

// =========================================================================
// == Costmap ==
// =========================================================================

/// A filled rectangle of cells, `min` inclusive and `max` exclusive, as `[x, y]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub min: [usize; 2],
    pub max: [usize; 2],
    #[serde(default = "occupied_value")]
    pub value: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub frame: FrameId,
    /// Metres per cell.
    pub resolution: f64,
    pub width: usize,
    pub height: usize,
    /// Corner of cell (0, 0) in `frame`.
    #[serde(default = "zero_vec3", with = "vec3_from_array")]
    pub origin: Vector3<f64>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    /// Runner tick at which the grid is published.
    #[serde(default)]
    pub publish_at_tick: u64,
}

impl GridConfig {
    pub fn build(&self, stamp: Timestamp) -> Result<OccupancyGrid, SimError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(SimError::Scenario(format!(
                "grid resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(SimError::Scenario("grid must have at least one cell".to_string()));
        }

        let mut grid = OccupancyGrid::new(
            self.frame.clone(),
            stamp,
            self.resolution,
            self.width,
            self.height,
            Isometry3::from_parts(Translation3::from(self.origin), UnitQuaternion::identity()),
        );

        for obstacle in &self.obstacles {
            let [x0, y0] = obstacle.min;
            let [x1, y1] = obstacle.max;
            if x0 > x1 || y0 > y1 || x1 > self.width || y1 > self.height {
                return Err(SimError::Scenario(format!(
                    "obstacle {:?}..{:?} does not fit a {}x{} grid",
                    obstacle.min, obstacle.max, self.width, self.height
                )));
            }
            for y in y0..y1 {
                for x in x0..x1 {
                    grid.set_cell(x, y, obstacle.value);
                }
            }
        }
        Ok(grid)
    }
}

// =========================================================================
// == Poses ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    pub frame: FrameId,
    #[serde(with = "vec3_from_array")]
    pub position: Vector3<f64>,
    #[serde(default = "identity_rotation", with = "quat_from_euler_deg")]
    pub rotation: UnitQuaternion<f64>,
    /// Runner tick at which the pose is published.
    #[serde(default)]
    pub publish_at_tick: u64,
}

impl PoseConfig {
    pub fn stamped(&self, stamp: Timestamp) -> StampedPose {
        StampedPose::new(
            self.frame.clone(),
            stamp,
            Isometry3::from_parts(Translation3::from(self.position), self.rotation),
        )
    }
}

// =========================================================================
// == Top Level ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub navi: NaviConfig,
    /// Destination of the CSV report.
    pub report_path: PathBuf,
    /// Stop after this many ticks even if the sweep has not completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
    /// Capacity of each in-process topic buffer.
    pub topic_capacity: usize,
    pub frames: Vec<FrameConfig>,
    pub grid: GridConfig,
    pub current_pose: PoseConfig,
    pub goal_pose: PoseConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            navi: NaviConfig::default(),
            report_path: PathBuf::from("astar_prob.csv"),
            max_ticks: None,
            topic_capacity: 16,
            frames: vec![
                FrameConfig {
                    name: FrameId::from("map"),
                    parent: None,
                    translation: Vector3::zeros(),
                    rotation: UnitQuaternion::identity(),
                },
                FrameConfig {
                    name: FrameId::from("costmap"),
                    parent: Some(FrameId::from("map")),
                    translation: Vector3::new(-50.0, -50.0, 0.0),
                    rotation: UnitQuaternion::identity(),
                },
            ],
            grid: GridConfig {
                frame: FrameId::from("costmap"),
                resolution: 0.5,
                width: 200,
                height: 200,
                origin: Vector3::zeros(),
                obstacles: Vec::new(),
                publish_at_tick: 0,
            },
            current_pose: PoseConfig {
                frame: FrameId::from("map"),
                position: Vector3::zeros(),
                rotation: UnitQuaternion::identity(),
                publish_at_tick: 0,
            },
            goal_pose: PoseConfig {
                frame: FrameId::from("map"),
                position: Vector3::new(20.0, 10.0, 0.0),
                rotation: UnitQuaternion::identity(),
                publish_at_tick: 0,
            },
        }
    }
}

impl SimConfig {
    /// Layers defaults, the optional scenario file and the environment, then validates.
    pub fn load(scenario: Option<&Path>) -> Result<Self, SimError> {
        let mut figment = Figment::from(Serialized::defaults(SimConfig::default()));
        if let Some(path) = scenario {
            if !path.exists() {
                return Err(SimError::Scenario(format!(
                    "scenario file '{}' not found",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        let config: SimConfig = figment
            .merge(Env::prefixed("NAVI_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.navi.validate()?;
        if self.topic_capacity == 0 {
            return Err(SimError::Scenario("topic_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Timestamp of runner tick `tick`.
    pub fn stamp_at(&self, tick: u64) -> Timestamp {
        tick as f64 / self.navi.update_rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    #[test]
    fn test_scenario_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
report_path = "out.csv"

[navi]
block_number = 3
iterations = 2
area_search = true

[grid]
frame = "costmap"
resolution = 1.0
width = 10
height = 5
obstacles = [{{ min = [4, 0], max = [5, 4] }}]

[goal_pose]
frame = "map"
position = [1.0, 2.0, 0.0]
rotation = [0.0, 0.0, 90.0]
publish_at_tick = 3
"#
        )
        .unwrap();

        let config = SimConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.navi.block_number, 3);
        assert_eq!(config.navi.iterations, 2);
        assert!(config.navi.area_search);
        // Untouched keys keep their defaults.
        assert_abs_diff_eq!(config.navi.block_range, 3.0);
        assert_eq!(config.report_path, PathBuf::from("out.csv"));
        assert_eq!(config.frames.len(), 2);
        assert_eq!(config.goal_pose.publish_at_tick, 3);
        assert_abs_diff_eq!(
            config.goal_pose.rotation.euler_angles().2,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-9
        );

        let grid = config.grid.build(0.0).unwrap();
        assert_eq!((grid.width(), grid.height()), (10, 5));
        assert_eq!(grid.cell(4, 3), Some(100));
        assert_eq!(grid.cell(4, 4), Some(0));
        assert_eq!(grid.cell(3, 0), Some(0));
    }

    #[test]
    fn test_invalid_navi_section_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[navi]\niterations = 0\n").unwrap();
        assert!(matches!(
            SimConfig::load(Some(file.path())),
            Err(SimError::Core(_))
        ));
    }

    #[test]
    fn test_unknown_navi_key_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[navi]\nblock_numbr = 3\n").unwrap();
        assert!(matches!(
            SimConfig::load(Some(file.path())),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_missing_scenario_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            SimConfig::load(Some(missing.as_path())),
            Err(SimError::Scenario(_))
        ));
    }

    #[test]
    fn test_obstacle_outside_grid_is_rejected() {
        let grid = GridConfig {
            frame: FrameId::from("costmap"),
            resolution: 1.0,
            width: 4,
            height: 4,
            origin: Vector3::zeros(),
            obstacles: vec![ObstacleConfig {
                min: [2, 2],
                max: [6, 3],
                value: 100,
            }],
            publish_at_tick: 0,
        };
        assert!(matches!(grid.build(0.0), Err(SimError::Scenario(_))));
    }

    #[test]
    fn test_defaults_roundtrip_through_toml() {
        let text = toml::to_string_pretty(&SimConfig::default()).unwrap();
        let parsed: SimConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.navi, NaviConfig::default());
        assert_eq!(parsed.report_path, PathBuf::from("astar_prob.csv"));
        assert_eq!(parsed.frames[1].parent, Some(FrameId::from("map")));
    }
}
