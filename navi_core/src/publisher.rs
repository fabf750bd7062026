// navi_core/src/publisher.rs

use crate::frames::{transform, StampedPose};
use crate::messages::{Lane, LaneArray, Path, Waypoint};
use crate::types::{FrameId, TfProvider};

/// Where the controller sends its per-tick output. Implemented by the transport layer
/// of the host application; tests use an in-memory recorder.
pub trait TrajectorySink {
    /// The trajectory (or stop command) for this tick.
    fn publish_lanes(&mut self, lanes: LaneArray);

    /// The goal the planner was asked to reach this tick, for visualization.
    fn publish_target(&mut self, target: &StampedPose);
}

/// Converts a speed in km/h to m/s.
pub fn kmh_to_mps(velocity_kmh: f64) -> f64 {
    velocity_kmh / 3.6
}

/// Builds a single-lane trajectory from `path`.
///
/// Every pose is re-expressed in `output_frame`, its height is pinned to `height`, and
/// every waypoint gets the same speed.
pub fn build_lanes(
    path: &Path,
    velocity_kmh: f64,
    height: f64,
    output_frame: &FrameId,
    tf: &dyn TfProvider,
) -> LaneArray {
    let speed = kmh_to_mps(velocity_kmh);

    let waypoints = path
        .poses
        .iter()
        .map(|stamped| {
            let mut pose = transform(&stamped.pose, &stamped.frame_id, output_frame, stamped.stamp, tf);
            pose.translation.vector.z = height; // height = const
            Waypoint {
                pose: StampedPose::new(output_frame.clone(), path.stamp, pose),
                speed,
            }
        })
        .collect();

    LaneArray {
        lanes: vec![Lane {
            frame_id: output_frame.clone(),
            stamp: path.stamp,
            increment: 0,
            waypoints,
        }],
    }
}

/// The fallback command: a single zero-speed waypoint at the vehicle's current pose.
pub fn stop_lanes(
    current_global: &StampedPose,
    output_frame: &FrameId,
    tf: &dyn TfProvider,
) -> LaneArray {
    let path = Path {
        stamp: current_global.stamp,
        poses: vec![current_global.clone()],
    };
    build_lanes(&path, 0.0, current_global.position().z, output_frame, tf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TfError, Timestamp};
    use approx::assert_abs_diff_eq;
    use nalgebra::Isometry3;

    /// `costmap` is offset by (100, 200, 5) from `map`.
    struct OffsetTf;

    impl TfProvider for OffsetTf {
        fn lookup_transform(
            &self,
            target: &FrameId,
            source: &FrameId,
            _stamp: Timestamp,
        ) -> Result<Isometry3<f64>, TfError> {
            match (target.as_str(), source.as_str()) {
                ("map", "costmap") => Ok(Isometry3::translation(100.0, 200.0, 5.0)),
                _ => Err(TfError::Disconnected {
                    target: target.clone(),
                    origin: source.clone(),
                }),
            }
        }
    }

    #[test]
    fn test_lane_waypoints_are_in_output_frame_with_pinned_height() {
        let path = Path {
            stamp: 7.0,
            poses: vec![
                StampedPose::from_xyz("costmap", 7.0, 0.0, 0.0, 0.0),
                StampedPose::from_xyz("costmap", 7.0, 1.0, 2.0, -3.0),
            ],
        };
        let lanes = build_lanes(&path, 36.0, 1.25, &FrameId::from("map"), &OffsetTf);

        assert_eq!(lanes.lanes.len(), 1);
        let lane = &lanes.lanes[0];
        assert_eq!(lane.frame_id.as_str(), "map");
        assert_eq!(lane.increment, 0);
        assert_abs_diff_eq!(lane.stamp, 7.0);
        assert_eq!(lane.waypoints.len(), 2);
        for waypoint in &lane.waypoints {
            assert_abs_diff_eq!(waypoint.speed, 10.0, epsilon = 1e-12);
            assert_abs_diff_eq!(waypoint.pose.position().z, 1.25);
            assert_eq!(waypoint.pose.frame_id.as_str(), "map");
        }
        assert_abs_diff_eq!(lane.waypoints[1].pose.position().x, 101.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lane.waypoints[1].pose.position().y, 202.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stop_lanes_hold_current_pose() {
        let current = StampedPose::from_xyz("map", 3.0, 4.0, 5.0, 0.8);
        let lanes = stop_lanes(&current, &FrameId::from("map"), &OffsetTf);

        let lane = &lanes.lanes[0];
        assert_eq!(lane.waypoints.len(), 1);
        assert_abs_diff_eq!(lane.waypoints[0].speed, 0.0);
        assert_eq!(lane.waypoints[0].pose.pose, current.pose);
        assert_abs_diff_eq!(lane.stamp, 3.0);
    }
}
