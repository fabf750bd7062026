// navi_sim/src/sinks.rs

use tracing::debug;

use navi_core::prelude::{LaneArray, StampedPose, TrajectorySink};

use crate::topics::Topic;

/// Publishes the controller's output onto in-process topics.
#[derive(Debug)]
pub struct TopicSink {
    pub lanes: Topic<LaneArray>,
    pub targets: Topic<StampedPose>,
}

impl TopicSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            lanes: Topic::new("lane_waypoints_array", capacity),
            targets: Topic::new("astar_debug_poses", capacity),
        }
    }
}

impl TrajectorySink for TopicSink {
    fn publish_lanes(&mut self, lanes: LaneArray) {
        let waypoints: usize = lanes.lanes.iter().map(|lane| lane.waypoints.len()).sum();
        let stopped = lanes
            .lanes
            .iter()
            .flat_map(|lane| lane.waypoints.iter())
            .all(|waypoint| waypoint.speed == 0.0);
        debug!(topic = self.lanes.name(), waypoints, stopped, "publishing lanes");
        self.lanes.publish(lanes);
    }

    fn publish_target(&mut self, target: &StampedPose) {
        let position = target.position();
        debug!(
            topic = self.targets.name(),
            frame = %target.frame_id,
            x = position.x,
            y = position.y,
            "publishing target"
        );
        self.targets.publish(target.clone());
    }
}
