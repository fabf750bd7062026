// navi_core/src/readiness.rs

use std::fmt;

/// Tracks whether each of the three planning inputs has arrived.
///
/// Each latch is set the first time its input is accepted and is never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessTracker {
    grid: bool,
    current_pose: bool,
    goal_pose: bool,
}

impl ReadinessTracker {
    pub fn mark_grid_received(&mut self) {
        self.grid = true;
    }

    pub fn mark_current_pose_ready(&mut self) {
        self.current_pose = true;
    }

    pub fn mark_goal_pose_ready(&mut self) {
        self.goal_pose = true;
    }

    pub fn grid_received(&self) -> bool {
        self.grid
    }

    pub fn current_pose_ready(&self) -> bool {
        self.current_pose
    }

    pub fn goal_pose_ready(&self) -> bool {
        self.goal_pose
    }

    /// True once all three inputs are in.
    pub fn is_ready(&self) -> bool {
        self.grid && self.current_pose && self.goal_pose
    }
}

impl fmt::Display for ReadinessTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "costmap: {}, current_pose: {}, goal_pose: {}",
            self.grid, self.current_pose, self.goal_pose
        )
    }
}
